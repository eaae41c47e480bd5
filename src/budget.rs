//! Limits on how long a search may run.
//!
//! Searches check their budget once per expansion, before popping the next
//! node. Running out of budget aborts the search without a partial result.

use std::time::Duration;
use std::time::Instant;

pub trait Budget {
    /// Whether the search must stop, given how many nodes it expanded so far.
    fn exhausted(&mut self, expanded: usize) -> bool;
}

/// Never runs out.
#[derive(Copy, Clone, Debug, Default)]
pub struct Unlimited;

impl Budget for Unlimited {
    #[inline(always)]
    fn exhausted(&mut self, _expanded: usize) -> bool {
        false
    }
}

/// Allows up to a number of expansions.
#[derive(Copy, Clone, Debug)]
pub struct ExpansionLimit(pub usize);

impl Budget for ExpansionLimit {
    #[inline(always)]
    fn exhausted(&mut self, expanded: usize) -> bool {
        expanded >= self.0
    }
}

/// Runs until a point in time.
#[derive(Copy, Clone, Debug)]
pub struct Deadline {
    deadline: Instant,
}

impl Deadline {
    pub fn at(deadline: Instant) -> Self {
        Self { deadline }
    }
    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }
}

impl Budget for Deadline {
    fn exhausted(&mut self, _expanded: usize) -> bool {
        Instant::now() >= self.deadline
    }
}

/// A host-provided check.
pub struct BudgetFn<F>(pub F)
where
    F: FnMut(usize) -> bool;

impl<F> Budget for BudgetFn<F>
where
    F: FnMut(usize) -> bool,
{
    fn exhausted(&mut self, expanded: usize) -> bool {
        (self.0)(expanded)
    }
}

/// An optional budget, `None` never runs out.
impl<B: Budget> Budget for Option<B> {
    #[inline(always)]
    fn exhausted(&mut self, expanded: usize) -> bool {
        self.as_mut().is_some_and(|b| b.exhausted(expanded))
    }
}

/// Exhausted when any of the two is.
#[derive(Copy, Clone, Debug)]
pub struct Either<L, R>(pub L, pub R);

impl<L: Budget, R: Budget> Budget for Either<L, R> {
    fn exhausted(&mut self, expanded: usize) -> bool {
        self.0.exhausted(expanded) || self.1.exhausted(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits() {
        assert!(!Unlimited.exhausted(usize::MAX));

        let mut limit = ExpansionLimit(3);
        assert!(!limit.exhausted(2));
        assert!(limit.exhausted(3));

        assert!(Deadline::after(Duration::ZERO).exhausted(0));
        assert!(!Deadline::after(Duration::from_secs(3600)).exhausted(0));
    }

    #[test]
    fn host_checks() {
        let mut calls = 0;
        let mut budget = BudgetFn(|_| {
            calls += 1;
            calls > 2
        });
        assert!(!budget.exhausted(0));
        assert!(!budget.exhausted(0));
        assert!(budget.exhausted(0));

        let mut both = Either(Unlimited, ExpansionLimit(1));
        assert!(!both.exhausted(0));
        assert!(both.exhausted(1));

        let mut maybe = Either(None::<ExpansionLimit>, Some(ExpansionLimit(2)));
        assert!(!maybe.exhausted(1));
        assert!(maybe.exhausted(2));
        assert!(!None::<Deadline>.exhausted(usize::MAX));
    }
}
