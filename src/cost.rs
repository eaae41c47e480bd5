use std::fmt::Debug;

use derive_more::Display;
use num_traits::Zero;
use ordered_float::OrderedFloat;

use crate::grid::Cell;

/// A non-negative, totally ordered path cost.
///
/// Costs are built from Euclidean distances, so `NaN` can't show up unless
/// something external (like a heuristic) produces it. [`Cost::try_new`] is the
/// door for those values.
#[derive(Copy, Clone, Default, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[display("{_0}")]
pub struct Cost(OrderedFloat<f64>);

impl Cost {
    /// Wraps a value known to be a valid cost.
    #[inline(always)]
    pub fn new(f: f64) -> Self {
        debug_assert!(f >= 0.0, "Invalid cost {f}");
        Self(OrderedFloat(f))
    }

    /// Wraps a value only if it's a valid cost (not `NaN` nor negative).
    ///
    /// ```
    /// use theta_search::cost::Cost;
    ///
    /// assert!(Cost::try_new(1.5).is_some());
    /// assert!(Cost::try_new(f64::INFINITY).is_some());
    /// assert!(Cost::try_new(-0.1).is_none());
    /// assert!(Cost::try_new(f64::NAN).is_none());
    /// ```
    #[inline(always)]
    pub fn try_new(f: f64) -> Option<Self> {
        (f >= 0.0).then_some(Self(OrderedFloat(f)))
    }

    #[inline(always)]
    pub fn infinity() -> Self {
        Self(OrderedFloat(f64::INFINITY))
    }

    #[inline(always)]
    pub fn get(&self) -> f64 {
        self.0.0
    }
}

impl std::ops::Add for Cost {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl std::ops::AddAssign for Cost {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Zero for Cost {
    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.0 == OrderedFloat::zero()
    }
    #[inline(always)]
    fn zero() -> Self {
        Self(OrderedFloat::zero())
    }
}

/// The cost of moving in a straight line between the centres of two cells.
///
/// ```
/// use theta_search::cost::move_cost;
/// use theta_search::grid::Cell;
///
/// assert_eq!(move_cost(Cell::new(0, 0), Cell::new(0, 1)).get(), 1.0);
/// assert_eq!(move_cost(Cell::new(1, 1), Cell::new(0, 0)).get(), 2f64.sqrt());
/// assert_eq!(move_cost(Cell::new(0, 0), Cell::new(3, 4)).get(), 5.0);
/// ```
#[inline(always)]
pub fn move_cost(a: Cell, b: Cell) -> Cost {
    let (ax, ay) = a.signed();
    let (bx, by) = b.signed();
    let dx = (bx - ax) as f64;
    let dy = (by - ay) as f64;
    Cost::new((dx * dx + dy * dy).sqrt())
}
