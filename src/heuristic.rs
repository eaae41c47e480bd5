//! Distance estimates towards the goal.
//!
//! The search only takes a `Fn(Cell, Cell) -> f64`. This module offers the
//! usual ones, plus a lookup by name for command line tools.

use std::str::FromStr;

use derive_more::Display;
use thiserror::Error;

use crate::grid::Cell;

/// A heuristic as consumed by the search, `(cell, goal) -> estimate`.
pub type HeuristicFn = fn(Cell, Cell) -> f64;

#[inline(always)]
fn deltas(a: Cell, b: Cell) -> (f64, f64) {
    let (ax, ay) = a.signed();
    let (bx, by) = b.signed();
    (((bx - ax).abs()) as f64, ((by - ay).abs()) as f64)
}

/// The straight-line distance.
///
/// Exact on an empty grid, so it never overestimates any-angle paths.
#[inline(always)]
pub fn euclidean(a: Cell, b: Cell) -> f64 {
    let (dx, dy) = deltas(a, b);
    (dx * dx + dy * dy).sqrt()
}

/// The distance of maximising useful diagonals on the lattice.
#[inline(always)]
pub fn octile(a: Cell, b: Cell) -> f64 {
    let (dx, dy) = deltas(a, b);
    let (d_min, d_max) = if dx < dy { (dx, dy) } else { (dy, dx) };
    (d_max - d_min) + d_min * std::f64::consts::SQRT_2
}

/// The distance of following straight lines
#[inline(always)]
pub fn manhattan(a: Cell, b: Cell) -> f64 {
    let (dx, dy) = deltas(a, b);
    dx + dy
}

/// No information at all, turns the search into Dijkstra.
#[inline(always)]
pub fn zero(_a: Cell, _b: Cell) -> f64 {
    0.0
}

#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum HeuristicKind {
    #[default]
    #[display("euclidean")]
    Euclidean,
    #[display("octile")]
    Octile,
    #[display("manhattan")]
    Manhattan,
    #[display("zero")]
    Zero,
}

impl HeuristicKind {
    pub const ALL: [HeuristicKind; 4] = [
        HeuristicKind::Euclidean,
        HeuristicKind::Octile,
        HeuristicKind::Manhattan,
        HeuristicKind::Zero,
    ];

    pub fn function(self) -> HeuristicFn {
        match self {
            HeuristicKind::Euclidean => euclidean,
            HeuristicKind::Octile => octile,
            HeuristicKind::Manhattan => manhattan,
            HeuristicKind::Zero => zero,
        }
    }

    /// Whether the estimate is a lower bound of any-angle path costs.
    ///
    /// Octile and Manhattan distances are only lower bounds of lattice paths,
    /// a straight shortcut can beat them.
    pub fn is_admissible(self) -> bool {
        matches!(self, HeuristicKind::Euclidean | HeuristicKind::Zero)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Unknown heuristic '{0}'. Expected one of euclidean, octile, manhattan, zero.")]
pub struct UnknownHeuristic(pub String);

impl FromStr for HeuristicKind {
    type Err = UnknownHeuristic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(HeuristicKind::Euclidean),
            "octile" | "diagonal" => Ok(HeuristicKind::Octile),
            "manhattan" => Ok(HeuristicKind::Manhattan),
            "zero" | "dijkstra" => Ok(HeuristicKind::Zero),
            _ => Err(UnknownHeuristic(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in HeuristicKind::ALL {
            assert_eq!(kind.to_string().parse::<HeuristicKind>(), Ok(kind));
        }
        assert_eq!("Octile".parse::<HeuristicKind>(), Ok(HeuristicKind::Octile));
        assert_eq!(
            "chebyshev".parse::<HeuristicKind>(),
            Err(UnknownHeuristic("chebyshev".to_string()))
        );
    }

    #[test]
    fn distances() {
        let a = Cell::new(1, 1);
        let b = Cell::new(4, 5);
        assert_eq!(euclidean(a, b), 5.0);
        assert_eq!(manhattan(a, b), 7.0);
        assert_eq!(octile(a, b), 1.0 + 3.0 * std::f64::consts::SQRT_2);
        assert_eq!(zero(a, b), 0.0);
        for kind in HeuristicKind::ALL {
            assert_eq!(kind.function()(b, b), 0.0);
            assert_eq!(kind.function()(a, b), kind.function()(b, a));
        }
    }

    #[test]
    fn admissible_ones_dont_beat_straight_lines() {
        let a = Cell::new(0, 0);
        for b in [Cell::new(3, 1), Cell::new(7, 2), Cell::new(4, 4)] {
            let straight = euclidean(a, b);
            for kind in HeuristicKind::ALL {
                if kind.is_admissible() {
                    assert!(kind.function()(a, b) <= straight);
                } else {
                    assert!(kind.function()(a, b) >= straight);
                }
            }
        }
    }
}
