use std::fmt::Debug;

use derive_more::Display;
use smallvec::SmallVec;
use thiserror::Error;

pub type Coord = u32;

/// A cell of a grid.
///
/// Cells are plain coordinates, their occupancy is owned by the grid.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("({x},{y})")]
pub struct Cell {
    pub x: Coord,
    pub y: Coord,
}

impl Cell {
    #[inline(always)]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Signed coordinates, useful for lookups that may land out of the grid.
    #[inline(always)]
    pub fn signed(&self) -> (i64, i64) {
        (self.x as i64, self.y as i64)
    }
}

impl From<(Coord, Coord)> for Cell {
    fn from((x, y): (Coord, Coord)) -> Self {
        Self::new(x, y)
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Occupancy {
    #[display("free")]
    Free,
    #[display("blocked")]
    Blocked,
    #[display("out-of-bounds")]
    OutOfBounds,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("({x},{y}) is out of bounds of the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
}

/// Lattice moves in the order neighbours are produced.
///
/// The order is part of the search's determinism.
#[rustfmt::skip]
pub const MOVES_8: [(i64, i64); 8] = [
    // Left
    (-1, -1), (-1, 0), (-1, 1),
    // Center
    ( 0, -1),          ( 0, 1),
    // Right
    ( 1, -1), ( 1, 0), ( 1, 1),
];

pub type Neighbours = SmallVec<[Cell; 8]>;

/// Read-only view over an occupancy grid.
///
/// Implementors only need to provide the dimensions and the occupancy of a
/// coordinate, everything else is derived from it.
pub trait GridAdapter: Debug {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Occupancy of any coordinate, in bounds or not.
    fn occupancy(&self, x: i64, y: i64) -> Occupancy;

    #[inline(always)]
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && x <= Coord::MAX as i64
            && y <= Coord::MAX as i64
            && (x as usize) < self.width()
            && (y as usize) < self.height()
    }

    fn cell_at(&self, x: i64, y: i64) -> Result<Cell, GridError> {
        if self.contains(x, y) {
            Ok(Cell::new(x as Coord, y as Coord))
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    /// Whether a coordinate can't be traversed.
    ///
    /// Anything outside of the grid is blocked.
    #[inline(always)]
    fn is_blocked(&self, x: i64, y: i64) -> bool {
        self.occupancy(x, y) != Occupancy::Free
    }

    /// Gets the traversable lattice neighbours of a cell.
    fn neighbors8(&self, cell: Cell) -> Neighbours {
        #[cfg(feature = "coz_profile")]
        coz::scope!("CellExpansion");

        let (x, y) = cell.signed();
        let mut v = Neighbours::new();
        for (dx, dy) in MOVES_8 {
            let (nx, ny) = (x + dx, y + dy);
            if !self.is_blocked(nx, ny) {
                v.push(Cell::new(nx as Coord, ny as Coord));
            }
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::problems::occupancy_grid::OccupancyGrid;

    fn grid() -> OccupancyGrid {
        OccupancyGrid::try_from(indoc! {"
          ..#
          .#.
          ...
        "})
        .unwrap()
    }

    #[test]
    fn out_of_bounds_is_blocked() {
        let g = grid();
        assert!(g.is_blocked(-1, 0));
        assert!(g.is_blocked(0, -1));
        assert!(g.is_blocked(3, 0));
        assert!(g.is_blocked(0, 3));
        assert!(g.is_blocked(i64::MAX, 0));
        assert_eq!(g.occupancy(3, 3), Occupancy::OutOfBounds);
        assert!(!g.is_blocked(0, 0));
        assert!(g.is_blocked(2, 0));
    }

    #[test]
    fn cell_at_checks_bounds() {
        let g = grid();
        assert_eq!(g.cell_at(2, 2), Ok(Cell::new(2, 2)));
        assert_eq!(
            g.cell_at(3, 1),
            Err(GridError::OutOfBounds {
                x: 3,
                y: 1,
                width: 3,
                height: 3
            })
        );
        assert!(g.cell_at(-1, 1).is_err());
    }

    #[test]
    fn neighbours_skip_walls_and_edges() {
        let g = grid();
        let corner: Vec<Cell> = g.neighbors8(Cell::new(0, 0)).into_iter().collect();
        assert_eq!(corner, vec![Cell::new(0, 1), Cell::new(1, 0)]);

        // The centre is a wall, but its neighbours are still produced.
        let centre = g.neighbors8(Cell::new(1, 1));
        assert_eq!(centre.len(), 7);
        assert!(!centre.contains(&Cell::new(2, 0)));
    }

    #[test]
    fn neighbours_are_ordered() {
        let g = OccupancyGrid::new_empty_with_dimensions(3, 3);
        let n: Vec<Cell> = g.neighbors8(Cell::new(1, 1)).into_iter().collect();
        assert_eq!(
            n,
            vec![
                Cell::new(0, 0),
                Cell::new(0, 1),
                Cell::new(0, 2),
                Cell::new(1, 0),
                Cell::new(1, 2),
                Cell::new(2, 0),
                Cell::new(2, 1),
                Cell::new(2, 2),
            ]
        );
    }
}
