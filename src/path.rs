use std::fmt::Display;

use crate::cost::move_cost;
use crate::grid::Cell;
use crate::grid::GridAdapter;
use crate::visibility::has_line_of_sight;

/// Cells displayed before eliding the rest of a path.
const MAX_CELLS_DISPLAYED: usize = 20;

/// A successful search result.
///
/// `path` runs from start to goal, and every consecutive pair of cells has
/// line of sight on the grid that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct PathFound {
    pub path: Vec<Cell>,
    /// Sum of the Euclidean lengths of the segments.
    pub cost: f64,
    pub expanded_count: usize,
}

impl PathFound {
    #[must_use]
    pub fn start(&self) -> Option<Cell> {
        self.path.first().copied()
    }
    #[must_use]
    pub fn goal(&self) -> Option<Cell> {
        self.path.last().copied()
    }

    /// The straight moves of the path.
    pub fn segments(&self) -> impl Iterator<Item = (Cell, Cell)> + '_ {
        self.path.windows(2).map(|w| (w[0], w[1]))
    }

    /// The cost, recomputed from the segments.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments()
            .map(|(a, b)| move_cost(a, b).get())
            .sum::<f64>()
    }

    /// Whether this path can be followed on `grid`.
    pub fn is_valid_on<G: GridAdapter + ?Sized>(&self, grid: &G) -> bool {
        !self.path.is_empty()
            && self.path.iter().all(|c| {
                let (x, y) = c.signed();
                !grid.is_blocked(x, y)
            })
            && self.segments().all(|(a, b)| has_line_of_sight(grid, a, b))
    }

    /// How many heading changes the path has.
    ///
    /// Vertices in the middle of a straight run don't count.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.path
            .windows(3)
            .filter(|w| {
                let (ax, ay) = w[0].signed();
                let (bx, by) = w[1].signed();
                let (cx, cy) = w[2].signed();
                let (ux, uy) = (bx - ax, by - ay);
                let (vx, vy) = (cx - bx, cy - by);
                let straight = ux * vy == uy * vx && ux * vx + uy * vy > 0;
                !straight
            })
            .count()
    }
}

impl Display for PathFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Path(cost: {:.3}, expanded: {}, cells: {}) [",
            self.cost,
            self.expanded_count,
            self.path.len()
        )?;
        for (i, c) in self.path.iter().take(MAX_CELLS_DISPLAYED).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        if self.path.len() > MAX_CELLS_DISPLAYED {
            write!(f, ", ...")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::problems::occupancy_grid::OccupancyGrid;

    fn found(path: Vec<Cell>) -> PathFound {
        let mut p = PathFound {
            path,
            cost: 0.0,
            expanded_count: 0,
        };
        p.cost = p.length();
        p
    }

    #[test]
    fn validity() {
        let grid = OccupancyGrid::try_from(indoc! {"
          ....
          .##.
          ....
        "})
        .unwrap();

        let around = found(vec![Cell::new(0, 0), Cell::new(3, 0), Cell::new(3, 2)]);
        assert!(around.is_valid_on(&grid));
        assert_eq!(around.cost, 5.0);
        assert_eq!(around.turns(), 1);
        assert_eq!(around.start(), Some(Cell::new(0, 0)));
        assert_eq!(around.goal(), Some(Cell::new(3, 2)));

        let straight = found(vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(3, 0), Cell::new(3, 2)]);
        assert!(straight.is_valid_on(&grid));
        assert_eq!(straight.turns(), 1);
        let zigzag = found(vec![Cell::new(0, 0), Cell::new(3, 0), Cell::new(0, 0), Cell::new(0, 2)]);
        assert_eq!(zigzag.turns(), 2);
        assert_eq!(found(vec![Cell::new(0, 0), Cell::new(3, 2)]).turns(), 0);

        let through = found(vec![Cell::new(0, 0), Cell::new(3, 2)]);
        assert!(!through.is_valid_on(&grid));

        let empty = found(vec![]);
        assert!(!empty.is_valid_on(&grid));
        assert_eq!(empty.length(), 0.0);
    }

    #[test]
    fn display_elides_long_paths() {
        let short = found(vec![Cell::new(0, 0), Cell::new(3, 4)]);
        assert_eq!(
            short.to_string(),
            "Path(cost: 5.000, expanded: 0, cells: 2) [(0,0), (3,4)]"
        );

        let long = found((0..30).map(|x| Cell::new(x, 0)).collect());
        let s = long.to_string();
        assert!(s.contains("(19,0), ..."));
        assert!(!s.contains("(20,0)"));
    }
}
