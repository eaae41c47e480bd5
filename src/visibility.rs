//! Line of sight between grid cells.
//!
//! Cells are unit squares centred on their coordinates and a line of sight is
//! the segment joining two centres. The segment is obstructed when it goes
//! through the inside of a blocked cell. Going exactly through a lattice corner
//! only touches the cells around it, so it doesn't count as crossing them. This
//! matches the 8-connected moves of [`GridAdapter::neighbors8`], which may
//! squeeze diagonally between two walls.

use crate::grid::Cell;
use crate::grid::Coord;
use crate::grid::GridAdapter;

/// Whether the segment between the centres of `a` and `b` only crosses free
/// cells.
///
/// Both ends are checked too, and anything out of the grid is blocked.
///
/// ```
/// use theta_search::grid::Cell;
/// use theta_search::problems::occupancy_grid::OccupancyGrid;
/// use theta_search::visibility::has_line_of_sight;
///
/// let grid = OccupancyGrid::try_from("....\n.#..\n....").unwrap();
/// assert!(has_line_of_sight(&grid, Cell::new(0, 0), Cell::new(3, 0)));
/// assert!(!has_line_of_sight(&grid, Cell::new(0, 0), Cell::new(3, 2)));
/// assert!(!has_line_of_sight(&grid, Cell::new(3, 2), Cell::new(0, 0)));
/// ```
pub fn has_line_of_sight<G: GridAdapter + ?Sized>(grid: &G, a: Cell, b: Cell) -> bool {
    #[cfg(feature = "coz_profile")]
    coz::scope!("LineOfSight");

    scan(a, b, |x, y| !grid.is_blocked(x, y))
}

/// The cells crossed by the segment between the centres of `a` and `b`, in
/// order from `a` to `b`.
pub fn cells_on_segment(a: Cell, b: Cell) -> Vec<Cell> {
    let mut cells = vec![];
    scan(a, b, |x, y| {
        cells.push(Cell::new(x as Coord, y as Coord));
        true
    });
    cells
}

/// Walks the cells crossed by the segment `a -> b`.
///
/// Stops as soon as `visit` rejects a cell and returns whether every visited
/// cell was accepted.
fn scan<F>(a: Cell, b: Cell, mut visit: F) -> bool
where
    F: FnMut(i64, i64) -> bool,
{
    let (mut x, mut y) = a.signed();
    let (bx, by) = b.signed();
    let (dx, dy) = (bx - x, by - y);
    let (sx, sy) = (dx.signum(), dy.signum());
    let (dx, dy) = (dx.abs(), dy.abs());

    if !visit(x, y) {
        return false;
    }

    // Axis-aligned and diagonal segments move every active axis on each step.
    if dx == 0 || dy == 0 || dx == dy {
        for _ in 0..dx.max(dy) {
            x += sx;
            y += sy;
            if !visit(x, y) {
                return false;
            }
        }
        return true;
    }

    // After `ix` steps on x and `iy` steps on y the segment meets the next x
    // border at t = (1 + 2ix) / 2dx and the next y border at t = (1 + 2iy) / 2dy.
    // `error` is the sign of their difference scaled by 2dx*dy:
    //   error = (1 + 2ix) * dy - (1 + 2iy) * dx
    let mut error = dy - dx;
    let (mut ix, mut iy) = (0i64, 0i64);
    while ix < dx || iy < dy {
        match error.signum() {
            -1 => {
                x += sx;
                ix += 1;
                error += 2 * dy;
            }
            1 => {
                y += sy;
                iy += 1;
                error -= 2 * dx;
            }
            _ => {
                // Exactly through a corner, the side cells are only touched.
                x += sx;
                y += sy;
                ix += 1;
                iy += 1;
                error += 2 * dy - 2 * dx;
            }
        }
        if !visit(x, y) {
            return false;
        }
    }
    debug_assert_eq!((x, y), (bx, by));
    true
}
