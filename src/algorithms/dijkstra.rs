//! Exact shortest paths over the visibility graph of a grid.
//!
//! Every free cell is a vertex, and two vertices are joined when they see each
//! other. Dijkstra on this graph gives the optimal path made of straight
//! segments between cell centres, which Theta* approximates.
//!
//! Each expansion checks line of sight against every other free cell, so this
//! is only meant for small grids.
//!
//! The same search restricted to 8-adjacent moves gives the optimal lattice
//! path, which bounds any-angle costs from above.

use std::fmt::Debug;

use derive_more::Display;
use num_traits::Zero;

use crate::cost::Cost;
use crate::cost::move_cost;
use crate::data_structures::indexed_heap::IndexedHeap;
use crate::grid::Cell;
use crate::grid::Coord;
use crate::grid::GridAdapter;
use crate::path::PathFound;
use crate::search::SearchError;
use crate::visibility::has_line_of_sight;

/// The ranking value for Dijkstra
///
/// We prefer better g-values.
///
/// ```
/// use theta_search::algorithms::dijkstra::DijkstraRank;
/// use theta_search::cost::Cost;
///
/// assert!(DijkstraRank::new(Cost::new(0.0)) < DijkstraRank::new(Cost::new(1.0)));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DijkstraRank {
    g: Cost,
}
impl DijkstraRank {
    pub fn new(g: Cost) -> Self {
        Self { g }
    }
    pub fn g(&self) -> Cost {
        self.g
    }
}

/// Dijkstra over the visibility graph of a grid.
pub struct VisibilityDijkstra<'g, G>
where
    G: GridAdapter + ?Sized,
{
    grid: &'g G,
    /// Free cells, the vertices of the graph.
    vertices: Vec<Cell>,
    /// The vertex of each cell, indexed by `y * width + x`.
    vertex_of: Vec<Option<usize>>,
}

impl<'g, G> VisibilityDijkstra<'g, G>
where
    G: GridAdapter + ?Sized,
{
    #[must_use]
    pub fn new(grid: &'g G) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let mut vertices = vec![];
        let mut vertex_of = vec![None; width * height];
        for y in 0..height {
            for x in 0..width {
                if !grid.is_blocked(x as i64, y as i64) {
                    vertex_of[y * width + x] = Some(vertices.len());
                    vertices.push(Cell::new(x as Coord, y as Coord));
                }
            }
        }
        Self {
            grid,
            vertices,
            vertex_of,
        }
    }

    /// The number of free cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn vertex(&self, cell: Cell) -> Option<usize> {
        self.vertex_of[cell.y as usize * self.grid.width() + cell.x as usize]
    }

    /// Finds an optimal any-angle path from `start` to `goal`.
    pub fn shortest_path(&self, start: Cell, goal: Cell) -> Result<PathFound, SearchError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("ReferenceShortestPath");

        self.search(start, goal, Edges::Visibility)
    }

    /// Finds an optimal path made only of moves between 8-adjacent cells.
    ///
    /// Any-angle paths are never longer than this.
    pub fn lattice_shortest_path(&self, start: Cell, goal: Cell) -> Result<PathFound, SearchError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("LatticeShortestPath");

        self.search(start, goal, Edges::Lattice)
    }

    fn search(&self, start: Cell, goal: Cell, edges: Edges) -> Result<PathFound, SearchError> {
        let (sx, sy) = start.signed();
        let (gx, gy) = goal.signed();
        let start = self.grid.cell_at(sx, sy)?;
        let goal = self.grid.cell_at(gx, gy)?;
        let (Some(source), Some(target)) = (self.vertex(start), self.vertex(goal)) else {
            return Err(SearchError::NoPathExists { expanded: 0 });
        };

        let n = self.vertices.len();
        let mut g = vec![Cost::infinity(); n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open = IndexedHeap::<DijkstraRank>::with_capacity(n);
        let mut expanded = 0usize;

        g[source] = Cost::zero();
        open.push(source, DijkstraRank::new(Cost::zero()));

        while let Some(entry) = open.pop() {
            #[cfg(feature = "coz_profile")]
            coz::scope!("NodeExpansion");

            let u = entry.key;
            expanded += 1;
            closed[u] = true;

            if u == target {
                let mut path = vec![self.vertices[u]];
                let mut v = u;
                while let Some(p) = parent[v] {
                    path.push(self.vertices[p]);
                    v = p;
                }
                path.reverse();
                log::debug!(
                    "Reference {edges} path from {start} to {goal} costs {:.3} after {expanded} expansions",
                    g[u].get()
                );
                return Ok(PathFound {
                    path,
                    cost: g[u].get(),
                    expanded_count: expanded,
                });
            }

            let from = self.vertices[u];
            match edges {
                Edges::Visibility => {
                    for v in 0..n {
                        if closed[v] {
                            continue;
                        }
                        let to = self.vertices[v];
                        let new_g = g[u] + move_cost(from, to);
                        // Cheap test first, line of sight is the expensive one.
                        if new_g < g[v] && has_line_of_sight(self.grid, from, to) {
                            reach(&mut open, &mut g, &mut parent, u, v, new_g);
                        }
                    }
                }
                Edges::Lattice => {
                    for to in self.grid.neighbors8(from) {
                        let Some(v) = self.vertex(to) else {
                            continue;
                        };
                        let new_g = g[u] + move_cost(from, to);
                        if !closed[v] && new_g < g[v] {
                            reach(&mut open, &mut g, &mut parent, u, v, new_g);
                        }
                    }
                }
            }
        }

        Err(SearchError::NoPathExists { expanded })
    }
}

#[inline(always)]
fn reach(
    open: &mut IndexedHeap<DijkstraRank>,
    g: &mut [Cost],
    parent: &mut [Option<usize>],
    u: usize,
    v: usize,
    new_g: Cost,
) {
    g[v] = new_g;
    parent[v] = Some(u);
    let rank = DijkstraRank::new(new_g);
    if open.improve(v, rank).is_none() {
        open.push(v, rank);
    }
}

/// Which cells are joined by an edge.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
enum Edges {
    /// Cells that see each other.
    #[display("any-angle")]
    Visibility,
    /// 8-adjacent cells.
    #[display("lattice")]
    Lattice,
}

impl<G> Debug for VisibilityDijkstra<'_, G>
where
    G: GridAdapter + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VisibilityDijkstra{{({} vertices)}}", self.vertices.len())
    }
}

/// Finds an optimal any-angle path, see [`VisibilityDijkstra`].
pub fn visibility_graph_shortest_path<G>(
    grid: &G,
    start: Cell,
    goal: Cell,
) -> Result<PathFound, SearchError>
where
    G: GridAdapter + ?Sized,
{
    VisibilityDijkstra::new(grid).shortest_path(start, goal)
}

/// Finds an optimal 8-connected path, see
/// [`VisibilityDijkstra::lattice_shortest_path`].
pub fn lattice_shortest_path<G>(grid: &G, start: Cell, goal: Cell) -> Result<PathFound, SearchError>
where
    G: GridAdapter + ?Sized,
{
    VisibilityDijkstra::new(grid).lattice_shortest_path(start, goal)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::problems::occupancy_grid::OccupancyGrid;

    #[test]
    fn straight_on_open_grids() {
        let grid = OccupancyGrid::new_empty_with_dimensions(5, 5);
        let solver = VisibilityDijkstra::new(&grid);
        assert_eq!(solver.len(), 25);

        let found = solver.shortest_path(Cell::new(0, 0), Cell::new(4, 4)).unwrap();
        assert_eq!(found.path, vec![Cell::new(0, 0), Cell::new(4, 4)]);
        assert_eq!(found.cost, 32f64.sqrt());

        let found = solver.shortest_path(Cell::new(3, 1), Cell::new(3, 1)).unwrap();
        assert_eq!(found.path, vec![Cell::new(3, 1)]);
        assert_eq!(found.cost, 0.0);
        assert_eq!(found.expanded_count, 1);
    }

    #[test]
    fn wraps_around_corners() {
        let grid = OccupancyGrid::try_from(indoc! {"
          ..#..
          ..#..
          ..#..
          ..#..
          .....
        "})
        .unwrap();
        let found = visibility_graph_shortest_path(&grid, Cell::new(0, 0), Cell::new(4, 4)).unwrap();
        assert_eq!(
            found.path,
            vec![Cell::new(0, 0), Cell::new(1, 3), Cell::new(2, 4), Cell::new(4, 4)]
        );
        let expected = 10f64.sqrt() + 2f64.sqrt() + 2.0;
        assert!((found.cost - expected).abs() < 1e-9);
        assert!(found.is_valid_on(&grid));
    }

    #[test]
    fn lattice_paths_bound_any_angle_ones() {
        let grid = OccupancyGrid::new_empty_with_dimensions(5, 5);
        let solver = VisibilityDijkstra::new(&grid);
        let (start, goal) = (Cell::new(0, 0), Cell::new(4, 2));
        let lattice = solver.lattice_shortest_path(start, goal).unwrap();
        assert!((lattice.cost - (2.0 * 2f64.sqrt() + 2.0)).abs() < 1e-9);
        assert_eq!(lattice.path.len(), 5);
        assert_eq!(solver.shortest_path(start, goal).unwrap().cost, 20f64.sqrt());

        let grid = OccupancyGrid::try_from(indoc! {"
          ..#..
          ..#..
          ..#..
          ..#..
          .....
        "})
        .unwrap();
        let lattice = lattice_shortest_path(&grid, Cell::new(0, 0), Cell::new(4, 4)).unwrap();
        assert!((lattice.cost - (2.0 * 2f64.sqrt() + 4.0)).abs() < 1e-9);
        assert!(lattice.path.contains(&Cell::new(2, 4)));
        assert!(lattice.path.windows(2).all(|w| move_cost(w[0], w[1]).get() < 1.5));
        assert!(lattice.is_valid_on(&grid));

        assert_eq!(
            lattice_shortest_path(&grid, Cell::new(0, 0), Cell::new(2, 0)),
            Err(SearchError::NoPathExists { expanded: 0 })
        );
    }

    #[test]
    fn no_path() {
        let grid = OccupancyGrid::try_from(indoc! {"
          ..#..
          ..#..
          ..#..
        "})
        .unwrap();
        assert_eq!(
            visibility_graph_shortest_path(&grid, Cell::new(0, 0), Cell::new(4, 0)),
            Err(SearchError::NoPathExists { expanded: 6 })
        );
        assert_eq!(
            visibility_graph_shortest_path(&grid, Cell::new(2, 0), Cell::new(4, 0)),
            Err(SearchError::NoPathExists { expanded: 0 })
        );
        assert!(matches!(
            visibility_graph_shortest_path(&grid, Cell::new(0, 0), Cell::new(0, 3)),
            Err(SearchError::OutOfBounds(_))
        ));
    }
}
