//! Concrete grids and path-finding problems on them.
//!
//! The search only sees grids through `GridAdapter`, these are the grids used
//! by the command line tools, benchmarks and tests.

pub mod occupancy_grid;

pub use occupancy_grid::GridProblem;
pub use occupancy_grid::OccupancyGrid;
