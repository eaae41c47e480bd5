use shadow_rs::shadow;

shadow!(build);

// Internals
// ---------
pub mod data_structures;
pub mod heap_primitives;

// Grids
// -----
pub mod grid;
pub mod visibility;

// Search
// ------
pub mod budget;
pub mod cost;
pub mod heuristic;
pub mod path;
pub mod search;

// Problems
// --------
pub mod problems;

// Algorithms
// ----------
pub mod algorithms;

pub use algorithms::theta_star::find_path;
pub use algorithms::theta_star::find_path_with_budget;
