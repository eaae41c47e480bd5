//! Implementation of search algorithms.
//!
//! Theta* finds any-angle paths on grids. Dijkstra over the visibility graph
//! finds optimal ones, slowly, and is used to check how far off Theta* is.

pub mod dijkstra;
pub mod theta_star;
