//! Data structures backing the searches.

pub mod indexed_heap;
