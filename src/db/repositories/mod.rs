//! Repositories
//!
//! Repositories handle all persistence of grading records.

pub mod solution_repo;

pub use solution_repo::{InMemorySolutionRepository, SolutionRepository};
