//! Filesystem layout and staging

pub mod paths;
pub mod stager;

pub use paths::{result_file, solution_file, solution_file_name, PathResolver};
pub use stager::{read_staged_solution, FixtureReport, FixtureSource, FixtureStager};
