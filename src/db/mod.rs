//! Persistence module

pub mod repositories;

pub use repositories::*;
