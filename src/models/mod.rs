//! Domain models
//!
//! This module contains all domain models the engine consumes and produces.

pub mod exam;
pub mod exercise;
pub mod solution;
pub mod submission;
pub mod task;
pub mod user;

pub use exam::*;
pub use exercise::*;
pub use solution::*;
pub use submission::*;
pub use task::*;
pub use user::*;
