//! Solution models

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student's submission record for one task. One per (task, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub path: PathBuf,
    pub rate: f64,
    /// Outcome of the most recent run, None until one completes
    pub tests_passed: Option<bool>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-exercise part of a solution to a test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionExercise {
    pub id: i64,
    pub solution_id: i64,
    pub exercise_id: i64,
    pub path: PathBuf,
    pub rate: f64,
    pub tests_passed: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

/// Companion of a solution whose task is a test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionTest {
    pub id: i64,
    pub solution_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Round a rate to the nearest half point (3.25 -> 3.5, 3.2 -> 3.0)
pub fn round_to_half(rate: f64) -> f64 {
    (rate * 2.0).round() / 2.0
}

/// Average of exercise rates rounded to the nearest half point
pub fn aggregate_rate(rates: &[f64]) -> Option<f64> {
    if rates.is_empty() {
        return None;
    }
    let mean = rates.iter().sum::<f64>() / rates.len() as f64;
    Some(round_to_half(mean))
}
