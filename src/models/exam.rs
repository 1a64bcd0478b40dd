//! Test (kolokwium) model

use serde::{Deserialize, Serialize};

/// A named bundle of exercises assigned together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub author_id: Option<i64>,
    pub name: String,
    pub exercise_ids: Vec<i64>,
}

impl Test {
    /// Check whether an exercise belongs to this test
    pub fn contains(&self, exercise_id: i64) -> bool {
        self.exercise_ids.contains(&exercise_id)
    }
}
