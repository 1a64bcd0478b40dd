//! Task model

use serde::{Deserialize, Serialize};

/// An assignment of one exercise or one test to one or more groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub author_id: Option<i64>,
    pub title: Option<String>,
    pub target: TaskTarget,
    pub group_ids: Vec<i64>,
    pub submission_mode: SubmissionMode,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_rated: bool,
}

fn default_active() -> bool {
    true
}

/// What a task asks the student to solve. Fixed once the task exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TaskTarget {
    Exercise(i64),
    Test(i64),
}

impl TaskTarget {
    pub fn is_test(&self) -> bool {
        matches!(self, Self::Test(_))
    }
}

/// How the student hands in a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// Uploaded file carrying the language extension
    File,
    /// Source text typed into the web editor
    Editor,
}

impl std::fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Editor => write!(f, "editor"),
        }
    }
}

impl Task {
    /// Task can still accept submissions
    pub fn accepts_submissions(&self) -> bool {
        self.is_active && !self.is_rated
    }
}
