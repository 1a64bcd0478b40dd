//! Deterministic filesystem locations
//!
//! Every path is built from primary keys only, so renaming an exercise,
//! test or user never moves its files. Nothing here touches the disk;
//! callers create directories as needed.

use std::path::{Path, PathBuf};

use crate::{
    config::StorageConfig,
    constants::{RESULT_FILE_NAME, SOLUTION_FILE_STEM},
    models::{Exercise, Language, Task, Test, User},
};

/// Resolves exercise, test and submission directories
#[derive(Debug, Clone)]
pub struct PathResolver {
    exercises_path: PathBuf,
    tests_path: PathBuf,
    solutions_path: PathBuf,
}

impl PathResolver {
    /// Create a resolver over the configured storage roots
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            exercises_path: config.exercises_path.clone(),
            tests_path: config.tests_path.clone(),
            solutions_path: config.solutions_path.clone(),
        }
    }

    /// `<exercises>/<exercise-id>`, holding the exercise's unit-test fixtures
    pub fn exercise_root(&self, exercise: &Exercise) -> PathBuf {
        self.exercises_path.join(exercise.id.to_string())
    }

    /// `<tests>/<test-id>`
    pub fn test_root(&self, test: &Test) -> PathBuf {
        self.tests_path.join(test.id.to_string())
    }

    /// `<tests>/<test-id>/<exercise-id>`, test-specific fixtures for one exercise
    pub fn test_exercise_root(&self, test: &Test, exercise: &Exercise) -> PathBuf {
        self.test_root(test).join(exercise.id.to_string())
    }

    /// `<solutions>/<task-id>/<group-id>/<user-id>`
    pub fn submission_dir(&self, task: &Task, group_id: i64, user: &User) -> PathBuf {
        self.solutions_path
            .join(task.id.to_string())
            .join(group_id.to_string())
            .join(user.id.to_string())
    }

    /// Working area for one exercise of a test task
    pub fn exercise_submission_dir(
        &self,
        task: &Task,
        group_id: i64,
        user: &User,
        exercise: &Exercise,
    ) -> PathBuf {
        self.submission_dir(task, group_id, user)
            .join(exercise.id.to_string())
    }
}

/// File name of the canonical solution artifact, e.g. `Solution.py`
pub fn solution_file_name(language: Language) -> String {
    format!("{}{}", SOLUTION_FILE_STEM, language.extension())
}

/// Path of the canonical solution artifact inside a submission directory
pub fn solution_file(dir: &Path, language: Language) -> PathBuf {
    dir.join(solution_file_name(language))
}

/// Path of the captured runner output inside a submission directory
pub fn result_file(dir: &Path) -> PathBuf {
    dir.join(RESULT_FILE_NAME)
}
