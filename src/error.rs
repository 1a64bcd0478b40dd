//! Custom error types and handling
//!
//! Errors are grouped by the stage of a submission run that produced them.
//! Every family converts into [`EngineError`], which the orchestrator
//! catches and turns into a normalized outcome, so no error escapes to the
//! caller of `execute`.

use std::path::PathBuf;
use std::time::Duration;

/// Submission rejected before any filesystem or process side effect
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file extension: expected `{expected}`, got `{filename}`")]
    InvalidExtension { expected: String, filename: String },

    #[error("No solution was submitted")]
    MissingPayload,

    #[error("Solution exceeds maximum size of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Task {0} is not active")]
    TaskInactive(i64),

    #[error("Task {0} has already been rated")]
    TaskClosed(i64),

    #[error("User {user_id} is not assigned to task {task_id}")]
    NotAssigned { task_id: i64, user_id: i64 },

    #[error("Task expects a {expected} submission")]
    ModeMismatch { expected: String },

    #[error("Exercise {exercise_id} is not part of test {test_id}")]
    ExerciseNotInTest { test_id: i64, exercise_id: i64 },

    #[error("Task targets a test; an exercise must be selected")]
    ExerciseNotSelected,

    #[error("Exercise {0} does not belong to this task")]
    ExerciseMismatch(i64),

    #[error("Task targets test {0}, which was not provided")]
    TestMismatch(i64),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Rate {0} is outside the grading scale")]
    InvalidRate(f64),
}

/// Failure while writing the submission or copying fixtures
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage {failed} fixture file(s) from {root}")]
    Fixtures { root: PathBuf, failed: usize },

    #[error("Fixture directory {0} does not exist")]
    FixtureRootMissing(PathBuf),
}

/// Failure while running the test command
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Execution was cancelled")]
    Cancelled,

    #[error("Failed to write result artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to collect process output: {0}")]
    Wait(#[source] std::io::Error),
}

/// Failure while reading the result artifact
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("Result artifact {path} is missing or unreadable: {source}")]
    ArtifactMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Engine-wide error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Parsing(#[from] ParsingError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => match e {
                ValidationError::InvalidExtension { .. } => "INVALID_EXTENSION",
                ValidationError::MissingPayload => "MISSING_PAYLOAD",
                ValidationError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
                ValidationError::TaskInactive(_) => "TASK_INACTIVE",
                ValidationError::TaskClosed(_) => "TASK_CLOSED",
                ValidationError::NotAssigned { .. } => "NOT_ASSIGNED",
                ValidationError::ModeMismatch { .. } => "MODE_MISMATCH",
                ValidationError::ExerciseNotInTest { .. }
                | ValidationError::ExerciseNotSelected
                | ValidationError::ExerciseMismatch(_)
                | ValidationError::TestMismatch(_) => "INVALID_EXERCISE",
                ValidationError::UnsupportedLanguage(_) => "UNSUPPORTED_LANGUAGE",
                ValidationError::InvalidRate(_) => "INVALID_RATE",
            },
            Self::Staging(_) => "STAGING_ERROR",
            Self::Execution(e) => match e {
                ExecutionError::SpawnFailed { .. } => "PROCESS_SPAWN_FAILED",
                ExecutionError::Timeout(_) => "TIMEOUT",
                ExecutionError::Cancelled => "CANCELLED",
                ExecutionError::Artifact { .. } | ExecutionError::Wait(_) => "EXECUTION_ERROR",
            },
            Self::Parsing(_) => "ARTIFACT_MISSING",
            Self::Repository(_) => "REPOSITORY_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can fix this by changing the submission
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;
