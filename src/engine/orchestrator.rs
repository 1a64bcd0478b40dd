//! Submission execution entry point

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::{
    languages::ExecutorRegistry,
    parser::TestSummary,
    session::SubmissionSession,
};
use crate::{
    config::Config,
    constants::MAX_EXECUTION_TIMEOUT_SECONDS,
    error::EngineError,
    models::{Exercise, SubmissionPayload, Task, TaskTarget, Test, User},
    storage::{FixtureReport, FixtureStager, PathResolver},
};

/// Identifies the submission directory a run writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub task_id: i64,
    pub user_id: i64,
    /// Selected exercise of a test task; each one is staged separately
    pub exercise_id: Option<i64>,
}

/// One submission to test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub task: Task,
    pub user: User,
    /// The test a test task targets
    #[serde(default)]
    pub test: Option<Test>,
    /// The exercise being solved; for test tasks, the selected one
    pub exercise: Option<Exercise>,
    pub payload: Option<SubmissionPayload>,
    /// Overrides the configured time limit
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ExecutionRequest {
    /// Key runs are serialized on
    pub fn key(&self) -> RunKey {
        let exercise_id = match self.task.target {
            TaskTarget::Exercise(_) => None,
            TaskTarget::Test(_) => self.exercise.as_ref().map(|e| e.id),
        };
        RunKey {
            task_id: self.task.id,
            user_id: self.user.id,
            exercise_id,
        }
    }
}

/// Normalized result of one execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub tests_passed: bool,
    pub message: String,
    pub result_lines: Vec<String>,
    pub summary: TestSummary,
    pub solution_path: Option<PathBuf>,
    pub exercise_id: Option<i64>,
    /// Fixture copy result; absent when the run stopped before fixtures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<FixtureReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ExecutionOutcome {
    /// Outcome for a run that never started
    pub fn failed(message: impl Into<String>, error_code: &str) -> Self {
        Self {
            success: false,
            tests_passed: false,
            message: message.into(),
            result_lines: Vec::new(),
            summary: TestSummary::default(),
            solution_path: None,
            exercise_id: None,
            fixtures: None,
            error_code: Some(error_code.to_string()),
        }
    }
}

/// Shared, read-only engine components
#[derive(Debug, Clone)]
pub struct Engine {
    pub(crate) resolver: PathResolver,
    pub(crate) stager: FixtureStager,
    pub(crate) registry: ExecutorRegistry,
    default_timeout: Duration,
}

impl Engine {
    /// Create an engine with the built-in language strategies
    pub fn new(config: &Config) -> Self {
        Self::with_registry(config, ExecutorRegistry::from_config(&config.execution))
    }

    /// Create an engine with a custom strategy registry
    pub fn with_registry(config: &Config, registry: ExecutorRegistry) -> Self {
        Self {
            resolver: PathResolver::new(&config.storage),
            stager: FixtureStager::new(
                config.execution.fixture_policy,
                config.execution.max_source_size_bytes,
            ),
            registry,
            default_timeout: config.execution.timeout,
        }
    }

    /// Start a session with the default time limit
    pub fn session(&self) -> SubmissionSession<'_> {
        SubmissionSession::new(self, self.default_timeout, CancellationToken::new())
    }

    /// Start a session with an explicit time limit and cancellation token
    pub fn session_with(&self, timeout: Duration, cancel: CancellationToken) -> SubmissionSession<'_> {
        SubmissionSession::new(self, timeout, cancel)
    }

    /// Time limit for a request: its override clamped to the allowed range, else the default
    pub fn timeout_for(&self, request: &ExecutionRequest) -> Duration {
        request
            .timeout_seconds
            .map(|secs| Duration::from_secs(secs.clamp(1, MAX_EXECUTION_TIMEOUT_SECONDS)))
            .unwrap_or(self.default_timeout)
    }

    /// Configure and run one submission
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionOutcome {
        self.execute_with_cancel(request, CancellationToken::new()).await
    }

    /// Configure and run one submission, abandoning it when `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        request: ExecutionRequest,
        cancel: CancellationToken,
    ) -> ExecutionOutcome {
        let span = tracing::info_span!(
            "submission",
            task_id = request.task.id,
            user_id = request.user.id,
            exercise_id = ?request.exercise.as_ref().map(|e| e.id),
            run_id = %Uuid::new_v4(),
        );

        async move {
            let mut session = self.session_with(self.timeout_for(&request), cancel);

            if let Err(e) = session.configure(
                &request.user,
                &request.task,
                request.test.as_ref(),
                request.exercise.as_ref(),
                request.payload.as_ref(),
            ) {
                let error = EngineError::from(e);
                tracing::info!(error = %error, code = error.error_code(), "Submission rejected");
                return ExecutionOutcome::failed(error.to_string(), error.error_code());
            }

            let report = session.run().await;

            ExecutionOutcome {
                success: report.success,
                tests_passed: report.success && session.tests_passed(),
                message: report.message,
                summary: session.summary(),
                solution_path: session.solution_dir().map(|p| p.to_path_buf()),
                exercise_id: session.exercise_id(),
                fixtures: session.fixture_report().cloned(),
                error_code: session.last_error().map(|e| e.error_code().to_string()),
                result_lines: session.into_result_lines(),
            }
        }
        .instrument(span)
        .await
    }
}
