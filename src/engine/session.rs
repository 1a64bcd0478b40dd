//! One submission's path through staging, execution and parsing

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{
    languages::ExecutorStrategy,
    orchestrator::Engine,
    parser::{ResultParser, TestSummary},
    process::{ExecutionPlan, ProcessRunner},
};
use crate::{
    constants::messages,
    error::{EngineError, EngineResult, ExecutionError, ValidationError},
    models::{Exercise, Language, SubmissionPayload, Task, TaskTarget, Test, User},
    storage::{FixtureReport, FixtureSource, result_file},
};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Unconfigured,
    Configured,
    Staged,
    Executed,
    Parsed,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Staged => "staged",
            Self::Executed => "executed",
            Self::Parsed => "parsed",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of [`SubmissionSession::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub success: bool,
    pub message: String,
}

impl RunReport {
    fn ok() -> Self {
        Self {
            success: true,
            message: messages::TESTING_COMPLETED.to_string(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Everything `configure` resolved, ready for `run`
#[derive(Debug, Clone)]
struct PreparedRun {
    exercise_id: i64,
    language: Language,
    dir: PathBuf,
    payload: SubmissionPayload,
    fixtures: Vec<FixtureSource>,
    strategy: Arc<dyn ExecutorStrategy>,
}

/// Stateful handle for testing one submission
///
/// `configure` validates and resolves without touching the disk; `run`
/// stages, executes and parses. No error escapes `run`.
pub struct SubmissionSession<'a> {
    engine: &'a Engine,
    runner: ProcessRunner,
    cancel: CancellationToken,
    state: RunState,
    prepared: Option<PreparedRun>,
    result_lines: Vec<String>,
    summary: TestSummary,
    tests_passed: bool,
    fixture_report: Option<FixtureReport>,
    last_error: Option<EngineError>,
}

impl<'a> SubmissionSession<'a> {
    pub(crate) fn new(engine: &'a Engine, timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            engine,
            runner: ProcessRunner::new(timeout),
            cancel,
            state: RunState::Unconfigured,
            prepared: None,
            result_lines: Vec::new(),
            summary: TestSummary::default(),
            tests_passed: false,
            fixture_report: None,
            last_error: None,
        }
    }

    /// Validate the submission and resolve everything needed to run it
    pub fn configure(
        &mut self,
        user: &User,
        task: &Task,
        test: Option<&Test>,
        exercise: Option<&Exercise>,
        payload: Option<&SubmissionPayload>,
    ) -> Result<(), ValidationError> {
        self.state = RunState::Unconfigured;
        self.prepared = None;
        self.result_lines.clear();
        self.summary = TestSummary::default();
        self.tests_passed = false;
        self.last_error = None;
        self.fixture_report = None;

        let prepared = self.prepare(user, task, test, exercise, payload)?;

        tracing::debug!(dir = %prepared.dir.display(), language = %prepared.language, "Session configured");
        self.prepared = Some(prepared);
        self.state = RunState::Configured;
        Ok(())
    }

    fn prepare(
        &self,
        user: &User,
        task: &Task,
        test: Option<&Test>,
        exercise: Option<&Exercise>,
        payload: Option<&SubmissionPayload>,
    ) -> Result<PreparedRun, ValidationError> {
        if !task.accepts_submissions() {
            return Err(if task.is_active {
                ValidationError::TaskClosed(task.id)
            } else {
                ValidationError::TaskInactive(task.id)
            });
        }

        let group_id = task
            .group_ids
            .iter()
            .copied()
            .find(|group_id| user.is_member_of(*group_id))
            .ok_or(ValidationError::NotAssigned {
                task_id: task.id,
                user_id: user.id,
            })?;

        let exercise = exercise.ok_or(ValidationError::ExerciseNotSelected)?;
        let resolver = &self.engine.resolver;

        let (dir, fixtures) = match task.target {
            TaskTarget::Exercise(exercise_id) => {
                if exercise.id != exercise_id {
                    return Err(ValidationError::ExerciseMismatch(exercise.id));
                }
                (
                    resolver.submission_dir(task, group_id, user),
                    vec![FixtureSource::required(resolver.exercise_root(exercise))],
                )
            }
            TaskTarget::Test(test_id) => {
                let test = test
                    .filter(|t| t.id == test_id)
                    .ok_or(ValidationError::TestMismatch(test_id))?;
                if !test.contains(exercise.id) {
                    return Err(ValidationError::ExerciseNotInTest {
                        test_id,
                        exercise_id: exercise.id,
                    });
                }
                (
                    resolver.exercise_submission_dir(task, group_id, user, exercise),
                    vec![
                        FixtureSource::required(resolver.exercise_root(exercise)),
                        FixtureSource::optional(resolver.test_exercise_root(test, exercise)),
                    ],
                )
            }
        };

        let payload = payload.ok_or(ValidationError::MissingPayload)?;
        if payload.mode() != task.submission_mode {
            return Err(ValidationError::ModeMismatch {
                expected: task.submission_mode.to_string(),
            });
        }

        let strategy = self.engine.registry.for_language(exercise.language)?;
        self.engine.stager.validate(payload, exercise.language)?;

        Ok(PreparedRun {
            exercise_id: exercise.id,
            language: exercise.language,
            dir,
            payload: payload.clone(),
            fixtures,
            strategy,
        })
    }

    /// Stage, execute and parse the configured submission
    pub async fn run(&mut self) -> RunReport {
        if self.state != RunState::Configured {
            return RunReport::failed(messages::NOT_CONFIGURED);
        }
        let Some(prepared) = self.prepared.clone() else {
            return RunReport::failed(messages::NOT_CONFIGURED);
        };

        match self.drive(&prepared).await {
            Ok(()) => {
                self.state = RunState::Completed;
                tracing::info!(
                    tests_passed = self.tests_passed,
                    lines = self.result_lines.len(),
                    passed = self.summary.passed,
                    failed = self.summary.failed,
                    skipped = self.summary.skipped,
                    "Testing completed"
                );
                RunReport::ok()
            }
            Err(e) => {
                let failed_in = self.state;
                self.state = RunState::Failed;
                let message = failure_message(&e);
                tracing::warn!(
                    error = %e,
                    code = e.error_code(),
                    stage = %failed_in,
                    "Testing failed"
                );
                self.last_error = Some(e);
                RunReport::failed(message)
            }
        }
    }

    async fn drive(&mut self, prepared: &PreparedRun) -> EngineResult<()> {
        let stager = &self.engine.stager;

        stager
            .stage_solution(&prepared.payload, prepared.language, &prepared.dir)
            .await?;
        let report = stager
            .copy_fixtures(&prepared.fixtures, prepared.language, &prepared.dir)
            .await?;
        self.fixture_report = Some(report);
        self.state = RunState::Staged;

        if self.cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled.into());
        }

        let plan = ExecutionPlan::for_strategy(prepared.strategy.as_ref(), &prepared.dir);
        let artifact = result_file(&prepared.dir);
        let outcome = self
            .runner
            .run(&plan, &prepared.dir, &artifact, &self.cancel)
            .await?;
        self.tests_passed = outcome.tests_passed();
        self.state = RunState::Executed;

        let lines = ResultParser::parse_file(&artifact).await?;
        self.summary = ResultParser::summarize(&lines);
        self.result_lines = lines;
        self.state = RunState::Parsed;

        Ok(())
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Result lines of the last completed run, in artifact order
    pub fn result_lines(&self) -> &[String] {
        &self.result_lines
    }

    pub fn into_result_lines(self) -> Vec<String> {
        self.result_lines
    }

    /// Whether the test run exited successfully
    pub fn tests_passed(&self) -> bool {
        self.tests_passed
    }

    pub fn summary(&self) -> TestSummary {
        self.summary
    }

    /// Submission directory of the configured run
    pub fn solution_dir(&self) -> Option<&Path> {
        self.prepared.as_ref().map(|p| p.dir.as_path())
    }

    pub fn exercise_id(&self) -> Option<i64> {
        self.prepared.as_ref().map(|p| p.exercise_id)
    }

    /// Fixtures staged by the last run, once staging got that far
    pub fn fixture_report(&self) -> Option<&FixtureReport> {
        self.fixture_report.as_ref()
    }

    /// Error that failed the last run, if any
    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }
}

fn failure_message(error: &EngineError) -> String {
    match error {
        EngineError::Validation(e) => e.to_string(),
        EngineError::Execution(ExecutionError::Timeout(_)) => messages::TIMED_OUT.to_string(),
        EngineError::Execution(ExecutionError::Cancelled) => messages::SUPERSEDED.to_string(),
        EngineError::Parsing(_) => messages::RESULTS_UNAVAILABLE.to_string(),
        _ => messages::TESTING_FAILED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        engine::languages::{CommandSpec, ExecutorRegistry},
        models::SubmissionMode,
    };
    use tempfile::TempDir;

    /// Prints every `test_*` file name, standing in for a test runner
    #[derive(Debug)]
    struct ListingStrategy;

    impl ExecutorStrategy for ListingStrategy {
        fn language(&self) -> Language {
            Language::Python
        }

        fn build_command(&self, _dir: &Path) -> CommandSpec {
            CommandSpec::new("sh")
                .arg("-c")
                .arg("cat Solution.py; echo; for f in test_*; do [ -e \"$f\" ] && echo \"$f ... ok\"; done; true")
        }
    }

    fn engine(root: &Path) -> Engine {
        let mut registry = ExecutorRegistry::default();
        registry.register(ListingStrategy);
        Engine::with_registry(&Config::rooted_at(root), registry)
    }

    fn exercise(id: i64) -> Exercise {
        Exercise {
            id,
            author_id: None,
            title: format!("Exercise {}", id),
            language: Language::Python,
            level: None,
            content: String::new(),
        }
    }

    fn task(target: TaskTarget, mode: SubmissionMode) -> Task {
        Task {
            id: 5,
            author_id: None,
            title: None,
            target,
            group_ids: vec![2, 3],
            submission_mode: mode,
            is_active: true,
            is_rated: false,
        }
    }

    fn student() -> User {
        User {
            id: 10,
            username: "anna".to_string(),
            group_ids: vec![3],
        }
    }

    fn editor(text: &str) -> SubmissionPayload {
        SubmissionPayload::Editor {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let fixtures = tmp.path().join("exercises").join("7");
        std::fs::create_dir_all(&fixtures).unwrap();
        std::fs::write(fixtures.join("test_one.py"), "").unwrap();

        let engine = engine(tmp.path());
        let mut session = engine.session();
        let ex = exercise(7);
        let payload = editor("answer = 42");

        session
            .configure(
                &student(),
                &task(TaskTarget::Exercise(7), SubmissionMode::Editor),
                None,
                Some(&ex),
                Some(&payload),
            )
            .unwrap();
        assert_eq!(session.state(), RunState::Configured);
        assert_eq!(
            session.solution_dir(),
            Some(tmp.path().join("solutions/5/3/10").as_path())
        );

        let report = session.run().await;
        assert!(report.success, "{}", report.message);
        assert_eq!(session.state(), RunState::Completed);
        assert!(session.tests_passed());
        assert_eq!(session.result_lines(), ["answer = 42", "test_one.py ... ok"]);
        assert_eq!(session.summary().passed, 1);
        let report = session.fixture_report().unwrap();
        assert_eq!(report.copied, vec!["test_one.py"]);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_failed_rerun_does_not_keep_previous_results() {
        let tmp = TempDir::new().unwrap();
        let fixtures = tmp.path().join("exercises").join("7");
        std::fs::create_dir_all(&fixtures).unwrap();
        std::fs::write(fixtures.join("test_one.py"), "").unwrap();

        let engine = engine(tmp.path());
        let token = CancellationToken::new();
        let mut session = engine.session_with(Duration::from_secs(5), token.clone());
        let ex = exercise(7);
        let on_exercise = task(TaskTarget::Exercise(7), SubmissionMode::Editor);

        session
            .configure(&student(), &on_exercise, None, Some(&ex), Some(&editor("fast")))
            .unwrap();
        assert!(session.run().await.success);
        assert!(session.tests_passed());
        assert!(!session.result_lines().is_empty());

        token.cancel();
        session
            .configure(&student(), &on_exercise, None, Some(&ex), Some(&editor("slow")))
            .unwrap();
        assert!(session.result_lines().is_empty());

        let report = session.run().await;
        assert!(!report.success);
        assert!(!session.tests_passed());
        assert!(session.result_lines().is_empty());
        assert_eq!(session.summary(), TestSummary::default());
        assert_eq!(session.last_error().map(|e| e.error_code()), Some("CANCELLED"));
    }

    #[tokio::test]
    async fn test_run_without_configure() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(tmp.path());
        let mut session = engine.session();

        let report = session.run().await;
        assert_eq!(report, RunReport::failed(messages::NOT_CONFIGURED));
        assert!(session.result_lines().is_empty());
    }

    #[tokio::test]
    async fn test_failed_configure_leaves_session_unconfigured() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(tmp.path());
        let mut session = engine.session();
        let ex = exercise(7);
        let upload = SubmissionPayload::File {
            filename: "answer.cpp".to_string(),
            content: b"int main() {}".to_vec(),
        };

        let err = session
            .configure(
                &student(),
                &task(TaskTarget::Exercise(7), SubmissionMode::File),
                None,
                Some(&ex),
                Some(&upload),
            )
            .unwrap_err();

        assert!(matches!(err, ValidationError::InvalidExtension { .. }));
        assert_eq!(session.state(), RunState::Unconfigured);
        assert!(!session.run().await.success);
        assert!(!tmp.path().join("solutions").exists());
    }

    #[test]
    fn test_configure_rejections() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(tmp.path());
        let ex = exercise(7);
        let payload = editor("x = 1");
        let direct = task(TaskTarget::Exercise(7), SubmissionMode::Editor);

        let mut inactive = direct.clone();
        inactive.is_active = false;
        let mut rated = direct.clone();
        rated.is_rated = true;
        let outsider = User {
            id: 11,
            username: "bob".to_string(),
            group_ids: vec![9],
        };
        let test = Test {
            id: 4,
            author_id: None,
            name: "Midterm".to_string(),
            exercise_ids: vec![8],
        };
        let on_test = task(TaskTarget::Test(4), SubmissionMode::Editor);

        let check = |user: &User, task: &Task, test: Option<&Test>, ex: Option<&Exercise>, payload: Option<&SubmissionPayload>| {
            engine.session().configure(user, task, test, ex, payload).unwrap_err()
        };

        assert!(matches!(check(&student(), &inactive, None, Some(&ex), Some(&payload)), ValidationError::TaskInactive(5)));
        assert!(matches!(check(&student(), &rated, None, Some(&ex), Some(&payload)), ValidationError::TaskClosed(5)));
        assert!(matches!(check(&outsider, &direct, None, Some(&ex), Some(&payload)), ValidationError::NotAssigned { .. }));
        assert!(matches!(check(&student(), &direct, None, Some(&exercise(8)), Some(&payload)), ValidationError::ExerciseMismatch(8)));
        assert!(matches!(check(&student(), &direct, None, None, Some(&payload)), ValidationError::ExerciseNotSelected));
        assert!(matches!(check(&student(), &direct, None, Some(&ex), None), ValidationError::MissingPayload));
        assert!(matches!(check(&student(), &on_test, None, Some(&ex), Some(&payload)), ValidationError::TestMismatch(4)));
        assert!(matches!(check(&student(), &on_test, Some(&test), Some(&ex), Some(&payload)), ValidationError::ExerciseNotInTest { test_id: 4, exercise_id: 7 }));

        let upload = SubmissionPayload::File {
            filename: "x.py".to_string(),
            content: b"x = 1".to_vec(),
        };
        assert!(matches!(check(&student(), &direct, None, Some(&ex), Some(&upload)), ValidationError::ModeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_execution() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(tmp.path());
        let token = CancellationToken::new();
        token.cancel();
        let mut session = engine.session_with(Duration::from_secs(5), token);
        let ex = exercise(7);

        session
            .configure(
                &student(),
                &task(TaskTarget::Exercise(7), SubmissionMode::Editor),
                None,
                Some(&ex),
                Some(&editor("x = 1")),
            )
            .unwrap();
        let report = session.run().await;

        assert_eq!(report, RunReport::failed(messages::SUPERSEDED));
        assert_eq!(session.state(), RunState::Failed);
        assert_eq!(session.last_error().map(|e| e.error_code()), Some("CANCELLED"));
    }
}
