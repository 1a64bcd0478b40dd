//! Grading service
//!
//! Turns execution outcomes into solution records and applies instructor
//! grades. The engine itself never writes these rows.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    constants::{MAX_RATE, MIN_RATE},
    db::repositories::SolutionRepository,
    engine::{ExecutionOutcome, ExecutionRequest, WorkerPool},
    error::{EngineError, EngineResult, ValidationError},
    models::{Solution, SolutionExercise, Task, TaskTarget, aggregate_rate},
};

/// Outcome of a submission together with what was recorded for it
#[derive(Debug, Clone, Serialize)]
pub struct GradedSubmission {
    pub outcome: ExecutionOutcome,
    /// None when the run failed and nothing was recorded
    pub solution: Option<Solution>,
    pub solution_exercise: Option<SolutionExercise>,
}

/// Grading service for business logic
#[derive(Clone)]
pub struct GradingService {
    pool: WorkerPool,
    repo: Arc<dyn SolutionRepository>,
}

impl GradingService {
    pub fn new(pool: WorkerPool, repo: Arc<dyn SolutionRepository>) -> Self {
        Self { pool, repo }
    }

    pub fn repository(&self) -> &Arc<dyn SolutionRepository> {
        &self.repo
    }

    /// Test a submission and record it
    ///
    /// Only a run that completed is recorded; a rejected, failed or
    /// superseded run leaves the stored solution untouched.
    pub async fn submit(&self, request: ExecutionRequest) -> EngineResult<GradedSubmission> {
        let target = request.task.target;
        let (task_id, user_id) = (request.task.id, request.user.id);

        let outcome = self
            .pool
            .submit(request)
            .await
            .map_err(|e| EngineError::Internal(format!("Execution task failed: {}", e)))?;

        let Some(path) = outcome.solution_path.clone().filter(|_| outcome.success) else {
            return Ok(GradedSubmission {
                outcome,
                solution: None,
                solution_exercise: None,
            });
        };

        let (solution, solution_exercise) = match target {
            TaskTarget::Exercise(_) => {
                let mut solution = self.repo.get_or_create_solution(task_id, user_id, &path).await?;
                solution.tests_passed = Some(outcome.tests_passed);
                (self.repo.update_solution(&solution).await?, None)
            }
            TaskTarget::Test(_) => {
                let exercise_id = outcome
                    .exercise_id
                    .ok_or_else(|| EngineError::Internal("Completed run without an exercise".to_string()))?;
                let solution_dir = path.parent().unwrap_or(&path).to_path_buf();

                let solution = self
                    .repo
                    .get_or_create_solution(task_id, user_id, &solution_dir)
                    .await?;
                self.repo.upsert_solution_test(solution.id).await?;
                let part = self
                    .repo
                    .upsert_solution_exercise(
                        solution.id,
                        exercise_id,
                        None,
                        &path,
                        Some(outcome.tests_passed),
                    )
                    .await?;
                (solution, Some(part))
            }
        };

        tracing::info!(
            solution_id = solution.id,
            task_id,
            user_id,
            tests_passed = outcome.tests_passed,
            "Recorded submission"
        );

        Ok(GradedSubmission {
            outcome,
            solution: Some(solution),
            solution_exercise,
        })
    }

    /// Grade one exercise of a test solution
    pub async fn rate_exercise(
        &self,
        task: &Task,
        user_id: i64,
        exercise_id: i64,
        rate: f64,
    ) -> EngineResult<SolutionExercise> {
        check_rate(rate)?;
        if task.is_rated {
            return Err(ValidationError::TaskClosed(task.id).into());
        }

        let solution = self.find_solution(task.id, user_id).await?;
        let part = self
            .repo
            .find_solution_exercise(solution.id, exercise_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "exercise {} of solution {}",
                    exercise_id, solution.id
                ))
            })?;

        self.repo
            .upsert_solution_exercise(solution.id, exercise_id, Some(rate), &part.path, None)
            .await
    }

    /// Grade a whole solution directly
    pub async fn rate_solution(&self, task: &Task, user_id: i64, rate: f64) -> EngineResult<Solution> {
        check_rate(rate)?;
        if task.is_rated {
            return Err(ValidationError::TaskClosed(task.id).into());
        }

        let mut solution = self.find_solution(task.id, user_id).await?;
        solution.rate = rate;
        self.repo.update_solution(&solution).await
    }

    /// Close a task for grading
    ///
    /// For test tasks each solution's rate becomes the average of its
    /// exercise rates, rounded to the nearest half point.
    pub async fn close_task(&self, task: &mut Task) -> EngineResult<Vec<Solution>> {
        if task.is_rated {
            return Err(ValidationError::TaskClosed(task.id).into());
        }
        task.is_rated = true;

        let is_test = task.target.is_test();
        let solutions = self.repo.list_for_task(task.id).await?;
        let closed = futures::future::try_join_all(
            solutions
                .into_iter()
                .map(|solution| self.close_solution(solution, is_test)),
        )
        .await?;

        tracing::info!(task_id = task.id, solutions = closed.len(), "Task closed");
        Ok(closed)
    }

    async fn close_solution(&self, mut solution: Solution, is_test: bool) -> EngineResult<Solution> {
        if !is_test {
            return Ok(solution);
        }

        let rates: Vec<f64> = self
            .repo
            .list_solution_exercises(solution.id)
            .await?
            .iter()
            .map(|part| part.rate)
            .collect();

        match aggregate_rate(&rates) {
            Some(rate) => {
                solution.rate = rate;
                self.repo.update_solution(&solution).await
            }
            None => Ok(solution),
        }
    }

    async fn find_solution(&self, task_id: i64, user_id: i64) -> EngineResult<Solution> {
        self.repo
            .find_solution(task_id, user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("solution for task {} and user {}", task_id, user_id)))
    }
}

fn check_rate(rate: f64) -> Result<(), ValidationError> {
    if (MIN_RATE..=MAX_RATE).contains(&rate) {
        Ok(())
    } else {
        Err(ValidationError::InvalidRate(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use tempfile::TempDir;

    use crate::{
        config::Config,
        db::repositories::InMemorySolutionRepository,
        engine::{CommandSpec, Engine, ExecutorRegistry, ExecutorStrategy},
        models::{Exercise, Language, SubmissionMode, SubmissionPayload, User},
    };

    #[derive(Debug)]
    struct ExitStrategy;

    impl ExecutorStrategy for ExitStrategy {
        fn language(&self) -> Language {
            Language::Python
        }

        fn build_command(&self, _dir: &Path) -> CommandSpec {
            // Passes when the solution mentions "pass"
            CommandSpec::new("sh").arg("-c").arg("grep -q pass Solution.py")
        }
    }

    fn service(root: &Path) -> GradingService {
        let mut registry = ExecutorRegistry::default();
        registry.register(ExitStrategy);
        let engine = Engine::with_registry(&Config::rooted_at(root), registry);
        GradingService::new(
            WorkerPool::new(Arc::new(engine), 2),
            Arc::new(InMemorySolutionRepository::new()),
        )
    }

    fn task() -> Task {
        Task {
            id: 3,
            author_id: None,
            title: None,
            target: TaskTarget::Exercise(1),
            group_ids: vec![1],
            submission_mode: SubmissionMode::Editor,
            is_active: true,
            is_rated: false,
        }
    }

    fn request(text: Option<&str>) -> ExecutionRequest {
        ExecutionRequest {
            task: task(),
            user: User {
                id: 9,
                username: "ola".to_string(),
                group_ids: vec![1],
            },
            test: None,
            exercise: Some(Exercise {
                id: 1,
                author_id: None,
                title: "Grep".to_string(),
                language: Language::Python,
                level: None,
                content: String::new(),
            }),
            payload: text.map(|t| SubmissionPayload::Editor { text: t.to_string() }),
            timeout_seconds: None,
        }
    }

    #[tokio::test]
    async fn test_completed_run_is_recorded() {
        let tmp = TempDir::new().unwrap();
        let service = service(tmp.path());

        let graded = service.submit(request(Some("# fail"))).await.unwrap();
        assert!(graded.outcome.success);
        assert!(!graded.outcome.tests_passed);
        let solution = graded.solution.unwrap();
        assert_eq!(solution.tests_passed, Some(false));
        assert_eq!(solution.rate, 2.0);
        assert_eq!(solution.path, tmp.path().join("solutions/3/1/9"));

        let graded = service.submit(request(Some("# pass"))).await.unwrap();
        let resubmitted = graded.solution.unwrap();
        assert_eq!(resubmitted.id, solution.id);
        assert_eq!(resubmitted.tests_passed, Some(true));
    }

    #[tokio::test]
    async fn test_rejected_run_is_not_recorded() {
        let tmp = TempDir::new().unwrap();
        let service = service(tmp.path());

        let graded = service.submit(request(None)).await.unwrap();
        assert!(!graded.outcome.success);
        assert!(graded.solution.is_none());
        assert!(service.repository().list_for_task(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rating_rules() {
        let tmp = TempDir::new().unwrap();
        let service = service(tmp.path());
        let mut task = task();

        let err = service.rate_solution(&task, 9, 4.0).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        service.submit(request(Some("# pass"))).await.unwrap();
        let err = service.rate_solution(&task, 9, 6.0).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RATE");

        let rated = service.rate_solution(&task, 9, 4.5).await.unwrap();
        assert_eq!(rated.rate, 4.5);

        let closed = service.close_task(&mut task).await.unwrap();
        assert!(task.is_rated);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].rate, 4.5);

        let err = service.rate_solution(&task, 9, 3.0).await.unwrap_err();
        assert_eq!(err.error_code(), "TASK_CLOSED");
    }
}
