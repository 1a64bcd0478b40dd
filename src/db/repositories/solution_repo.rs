//! Solution repository
//!
//! The engine reports outcomes through this trait; it never uses it to
//! authorize anything. The in-memory implementation backs the binary and
//! the tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    constants::DEFAULT_RATE,
    error::{EngineError, EngineResult},
    models::{Solution, SolutionExercise, SolutionTest},
};

/// Persistence of solutions and their per-exercise parts
#[async_trait]
pub trait SolutionRepository: Send + Sync {
    /// Get the solution for (task, user), creating it with the default rate
    ///
    /// An existing solution keeps its id and rate; its path is updated.
    async fn get_or_create_solution(
        &self,
        task_id: i64,
        user_id: i64,
        path: &Path,
    ) -> EngineResult<Solution>;

    /// Create or update the part of a solution for one exercise
    async fn upsert_solution_exercise(
        &self,
        solution_id: i64,
        exercise_id: i64,
        rate: Option<f64>,
        path: &Path,
        tests_passed: Option<bool>,
    ) -> EngineResult<SolutionExercise>;

    /// Create the test companion of a solution if it does not exist
    async fn upsert_solution_test(&self, solution_id: i64) -> EngineResult<SolutionTest>;

    async fn find_solution(&self, task_id: i64, user_id: i64) -> EngineResult<Option<Solution>>;

    async fn find_solution_by_id(&self, id: i64) -> EngineResult<Option<Solution>>;

    async fn find_solution_exercise(
        &self,
        solution_id: i64,
        exercise_id: i64,
    ) -> EngineResult<Option<SolutionExercise>>;

    async fn list_solution_exercises(&self, solution_id: i64) -> EngineResult<Vec<SolutionExercise>>;

    async fn find_solution_test(&self, solution_id: i64) -> EngineResult<Option<SolutionTest>>;

    /// Replace a stored solution
    async fn update_solution(&self, solution: &Solution) -> EngineResult<Solution>;

    /// All solutions handed in for a task
    async fn list_for_task(&self, task_id: i64) -> EngineResult<Vec<Solution>>;
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    solutions: HashMap<i64, Solution>,
    solution_exercises: HashMap<i64, SolutionExercise>,
    solution_tests: HashMap<i64, SolutionTest>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemorySolutionRepository {
    tables: RwLock<Tables>,
}

impl InMemorySolutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SolutionRepository for InMemorySolutionRepository {
    async fn get_or_create_solution(
        &self,
        task_id: i64,
        user_id: i64,
        path: &Path,
    ) -> EngineResult<Solution> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(existing) = tables
            .solutions
            .values_mut()
            .find(|s| s.task_id == task_id && s.user_id == user_id)
        {
            existing.path = path.to_path_buf();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = tables.next_id();
        let solution = Solution {
            id,
            task_id,
            user_id,
            path: path.to_path_buf(),
            rate: DEFAULT_RATE,
            tests_passed: None,
            submitted_at: now,
            updated_at: now,
        };
        tables.solutions.insert(id, solution.clone());
        tracing::debug!(solution_id = id, task_id, user_id, "Created solution");

        Ok(solution)
    }

    async fn upsert_solution_exercise(
        &self,
        solution_id: i64,
        exercise_id: i64,
        rate: Option<f64>,
        path: &Path,
        tests_passed: Option<bool>,
    ) -> EngineResult<SolutionExercise> {
        let mut tables = self.tables.write().await;
        if !tables.solutions.contains_key(&solution_id) {
            return Err(EngineError::NotFound(format!("solution {}", solution_id)));
        }
        let now = Utc::now();

        if let Some(existing) = tables
            .solution_exercises
            .values_mut()
            .find(|se| se.solution_id == solution_id && se.exercise_id == exercise_id)
        {
            existing.path = path.to_path_buf();
            if let Some(rate) = rate {
                existing.rate = rate;
            }
            if tests_passed.is_some() {
                existing.tests_passed = tests_passed;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = tables.next_id();
        let row = SolutionExercise {
            id,
            solution_id,
            exercise_id,
            path: path.to_path_buf(),
            rate: rate.unwrap_or(DEFAULT_RATE),
            tests_passed,
            updated_at: now,
        };
        tables.solution_exercises.insert(id, row.clone());

        Ok(row)
    }

    async fn upsert_solution_test(&self, solution_id: i64) -> EngineResult<SolutionTest> {
        let mut tables = self.tables.write().await;
        if !tables.solutions.contains_key(&solution_id) {
            return Err(EngineError::NotFound(format!("solution {}", solution_id)));
        }

        if let Some(existing) = tables
            .solution_tests
            .values()
            .find(|st| st.solution_id == solution_id)
        {
            return Ok(existing.clone());
        }

        let id = tables.next_id();
        let row = SolutionTest {
            id,
            solution_id,
            created_at: Utc::now(),
        };
        tables.solution_tests.insert(id, row.clone());

        Ok(row)
    }

    async fn find_solution(&self, task_id: i64, user_id: i64) -> EngineResult<Option<Solution>> {
        let tables = self.tables.read().await;
        Ok(tables
            .solutions
            .values()
            .find(|s| s.task_id == task_id && s.user_id == user_id)
            .cloned())
    }

    async fn find_solution_by_id(&self, id: i64) -> EngineResult<Option<Solution>> {
        Ok(self.tables.read().await.solutions.get(&id).cloned())
    }

    async fn find_solution_exercise(
        &self,
        solution_id: i64,
        exercise_id: i64,
    ) -> EngineResult<Option<SolutionExercise>> {
        let tables = self.tables.read().await;
        Ok(tables
            .solution_exercises
            .values()
            .find(|se| se.solution_id == solution_id && se.exercise_id == exercise_id)
            .cloned())
    }

    async fn list_solution_exercises(&self, solution_id: i64) -> EngineResult<Vec<SolutionExercise>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .solution_exercises
            .values()
            .filter(|se| se.solution_id == solution_id)
            .cloned()
            .collect();
        rows.sort_by_key(|se| se.exercise_id);
        Ok(rows)
    }

    async fn find_solution_test(&self, solution_id: i64) -> EngineResult<Option<SolutionTest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .solution_tests
            .values()
            .find(|st| st.solution_id == solution_id)
            .cloned())
    }

    async fn update_solution(&self, solution: &Solution) -> EngineResult<Solution> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.solutions.get_mut(&solution.id) else {
            return Err(EngineError::NotFound(format!("solution {}", solution.id)));
        };
        *stored = solution.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn list_for_task(&self, task_id: i64) -> EngineResult<Vec<Solution>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .solutions
            .values()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.id);
        Ok(rows)
    }
}
