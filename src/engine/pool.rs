//! Bounded worker pool for submission runs
//!
//! Runs with the same key share one submission directory, so they are
//! serialized by a per-key lock. Each exercise of a test task has its own
//! key. A newer submission cancels the run it
//! supersedes. Different keys run in parallel up to the configured limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::orchestrator::{Engine, ExecutionOutcome, ExecutionRequest, RunKey};
use crate::constants::messages;

#[derive(Debug, Default)]
struct KeyState {
    generation: u64,
    token: CancellationToken,
    lock: Arc<tokio::sync::Mutex<()>>,
    pending: usize,
}

/// Executes submissions as tokio tasks
#[derive(Debug, Clone)]
pub struct WorkerPool {
    engine: Arc<Engine>,
    permits: Arc<Semaphore>,
    keys: Arc<Mutex<HashMap<RunKey, KeyState>>>,
}

impl WorkerPool {
    /// Create a pool allowing `max_concurrent_runs` runs at once
    pub fn new(engine: Arc<Engine>, max_concurrent_runs: usize) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
            keys: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue a submission, superseding any earlier one for the same key
    pub fn submit(&self, request: ExecutionRequest) -> JoinHandle<ExecutionOutcome> {
        let key = request.key();
        let (generation, token, lock) = {
            let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
            let state = keys.entry(key).or_default();
            state.token.cancel();
            state.generation += 1;
            state.token = CancellationToken::new();
            state.pending += 1;
            (state.generation, state.token.clone(), state.lock.clone())
        };

        tracing::debug!(
            task_id = key.task_id,
            user_id = key.user_id,
            exercise_id = ?key.exercise_id,
            generation,
            "Submission queued"
        );

        let engine = self.engine.clone();
        let permits = self.permits.clone();
        let keys = self.keys.clone();

        tokio::spawn(async move {
            let outcome = {
                let _guard = lock.lock().await;
                if token.is_cancelled() {
                    tracing::info!(
                        task_id = key.task_id,
                        user_id = key.user_id,
                        "Submission superseded before start"
                    );
                    ExecutionOutcome::failed(messages::SUPERSEDED, "CANCELLED")
                } else {
                    match permits.acquire_owned().await {
                        Ok(_permit) => engine.execute_with_cancel(request, token).await,
                        Err(_) => ExecutionOutcome::failed(messages::TESTING_FAILED, "POOL_CLOSED"),
                    }
                }
            };

            let mut keys = keys.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(state) = keys.get_mut(&key) {
                state.pending -= 1;
                if state.pending == 0 {
                    keys.remove(&key);
                }
            }

            outcome
        })
    }

    /// Number of keys with queued or running submissions
    pub fn active_keys(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Stop accepting new work; queued runs finish with a failed outcome
    pub fn close(&self) {
        self.permits.close();
    }
}
