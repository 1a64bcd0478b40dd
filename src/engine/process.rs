//! Child process execution for one submission run
//!
//! Every step is spawned from an argument vector with the submission
//! directory as its working directory. No shell is involved, so uploaded
//! file names and paths are never interpreted.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::fs;
use tokio::process::Command;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::languages::{CommandSpec, ExecutorStrategy};
use crate::error::ExecutionError;

/// Steps needed to test one staged submission
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub compile: Option<CommandSpec>,
    pub run: CommandSpec,
}

impl ExecutionPlan {
    /// Build the plan a strategy prescribes for `dir`
    pub fn for_strategy(strategy: &dyn ExecutorStrategy, dir: &Path) -> Self {
        Self {
            compile: strategy.compile_command(dir),
            run: strategy.build_command(dir),
        }
    }
}

/// Step a plan stopped at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Run,
}

/// What the executed steps reported
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Last step that ran
    pub stage: Stage,
    /// Exit code of the last step; `None` when killed by a signal
    pub exit_code: Option<i32>,
    /// Last step exited with status 0
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ProcessOutcome {
    /// Test run completed and every test passed
    pub fn tests_passed(&self) -> bool {
        self.stage == Stage::Run && self.success
    }
}

/// Runs execution plans under a shared deadline
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Create a runner whose plans must finish within `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run the plan in `dir` and write the captured output to `artifact`
    ///
    /// The artifact receives stdout then stderr of each executed step. A
    /// failing build step ends the plan; its output is still written.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        dir: &Path,
        artifact: &Path,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, ExecutionError> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut transcript = Vec::new();
        let mut stdout = String::new();
        let mut stderr = String::new();

        let steps = plan
            .compile
            .iter()
            .map(|cmd| (Stage::Compile, cmd))
            .chain(std::iter::once((Stage::Run, &plan.run)));

        let mut last = None;
        for (stage, command) in steps {
            tracing::debug!(?stage, command = %command, "Starting step");
            let output = self.run_step(command, dir, deadline, cancel).await?;

            transcript.extend_from_slice(&output.stdout);
            transcript.extend_from_slice(&output.stderr);
            stdout.push_str(&String::from_utf8_lossy(&output.stdout));
            stderr.push_str(&String::from_utf8_lossy(&output.stderr));

            let success = output.status.success();
            last = Some((stage, output.status.code(), success));
            if !success {
                if stage == Stage::Compile {
                    tracing::warn!(exit_code = ?output.status.code(), "Build step failed");
                }
                break;
            }
        }

        fs::write(artifact, &transcript)
            .await
            .map_err(|source| ExecutionError::Artifact {
                path: artifact.to_path_buf(),
                source,
            })?;

        let (stage, exit_code, success) = last.unwrap_or((Stage::Run, None, false));
        let elapsed = started.elapsed();

        tracing::info!(
            ?stage,
            exit_code = ?exit_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "Process finished"
        );

        Ok(ProcessOutcome {
            stage,
            exit_code,
            success,
            stdout,
            stderr,
            elapsed,
        })
    }

    async fn run_step(
        &self,
        command: &CommandSpec,
        dir: &Path,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<Output, ExecutionError> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::SpawnFailed {
                program: command.program.clone(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it
        tokio::select! {
            output = child.wait_with_output() => output.map_err(ExecutionError::Wait),
            _ = tokio::time::sleep_until(deadline) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Execution timed out");
                Err(ExecutionError::Timeout(self.timeout))
            }
            _ = cancel.cancelled() => {
                tracing::info!("Execution cancelled");
                Err(ExecutionError::Cancelled)
            }
        }
    }
}
