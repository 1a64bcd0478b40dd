//! Solution execution engine
//!
//! Stages a submission next to its unit-test fixtures, runs the language's
//! test command and parses the captured output.

pub mod languages;
pub mod orchestrator;
pub mod parser;
pub mod pool;
pub mod process;
pub mod session;

pub use languages::{CommandSpec, ExecutorRegistry, ExecutorStrategy};
pub use orchestrator::{Engine, ExecutionOutcome, ExecutionRequest, RunKey};
pub use parser::{ResultParser, TestSummary};
pub use pool::WorkerPool;
pub use process::{ExecutionPlan, ProcessOutcome, ProcessRunner, Stage};
pub use session::{RunReport, RunState, SubmissionSession};
