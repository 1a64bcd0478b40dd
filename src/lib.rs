//! TaskJudge - Solution Execution Engine
//!
//! This library tests student solutions for programming tasks. A task
//! assigns one exercise, or a test bundling several exercises, to groups
//! of students. Each submission is staged next to the exercise's unit-test
//! fixtures, run with the language's test runner and its output captured.
//!
//! # Features
//!
//! - Python, C++ and Rust test runners behind one strategy trait
//! - Deterministic on-disk layout keyed by primary keys
//! - Timeout-bounded, cancellable runs in a bounded worker pool
//! - One run at a time per (task, user); newer submissions supersede
//!
//! # Architecture
//!
//! - **Storage**: path resolution and staging
//! - **Engine**: strategies, process runner, parser, sessions, pool
//! - **Services**: grading on top of engine outcomes
//! - **Repositories**: solution persistence
//! - **Models**: domain models

pub mod config;
pub mod constants;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Engine, ExecutionOutcome, ExecutionRequest, WorkerPool};
pub use error::{EngineError, EngineResult};
