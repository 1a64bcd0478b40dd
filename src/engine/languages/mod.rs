//! Language-specific strategies for building and running unit tests
//!
//! Adding a language means adding a file here, a [`Language`] variant and
//! a registry entry. The orchestrator never branches on the language.

pub mod cpp;
pub mod python;
pub mod rust;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::{config::ExecutionConfig, error::ValidationError, models::Language};

/// A program and its arguments, run with the submission directory as cwd
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<Path>) -> Self {
        self.args
            .push(arg.as_ref().to_string_lossy().into_owned());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How one language builds and runs the unit tests in a staged directory
pub trait ExecutorStrategy: Send + Sync + fmt::Debug {
    /// Language this strategy handles
    fn language(&self) -> Language;

    /// Command that runs the unit tests and reports on stdout/stderr
    fn build_command(&self, dir: &Path) -> CommandSpec;

    /// Optional build step run before [`build_command`](Self::build_command)
    fn compile_command(&self, _dir: &Path) -> Option<CommandSpec> {
        None
    }
}

/// Maps every supported language to its strategy
#[derive(Debug, Clone, Default)]
pub struct ExecutorRegistry {
    strategies: HashMap<Language, Arc<dyn ExecutorStrategy>>,
}

impl ExecutorRegistry {
    /// Registry with the built-in strategies configured from `config`
    pub fn from_config(config: &ExecutionConfig) -> Self {
        let mut registry = Self::default();
        registry.register(python::PythonStrategy::new(&config.python_bin));
        registry.register(cpp::CppStrategy::new(&config.cxx_bin));
        registry.register(rust::RustStrategy::new(&config.rustc_bin));
        registry
    }

    /// Add or replace the strategy for its language
    pub fn register(&mut self, strategy: impl ExecutorStrategy + 'static) -> &mut Self {
        self.strategies.insert(strategy.language(), Arc::new(strategy));
        self
    }

    /// Get the strategy for a language
    pub fn for_language(&self, language: Language) -> Result<Arc<dyn ExecutorStrategy>, ValidationError> {
        self.strategies
            .get(&language)
            .cloned()
            .ok_or_else(|| ValidationError::UnsupportedLanguage(language.to_string()))
    }
}
