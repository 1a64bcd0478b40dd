//! Python language strategy

use std::path::Path;

use super::{CommandSpec, ExecutorStrategy};
use crate::models::Language;

/// Runs `unittest` discovery over the submission directory
#[derive(Debug, Clone)]
pub struct PythonStrategy {
    interpreter: String,
}

impl PythonStrategy {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl ExecutorStrategy for PythonStrategy {
    fn language(&self) -> Language {
        Language::Python
    }

    fn build_command(&self, dir: &Path) -> CommandSpec {
        // Verbose mode prints one line per test case
        CommandSpec::new(&self.interpreter)
            .arg("-m")
            .arg("unittest")
            .arg("discover")
            .arg("-v")
            .arg("-s")
            .arg(dir)
    }
}
