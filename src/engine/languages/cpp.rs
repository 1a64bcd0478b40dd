//! C++ language strategy

use std::path::Path;

use super::{CommandSpec, ExecutorStrategy};
use crate::{
    constants::{TEST_BINARY_NAME, TEST_ENTRY_STEM, file_extensions},
    models::Language,
};

/// Compiles the `tests.cpp` fixture, which includes `Solution.cpp`, and runs it
#[derive(Debug, Clone)]
pub struct CppStrategy {
    compiler: String,
}

impl CppStrategy {
    pub fn new(compiler: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
        }
    }
}

impl ExecutorStrategy for CppStrategy {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn compile_command(&self, dir: &Path) -> Option<CommandSpec> {
        Some(
            CommandSpec::new(&self.compiler)
                .arg("-std=c++17")
                .arg("-O2")
                .arg("-o")
                .arg(dir.join(TEST_BINARY_NAME))
                .arg(dir.join(format!("{}{}", TEST_ENTRY_STEM, file_extensions::CPP))),
        )
    }

    fn build_command(&self, dir: &Path) -> CommandSpec {
        CommandSpec::new(dir.join(TEST_BINARY_NAME).to_string_lossy())
    }
}
