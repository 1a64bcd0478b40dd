//! Rust language strategy

use std::path::Path;

use super::{CommandSpec, ExecutorStrategy};
use crate::{
    constants::{TEST_BINARY_NAME, TEST_ENTRY_STEM, file_extensions},
    models::Language,
};

/// Builds the `tests.rs` fixture with the libtest harness and runs it
#[derive(Debug, Clone)]
pub struct RustStrategy {
    rustc: String,
}

impl RustStrategy {
    pub fn new(rustc: impl Into<String>) -> Self {
        Self {
            rustc: rustc.into(),
        }
    }
}

impl ExecutorStrategy for RustStrategy {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn compile_command(&self, dir: &Path) -> Option<CommandSpec> {
        Some(
            CommandSpec::new(&self.rustc)
                .arg("--edition")
                .arg("2021")
                .arg("--test")
                .arg("-o")
                .arg(dir.join(TEST_BINARY_NAME))
                .arg(dir.join(format!("{}{}", TEST_ENTRY_STEM, file_extensions::RUST))),
        )
    }

    fn build_command(&self, dir: &Path) -> CommandSpec {
        CommandSpec::new(dir.join(TEST_BINARY_NAME).to_string_lossy())
    }
}
