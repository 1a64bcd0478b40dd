//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::Path;

use taskjudge::{
    Config, Engine,
    engine::{CommandSpec, ExecutorRegistry, ExecutorStrategy},
    models::{Exercise, Language, SubmissionMode, SubmissionPayload, Task, TaskTarget, Test, User},
};

/// Strategy running a fixed shell script in the submission directory
#[derive(Debug, Clone)]
pub struct ShellStrategy {
    pub language: Language,
    pub compile: Option<String>,
    pub script: String,
}

impl ShellStrategy {
    pub fn new(language: Language, script: &str) -> Self {
        Self {
            language,
            compile: None,
            script: script.to_string(),
        }
    }

    pub fn with_compile(mut self, script: &str) -> Self {
        self.compile = Some(script.to_string());
        self
    }
}

impl ExecutorStrategy for ShellStrategy {
    fn language(&self) -> Language {
        self.language
    }

    fn build_command(&self, _dir: &Path) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(&self.script)
    }

    fn compile_command(&self, _dir: &Path) -> Option<CommandSpec> {
        self.compile
            .as_ref()
            .map(|script| CommandSpec::new("sh").arg("-c").arg(script))
    }
}

pub fn engine_with(config: &Config, strategies: Vec<ShellStrategy>) -> Engine {
    let mut registry = ExecutorRegistry::default();
    for strategy in strategies {
        registry.register(strategy);
    }
    Engine::with_registry(config, registry)
}

pub fn exercise(id: i64, language: Language) -> Exercise {
    Exercise {
        id,
        author_id: Some(1),
        title: format!("Exercise {}", id),
        language,
        level: None,
        content: String::new(),
    }
}

pub fn task(id: i64, target: TaskTarget, mode: SubmissionMode) -> Task {
    Task {
        id,
        author_id: Some(1),
        title: Some(format!("Task {}", id)),
        target,
        group_ids: vec![3],
        submission_mode: mode,
        is_active: true,
        is_rated: false,
    }
}

pub fn test_of(id: i64, exercise_ids: &[i64]) -> Test {
    Test {
        id,
        author_id: Some(1),
        name: format!("Test {}", id),
        exercise_ids: exercise_ids.to_vec(),
    }
}

pub fn student(id: i64) -> User {
    User {
        id,
        username: format!("student{}", id),
        group_ids: vec![3],
    }
}

pub fn editor(text: &str) -> SubmissionPayload {
    SubmissionPayload::Editor {
        text: text.to_string(),
    }
}

pub fn write_fixture(root: &Path, name: &str, content: &str) {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join(name), content).unwrap();
}
