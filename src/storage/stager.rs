//! Staging of submissions and unit-test fixtures
//!
//! The stager places exactly one canonical `Solution<ext>` into a
//! submission directory and then copies the exercise's fixtures next to
//! it. Uploaded filenames are only ever used for the extension check;
//! they never become part of a path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use walkdir::WalkDir;

use crate::{
    config::FixturePolicy,
    constants::RESULT_FILE_NAME,
    error::{EngineResult, StagingError, ValidationError},
    models::{Language, SubmissionPayload},
};

use super::paths::{solution_file, solution_file_name};

/// A directory fixtures are copied from
#[derive(Debug, Clone)]
pub struct FixtureSource {
    pub root: PathBuf,
    /// A missing required root is a fixture failure; optional roots are skipped
    pub required: bool,
}

impl FixtureSource {
    pub fn required(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            required: true,
        }
    }

    pub fn optional(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            required: false,
        }
    }
}

/// Summary of one fixture copy pass
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureReport {
    /// File names copied into the submission directory
    pub copied: Vec<String>,
    /// Files that could not be read or copied, with the reason
    pub failures: Vec<(PathBuf, String)>,
    /// Required roots that did not exist
    pub missing_roots: Vec<PathBuf>,
}

impl FixtureReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.missing_roots.is_empty()
    }
}

/// Writes submissions and copies fixtures into submission directories
#[derive(Debug, Clone)]
pub struct FixtureStager {
    policy: FixturePolicy,
    max_source_size: usize,
}

impl FixtureStager {
    /// Create a new stager
    pub fn new(policy: FixturePolicy, max_source_size: usize) -> Self {
        Self {
            policy,
            max_source_size,
        }
    }

    /// Check a payload without touching the filesystem
    pub fn validate(
        &self,
        payload: &SubmissionPayload,
        language: Language,
    ) -> Result<(), ValidationError> {
        if payload.is_empty() {
            return Err(ValidationError::MissingPayload);
        }
        if payload.len() > self.max_source_size {
            return Err(ValidationError::PayloadTooLarge {
                limit: self.max_source_size,
            });
        }
        if let SubmissionPayload::File { filename, .. } = payload {
            let expected = language.extension();
            if !filename.ends_with(expected) {
                return Err(ValidationError::InvalidExtension {
                    expected: expected.to_string(),
                    filename: filename.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validate the payload and write it as `Solution<ext>` in `dir`
    ///
    /// Any previous revision of the artifact is replaced. Nothing else in
    /// the directory is touched.
    pub async fn stage_solution(
        &self,
        payload: &SubmissionPayload,
        language: Language,
        dir: &Path,
    ) -> EngineResult<PathBuf> {
        self.validate(payload, language)?;

        fs::create_dir_all(dir).await.map_err(|source| StagingError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let target = solution_file(dir, language);

        if let SubmissionPayload::File { .. } = payload {
            match fs::remove_file(&target).await {
                Ok(()) => tracing::debug!(path = %target.display(), "Removed previous solution file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StagingError::Io {
                        path: target,
                        source,
                    }
                    .into());
                }
            }
        }

        fs::write(&target, payload.bytes())
            .await
            .map_err(|source| StagingError::Io {
                path: target.clone(),
                source,
            })?;

        tracing::info!(
            path = %target.display(),
            mode = %payload.mode(),
            size = payload.len(),
            "Staged solution"
        );

        Ok(target)
    }

    /// Copy every regular file under each source root into `dir`, flattened
    ///
    /// Files named like the canonical solution or the result artifact are
    /// skipped. Later sources win on name clashes. Under the lenient
    /// policy failures are logged and reported; under the strict policy
    /// they abort staging.
    pub async fn copy_fixtures(
        &self,
        sources: &[FixtureSource],
        language: Language,
        dir: &Path,
    ) -> Result<FixtureReport, StagingError> {
        let owned = sources.to_vec();
        let dir_owned = dir.to_path_buf();

        let report = tokio::task::spawn_blocking(move || {
            let mut report = FixtureReport::default();
            for source in &owned {
                copy_tree_flat(source, language, &dir_owned, &mut report);
            }
            report
        })
        .await
        .map_err(|e| StagingError::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

        for root in &report.missing_roots {
            tracing::warn!(root = %root.display(), "Fixture directory does not exist");
        }
        for (path, reason) in &report.failures {
            tracing::warn!(path = %path.display(), error = %reason, "Failed to copy fixture");
        }
        tracing::info!(
            copied = report.copied.len(),
            failed = report.failures.len(),
            "Fixtures staged"
        );

        if self.policy == FixturePolicy::Strict {
            if let Some(root) = report.missing_roots.first() {
                return Err(StagingError::FixtureRootMissing(root.clone()));
            }
            if let Some((failed, _)) = report.failures.first() {
                let root = sources
                    .iter()
                    .map(|s| s.root.clone())
                    .find(|root| failed.starts_with(root))
                    .unwrap_or_else(|| failed.clone());
                return Err(StagingError::Fixtures {
                    root,
                    failed: report.failures.len(),
                });
            }
        }

        Ok(report)
    }
}

fn copy_tree_flat(source: &FixtureSource, language: Language, dest: &Path, report: &mut FixtureReport) {
    if !source.root.is_dir() {
        if source.required {
            report.missing_roots.push(source.root.clone());
        }
        return;
    }

    let protected = solution_file_name(language);

    for entry in WalkDir::new(&source.root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source.root.clone());
                report.failures.push((path, e.to_string()));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name == protected || name == RESULT_FILE_NAME {
            tracing::debug!(fixture = %name, "Skipping fixture that shadows a staged artifact");
            continue;
        }

        match std::fs::copy(entry.path(), dest.join(&name)) {
            Ok(_) => {
                if !report.copied.contains(&name) {
                    report.copied.push(name);
                }
            }
            Err(e) => report.failures.push((entry.path().to_path_buf(), e.to_string())),
        }
    }
}

/// Read back the staged solution source, if one exists
pub async fn read_staged_solution(dir: &Path, language: Language) -> EngineResult<Option<String>> {
    let path = solution_file(dir, language);
    match fs::read(&path).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StagingError::Io { path, source }.into()),
    }
}
