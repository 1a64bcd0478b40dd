//! Result artifact parsing
//!
//! The artifact is treated as plain text. Every non-empty line is kept in
//! file order, whitespace included; the runner's own summary and trace
//! lines are the payload.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParsingError;

/// Counts of per-test verdict lines found in a run's output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub passed: u32,
    pub failed: u32,
    /// Skipped by unittest or ignored by libtest
    #[serde(default)]
    pub skipped: u32,
}

impl TestSummary {
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }
}

pub struct ResultParser;

impl ResultParser {
    /// Split artifact text into result lines, dropping empty ones
    pub fn parse(text: &str) -> Vec<String> {
        text.lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Read and parse the artifact at `path`
    pub async fn parse_file(path: &Path) -> Result<Vec<String>, ParsingError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ParsingError::ArtifactMissing {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Count `... ok` / `... FAIL` style lines
    ///
    /// Both `unittest -v` and the libtest harness print one such line per
    /// test case. A skip carries its reason (`skipped 'why'`), libtest
    /// prints `ignored`. Output in any other shape yields an empty summary.
    pub fn summarize(lines: &[String]) -> TestSummary {
        let mut summary = TestSummary::default();
        for line in lines {
            let Some((_, verdict)) = line.rsplit_once(" ... ") else {
                continue;
            };
            match verdict.trim() {
                "ok" => summary.passed += 1,
                "FAIL" | "FAILED" | "ERROR" => summary.failed += 1,
                v if v.starts_with("skipped") || v.starts_with("ignored") => summary.skipped += 1,
                _ => {}
            }
        }
        summary
    }
}
