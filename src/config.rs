//! Engine configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the engine runs.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EXECUTION_TIMEOUT_SECONDS, DEFAULT_EXERCISES_PATH, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_CONCURRENT_RUNS, DEFAULT_MAX_SOURCE_SIZE_BYTES, DEFAULT_SOLUTIONS_PATH,
    DEFAULT_TESTS_PATH, MAX_EXECUTION_TIMEOUT_SECONDS, toolchains,
};

/// Main engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

/// Filesystem roots the path resolver builds on
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub exercises_path: PathBuf,
    pub tests_path: PathBuf,
    pub solutions_path: PathBuf,
}

/// Test execution configuration
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Default time limit for one run
    pub timeout: Duration,
    /// Number of runs allowed to execute at the same time
    pub max_concurrent_runs: usize,
    /// What to do when fixture files cannot be staged
    pub fixture_policy: FixturePolicy,
    /// Maximum size of a submitted solution in bytes
    pub max_source_size_bytes: usize,
    pub python_bin: String,
    pub cxx_bin: String,
    pub rustc_bin: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub rust_log: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Policy applied when copying unit-test fixtures fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixturePolicy {
    /// Log the failure and run anyway; the runner reports that no tests were found
    #[default]
    Lenient,
    /// Abort the run before any process is spawned
    Strict,
}

impl FromStr for FixturePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidValue("FIXTURE_POLICY".to_string())),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            storage: StorageConfig::from_env(),
            execution: ExecutionConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Configuration rooted at a single directory, used by tests and local runs
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            storage: StorageConfig {
                exercises_path: root.join("exercises"),
                tests_path: root.join("tests"),
                solutions_path: root.join("solutions"),
            },
            execution: ExecutionConfig::default(),
            logging: LoggingConfig {
                rust_log: DEFAULT_LOG_FILTER.to_string(),
                json: false,
            },
        }
    }
}

impl StorageConfig {
    fn from_env() -> Self {
        Self {
            exercises_path: PathBuf::from(
                env::var("EXERCISES_PATH").unwrap_or_else(|_| DEFAULT_EXERCISES_PATH.to_string()),
            ),
            tests_path: PathBuf::from(
                env::var("TESTS_PATH").unwrap_or_else(|_| DEFAULT_TESTS_PATH.to_string()),
            ),
            solutions_path: PathBuf::from(
                env::var("SOLUTIONS_PATH").unwrap_or_else(|_| DEFAULT_SOLUTIONS_PATH.to_string()),
            ),
        }
    }
}

impl ExecutionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_seconds: u64 = env::var("EXECUTION_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| DEFAULT_EXECUTION_TIMEOUT_SECONDS.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("EXECUTION_TIMEOUT_SECONDS".to_string()))?;
        if timeout_seconds == 0 || timeout_seconds > MAX_EXECUTION_TIMEOUT_SECONDS {
            return Err(ConfigError::InvalidValue("EXECUTION_TIMEOUT_SECONDS".to_string()));
        }

        let max_concurrent_runs: usize = env::var("MAX_CONCURRENT_RUNS")
            .unwrap_or_else(|_| DEFAULT_MAX_CONCURRENT_RUNS.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("MAX_CONCURRENT_RUNS".to_string()))?;
        if max_concurrent_runs == 0 {
            return Err(ConfigError::InvalidValue("MAX_CONCURRENT_RUNS".to_string()));
        }

        Ok(Self {
            timeout: Duration::from_secs(timeout_seconds),
            max_concurrent_runs,
            fixture_policy: env::var("FIXTURE_POLICY")
                .map(|v| v.parse::<FixturePolicy>())
                .unwrap_or(Ok(FixturePolicy::default()))?,
            max_source_size_bytes: env::var("MAX_SOURCE_SIZE_BYTES")
                .unwrap_or_else(|_| DEFAULT_MAX_SOURCE_SIZE_BYTES.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MAX_SOURCE_SIZE_BYTES".to_string()))?,
            python_bin: env::var("PYTHON_BIN").unwrap_or_else(|_| toolchains::PYTHON.to_string()),
            cxx_bin: env::var("CXX_BIN").unwrap_or_else(|_| toolchains::CXX.to_string()),
            rustc_bin: env::var("RUSTC_BIN").unwrap_or_else(|_| toolchains::RUSTC.to_string()),
        })
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_EXECUTION_TIMEOUT_SECONDS),
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            fixture_policy: FixturePolicy::default(),
            max_source_size_bytes: DEFAULT_MAX_SOURCE_SIZE_BYTES,
            python_bin: toolchains::PYTHON.to_string(),
            cxx_bin: toolchains::CXX.to_string(),
            rustc_bin: toolchains::RUSTC.to_string(),
        }
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let json = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "text".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "text" => false,
            "json" => true,
            _ => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        };

        Ok(Self {
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            json,
        })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let execution = ExecutionConfig::default();
        assert_eq!(execution.timeout, Duration::from_secs(30));
        assert_eq!(execution.fixture_policy, FixturePolicy::Lenient);
        assert_eq!(execution.python_bin, "python3");
    }

    #[test]
    fn test_rooted_at_layout() {
        let config = Config::rooted_at("/srv/judge");
        assert_eq!(config.storage.exercises_path, PathBuf::from("/srv/judge/exercises"));
        assert_eq!(config.storage.tests_path, PathBuf::from("/srv/judge/tests"));
        assert_eq!(config.storage.solutions_path, PathBuf::from("/srv/judge/solutions"));
    }

    #[test]
    fn test_fixture_policy_parsing() {
        assert_eq!("strict".parse::<FixturePolicy>().unwrap(), FixturePolicy::Strict);
        assert_eq!("Lenient".parse::<FixturePolicy>().unwrap(), FixturePolicy::Lenient);
        assert!("sometimes".parse::<FixturePolicy>().is_err());
    }
}
