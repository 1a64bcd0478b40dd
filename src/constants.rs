//! Application-wide constants
//!
//! This module contains all constant values used throughout the engine.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// STORAGE DEFAULTS
// =============================================================================

/// Default root directory holding one subdirectory per exercise
pub const DEFAULT_EXERCISES_PATH: &str = "/data/exercises";

/// Default root directory holding one subdirectory per test (kolokwium)
pub const DEFAULT_TESTS_PATH: &str = "/data/tests";

/// Default root directory holding per-task submission directories
pub const DEFAULT_SOLUTIONS_PATH: &str = "/data/solutions";

// =============================================================================
// EXECUTION DEFAULTS
// =============================================================================

/// Default time limit for one submission run in seconds
pub const DEFAULT_EXECUTION_TIMEOUT_SECONDS: u64 = 30;

/// Maximum time limit a caller may request in seconds
pub const MAX_EXECUTION_TIMEOUT_SECONDS: u64 = 300;

/// Default number of runs allowed to execute at the same time
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 4;

/// Default maximum size of a submitted solution in bytes (1 MB)
pub const DEFAULT_MAX_SOURCE_SIZE_BYTES: usize = 1024 * 1024;

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

// =============================================================================
// FILESYSTEM LAYOUT
// =============================================================================

/// Stem of the canonical solution artifact (`Solution<ext>`)
pub const SOLUTION_FILE_STEM: &str = "Solution";

/// Name of the artifact holding the runner's stdout followed by stderr
pub const RESULT_FILE_NAME: &str = "result.txt";

/// Stem of the fixture compiled languages use as their test entry point
pub const TEST_ENTRY_STEM: &str = "tests";

/// Name of the test binary produced by compiled languages
pub const TEST_BINARY_NAME: &str = "unit_tests";

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Default interpreter/compiler binaries
pub mod toolchains {
    pub const PYTHON: &str = "python3";
    pub const CXX: &str = "g++";
    pub const RUSTC: &str = "rustc";
}

/// File extensions for each language (with the leading dot)
pub mod file_extensions {
    pub const PYTHON: &str = ".py";
    pub const CPP: &str = ".cpp";
    pub const RUST: &str = ".rs";
}

// =============================================================================
// GRADING
// =============================================================================

/// Rate given to a freshly created solution (failing grade)
pub const DEFAULT_RATE: f64 = 2.0;

/// Lowest rate an instructor can give
pub const MIN_RATE: f64 = 2.0;

/// Highest rate an instructor can give
pub const MAX_RATE: f64 = 5.0;

// =============================================================================
// USER-FACING MESSAGES
// =============================================================================

pub mod messages {
    pub const TESTING_COMPLETED: &str = "Testing completed";
    pub const TESTING_FAILED: &str = "Could not test the solution";
    pub const RESULTS_UNAVAILABLE: &str = "Could not read test results";
    pub const NOT_CONFIGURED: &str = "Solution was not configured";
    pub const TIMED_OUT: &str = "Testing exceeded the time limit";
    pub const SUPERSEDED: &str = "Testing was superseded by a newer submission";
}
