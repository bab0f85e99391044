//! Interpreting the test runner's exit status.

use serde::{Deserialize, Serialize};

/// pytest: no tests were collected
pub const PYTEST_NO_TESTS_COLLECTED: i32 = 5;

/// pytest: command line usage error (e.g. the test path does not exist)
pub const PYTEST_USAGE_ERROR: i32 = 4;

/// What a finished test step amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TestOutcome {
    Passed,
    NoTestsFound,
    Failed { exit_code: i32 },
}

impl TestOutcome {
    /// Classify a test runner exit code.
    ///
    /// `target_exists` tells whether the tests directory is present; a usage
    /// error against a missing directory counts as "no tests", not a failure.
    pub fn classify(exit_code: i32, target_exists: bool) -> Self {
        match exit_code {
            0 => Self::Passed,
            PYTEST_NO_TESTS_COLLECTED => Self::NoTestsFound,
            PYTEST_USAGE_ERROR if !target_exists => Self::NoTestsFound,
            code => Self::Failed { exit_code: code },
        }
    }

    /// Informational line printed for this outcome
    pub fn message(&self, tests_dir: &str) -> String {
        match self {
            Self::Passed => "Tests passed".to_string(),
            Self::NoTestsFound => format!("No tests found in {}/, skipping", tests_dir),
            Self::Failed { exit_code } => {
                format!("Tests failed (exit code {}), continuing", exit_code)
            }
        }
    }
}
