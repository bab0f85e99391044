//! Adapter interfaces for the external tools a pipeline drives.
//!
//! The orchestrator never spawns processes itself; it hands each step to a
//! [`CommandRunner`].

pub mod process;

use std::io;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::pipeline::Step;

pub use process::ProcessRunner;

/// Exit code a shell reports when a command cannot be found
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Exit code a shell reports when a command exists but cannot be executed
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Result of running one step's command to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutput {
    /// Exit code, with signal deaths mapped to `128 + signal`
    pub exit_code: i32,

    /// Wall-clock time the command took
    pub duration_ms: u64,
}

impl StepOutput {
    pub fn new(exit_code: i32, duration_ms: u64) -> Self {
        Self {
            exit_code,
            duration_ms,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Failure to run a command at all (as opposed to it exiting non-zero)
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl RunnerError {
    /// Exit code to report for this failure, following shell conventions
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => EXIT_COMMAND_NOT_FOUND,
                io::ErrorKind::PermissionDenied => EXIT_NOT_EXECUTABLE,
                _ => 1,
            },
            Self::Wait { .. } => 1,
        }
    }
}

/// Runs a step's command to completion in a working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Human-readable runner name
    fn name(&self) -> &str;

    /// Run the step and wait for it to exit
    async fn run(&self, step: &Step, cwd: &Path) -> Result<StepOutput, RunnerError>;
}
