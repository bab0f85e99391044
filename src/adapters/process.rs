//! Subprocess runner.
//!
//! Spawns each step with `tokio::process::Command`, inheriting the parent's
//! stdio so the tool's own output reaches the terminal unchanged.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{CommandRunner, RunnerError, StepOutput};
use crate::core::pipeline::Step;

/// Runs steps as real child processes
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner {
    /// Send the children's stdout to our stderr
    stdout_to_stderr: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner whose children write stdout to the parent's stderr, leaving
    /// stdout free for machine-readable output
    pub fn with_stdout_to_stderr() -> Self {
        Self {
            stdout_to_stderr: true,
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, step: &Step, cwd: &Path) -> Result<StepOutput, RunnerError> {
        debug!(step = %step.name, command = %step.command_line(), cwd = %cwd.display(), "Spawning");

        let started = Instant::now();
        let mut child = Command::new(&step.program)
            .args(&step.args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(if self.stdout_to_stderr {
                Stdio::from(std::io::stderr())
            } else {
                Stdio::inherit()
            })
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: step.program.clone(),
                source,
            })?;

        let status = child.wait().await.map_err(|source| RunnerError::Wait {
            program: step.program.clone(),
            source,
        })?;

        let duration_ms = started.elapsed().as_millis() as u64;
        Ok(StepOutput::new(exit_code_of(status), duration_ms))
    }
}

/// Exit code of a finished process, `128 + signal` if it was killed
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_name() {
        assert_eq!(ProcessRunner::new().name(), "process");
        assert!(!ProcessRunner::new().stdout_to_stderr);
        assert!(ProcessRunner::with_stdout_to_stderr().stdout_to_stderr);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_mapping() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait statuses: exit code lives in the high byte, signal in the low bits
        assert_eq!(exit_code_of(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code_of(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code_of(ExitStatus::from_raw(9)), 137);
    }
}
