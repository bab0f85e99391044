//! pybuild - sequential build runner for uv-managed Python projects
//!
//! Runs a fixed pipeline against a project directory:
//!
//! 1. `uv sync`
//! 2. `uv run ruff format`
//! 3. `uv run ruff check src --fix`
//! 4. `uv run ruff format src`
//! 5. `uv run pytest tests`
//!
//! The first four steps abort the run on a non-zero exit and the process
//! exits with that step's code. The test step is best effort: failures and
//! empty test suites are reported and the build still succeeds.
//!
//! # Modules
//!
//! - `adapters`: Command execution (subprocess runner)
//! - `core`: Pipeline definition and the runner loop
//! - `domain`: Run record and its event transcript
//! - `config`: Project directory and tool resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Build the project in the current directory
//! pybuild
//!
//! # Show what would run
//! pybuild plan --format yaml
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{CommandRunner, ProcessRunner, RunnerError, StepOutput};
pub use config::ResolvedConfig;
pub use crate::core::{FailurePolicy, Orchestrator, Pipeline, Step, TestOutcome};
pub use domain::{Event, EventType, Run, RunState, StepStatus};
