//! Core orchestration logic.
//!
//! This module contains:
//! - Pipeline: Step definitions and the standard Python build
//! - Outcome: Test runner exit status interpretation
//! - Orchestrator: The sequential runner loop

pub mod orchestrator;
pub mod outcome;
pub mod pipeline;

// Re-export commonly used types
pub use orchestrator::{Orchestrator, SUCCESS_MESSAGE};
pub use outcome::TestOutcome;
pub use pipeline::{FailurePolicy, Pipeline, Step, StepKind, DEFAULT_UV, SOURCE_DIR, TESTS_DIR};
