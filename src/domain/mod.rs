//! Domain types for a build run.
//!
//! - Events: Transcript entries for every state change
//! - Run: State of one pipeline execution

pub mod events;
pub mod run;

pub use events::{Event, EventType, StepStatus};
pub use run::{Run, RunState};
