//! Event types recorded while a build runs.
//!
//! Every transition of a run is captured as an event in an in-memory,
//! append-only transcript. Nothing is written to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::outcome::TestOutcome;

/// A single entry in a run's transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// The run this event belongs to
    pub run_id: Uuid,

    /// Step name (if applicable)
    pub step_id: Option<String>,

    /// Type of event
    pub event_type: EventType,

    /// Human-readable summary
    pub payload_summary: String,

    /// Status of the step/run after this event
    pub status: StepStatus,

    /// Wall-clock time the step took
    pub duration_ms: Option<u64>,

    /// Exit code of the step's subprocess
    pub exit_code: Option<i32>,

    /// Error message if the step failed
    pub error: Option<String>,

    /// How the test runner's exit status was read (test steps only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_outcome: Option<TestOutcome>,
}

impl Event {
    /// Create a new event with the current timestamp
    pub fn new(
        run_id: Uuid,
        step_id: Option<String>,
        event_type: EventType,
        payload_summary: String,
        status: StepStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            run_id,
            step_id,
            event_type,
            payload_summary,
            status,
            duration_ms: None,
            exit_code: None,
            error: None,
            test_outcome: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_test_outcome(mut self, outcome: TestOutcome) -> Self {
        self.test_outcome = Some(outcome);
        self
    }
}

/// Types of events that can occur during a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The run has started
    RunStarted,

    /// Every fatal step succeeded
    RunCompleted,

    /// A fatal step failed and the run was aborted
    RunFailed,

    /// A step's command was launched
    StepStarted,

    /// A step's command exited with status 0
    StepCompleted,

    /// A fatal step failed
    StepFailed,

    /// A best-effort step failed (or found nothing to do) and the run went on
    StepTolerated,
}

/// Status of a step or run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet started
    Pending,

    /// Currently executing
    Running,

    /// Completed successfully
    Completed,

    /// Failed and aborted the run
    Failed,

    /// Failed without aborting the run
    Tolerated,
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = Event::new(
            Uuid::new_v4(),
            Some("sync".to_string()),
            EventType::StepStarted,
            "Syncing dependencies".to_string(),
            StepStatus::Running,
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"step_started\""));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type, EventType::StepStarted);
        assert_eq!(parsed.status, StepStatus::Running);
    }

    #[test]
    fn test_event_builders() {
        let event = Event::new(
            Uuid::new_v4(),
            Some("lint-fix".to_string()),
            EventType::StepFailed,
            "Step 'lint-fix' failed".to_string(),
            StepStatus::Failed,
        )
        .with_duration(1500)
        .with_exit_code(1)
        .with_error("exit code 1".to_string());

        assert_eq!(event.duration_ms, Some(1500));
        assert_eq!(event.exit_code, Some(1));
        assert_eq!(event.error, Some("exit code 1".to_string()));
        assert!(event.test_outcome.is_none());
    }

    #[test]
    fn test_event_records_test_outcome() {
        let event = Event::new(
            Uuid::new_v4(),
            Some("test".to_string()),
            EventType::StepTolerated,
            "No tests found in tests/, skipping".to_string(),
            StepStatus::Tolerated,
        )
        .with_test_outcome(TestOutcome::NoTestsFound);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["test_outcome"]["outcome"], "no_tests_found");

        let parsed: Event = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.test_outcome, Some(TestOutcome::NoTestsFound));
    }
}
