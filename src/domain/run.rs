//! Run state and its reconstruction from events.
//!
//! A Run represents a single execution of the build pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{Event, EventType, StepStatus};

/// A single execution of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Name of the pipeline being executed
    pub pipeline_name: String,

    /// Current state of the run
    pub state: RunState,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (if applicable)
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of steps that have finished without aborting the run
    pub current_step: usize,

    /// Status of each step (step_name -> status)
    pub step_statuses: HashMap<String, StepStatus>,

    /// Ordered transcript of everything that happened
    pub events: Vec<Event>,
}

impl Run {
    /// Create a new run for a pipeline
    pub fn new(id: Uuid, pipeline_name: String) -> Self {
        Self {
            id,
            pipeline_name,
            state: RunState::Running,
            started_at: Utc::now(),
            completed_at: None,
            current_step: 0,
            step_statuses: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Apply an event and append it to the transcript
    pub fn record(&mut self, event: Event) {
        self.apply_event(&event);
        self.events.push(event);
    }

    /// Apply a single event to update run state
    pub fn apply_event(&mut self, event: &Event) {
        match event.event_type {
            EventType::RunStarted => {
                self.state = RunState::Running;
                self.started_at = event.timestamp;
            }
            EventType::RunCompleted => {
                self.state = RunState::Completed;
                self.completed_at = Some(event.timestamp);
            }
            EventType::RunFailed => {
                self.state = RunState::Failed {
                    step: event.step_id.clone().unwrap_or_default(),
                    exit_code: event.exit_code.unwrap_or(1),
                    error: event.error.clone().unwrap_or_default(),
                };
                self.completed_at = Some(event.timestamp);
            }
            EventType::StepStarted => {
                if let Some(ref step_id) = event.step_id {
                    self.step_statuses
                        .insert(step_id.clone(), StepStatus::Running);
                }
            }
            EventType::StepCompleted => {
                if let Some(ref step_id) = event.step_id {
                    self.step_statuses
                        .insert(step_id.clone(), StepStatus::Completed);
                    self.current_step += 1;
                }
            }
            EventType::StepTolerated => {
                if let Some(ref step_id) = event.step_id {
                    self.step_statuses
                        .insert(step_id.clone(), StepStatus::Tolerated);
                    self.current_step += 1;
                }
            }
            EventType::StepFailed => {
                if let Some(ref step_id) = event.step_id {
                    self.step_statuses
                        .insert(step_id.clone(), StepStatus::Failed);
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, RunState::Completed)
    }

    /// Process exit code for this run: the failing step's code, otherwise 0
    pub fn exit_code(&self) -> i32 {
        match self.state {
            RunState::Failed { exit_code, .. } => exit_code,
            _ => 0,
        }
    }

    /// Names of the steps that were launched, in launch order
    pub fn executed_steps(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.event_type == EventType::StepStarted)
            .filter_map(|e| e.step_id.as_deref())
            .collect()
    }

    pub fn step_status(&self, step_name: &str) -> StepStatus {
        self.step_statuses
            .get(step_name)
            .copied()
            .unwrap_or_default()
    }
}

/// State of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunState {
    /// Currently executing
    Running,

    /// Every fatal step succeeded
    Completed,

    /// A fatal step failed; nothing after it ran
    Failed {
        step: String,
        exit_code: i32,
        error: String,
    },
}

impl Default for RunState {
    fn default() -> Self {
        Self::Running
    }
}
