//! Pipeline definitions.
//!
//! A pipeline is an ordered list of steps. Each step is one external command
//! plus a policy saying whether its failure aborts the run.

use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default name of the dependency manager binary
pub const DEFAULT_UV: &str = "uv";

/// Directory the linter and second formatter pass are scoped to
pub const SOURCE_DIR: &str = "src";

/// Directory the test runner collects from
pub const TESTS_DIR: &str = "tests";

/// A complete pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Ordered list of steps to execute
    pub steps: Vec<Step>,
}

impl Pipeline {
    /// The sync → format → lint-fix → format → test pipeline.
    ///
    /// Every tool goes through `uv` so the linter and test runner come from
    /// the environment the first step just synced.
    pub fn standard(uv: &str) -> Self {
        Self {
            name: "python-build".to_string(),
            description: "Sync dependencies, lint and format sources, run tests".to_string(),
            steps: vec![
                Step::new(
                    "sync",
                    StepKind::Sync,
                    "Syncing dependencies",
                    uv,
                    &["sync"],
                ),
                Step::new(
                    "format",
                    StepKind::Format,
                    "Formatting project",
                    uv,
                    &["run", "ruff", "format"],
                ),
                Step::new(
                    "lint-fix",
                    StepKind::LintFix,
                    "Fixing lint issues",
                    uv,
                    &["run", "ruff", "check", SOURCE_DIR, "--fix"],
                )
                .with_target(SOURCE_DIR),
                Step::new(
                    "reformat",
                    StepKind::Format,
                    "Re-formatting sources",
                    uv,
                    &["run", "ruff", "format", SOURCE_DIR],
                )
                .with_target(SOURCE_DIR),
                Step::new(
                    "test",
                    StepKind::Test,
                    "Running tests",
                    uv,
                    &["run", "pytest", TESTS_DIR],
                )
                .with_target(TESTS_DIR)
                .on_failure(FailurePolicy::Continue),
            ],
        }
    }

    /// Validate the pipeline definition
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Pipeline name cannot be empty");
        }

        if self.steps.is_empty() {
            anyhow::bail!("Pipeline must have at least one step");
        }

        let mut seen = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if step.name.is_empty() {
                anyhow::bail!("Step {} has an empty name", i);
            }
            if step.program.is_empty() {
                anyhow::bail!("Step '{}' has no program to run", step.name);
            }
            if !seen.insert(step.name.as_str()) {
                anyhow::bail!("Duplicate step name '{}'", step.name);
            }
        }

        Ok(())
    }

    /// Get a step by name
    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline as JSON")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize pipeline as YAML")
    }
}

/// A single command in a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step name (unique within pipeline)
    pub name: String,

    /// What the command does
    pub kind: StepKind,

    /// Progress text printed before the command runs
    pub description: String,

    /// Binary to execute
    pub program: String,

    /// Arguments passed to the binary
    pub args: Vec<String>,

    /// Project-relative directory the command operates on, if scoped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// What a non-zero exit means for the rest of the run
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Step {
    pub fn new(name: &str, kind: StepKind, description: &str, program: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            target: None,
            on_failure: FailurePolicy::Abort,
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.on_failure == FailurePolicy::Abort
    }

    /// The command as a shell would show it
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Category of tool a step invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Dependency manager sync
    Sync,

    /// Formatter pass
    Format,

    /// Linter with auto-fix
    LintFix,

    /// Test runner
    Test,
}

/// Whether a failing step stops the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop immediately and propagate the exit code
    Abort,

    /// Log and move on to the next step
    Continue,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Abort
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort on failure"),
            Self::Continue => write!(f, "continue on failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline_order() {
        let pipeline = Pipeline::standard(DEFAULT_UV);
        let names: Vec<&str> = pipeline.steps.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["sync", "format", "lint-fix", "reformat", "test"]);
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_standard_pipeline_commands() {
        let pipeline = Pipeline::standard(DEFAULT_UV);
        let lines: Vec<String> = pipeline.steps.iter().map(Step::command_line).collect();

        assert_eq!(
            lines,
            vec![
                "uv sync",
                "uv run ruff format",
                "uv run ruff check src --fix",
                "uv run ruff format src",
                "uv run pytest tests",
            ]
        );
    }

    #[test]
    fn test_only_test_step_is_best_effort() {
        let pipeline = Pipeline::standard(DEFAULT_UV);

        for step in &pipeline.steps {
            if step.kind == StepKind::Test {
                assert_eq!(step.on_failure, FailurePolicy::Continue);
            } else {
                assert!(step.is_fatal(), "step '{}' should be fatal", step.name);
            }
        }
    }

    #[test]
    fn test_custom_uv_binary() {
        let pipeline = Pipeline::standard("/opt/uv/bin/uv");
        assert!(pipeline.steps.iter().all(|s| s.program == "/opt/uv/bin/uv"));
        assert_eq!(
            pipeline.get_step("test").unwrap().target.as_deref(),
            Some(TESTS_DIR)
        );
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let mut pipeline = Pipeline::standard(DEFAULT_UV);
        pipeline.steps[1].name = "sync".to_string();

        let err = pipeline.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate step name 'sync'"));
    }

    #[test]
    fn test_validation_rejects_empty() {
        let mut pipeline = Pipeline::standard(DEFAULT_UV);
        pipeline.steps.clear();
        assert!(pipeline.validate().is_err());

        let mut pipeline = Pipeline::standard(DEFAULT_UV);
        pipeline.steps[0].program.clear();
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_yaml_plan_output() {
        let yaml = Pipeline::standard(DEFAULT_UV).to_yaml().unwrap();

        assert!(yaml.contains("name: python-build"));
        assert!(yaml.contains("on_failure: continue"));
        assert!(yaml.contains("kind: lint_fix"));
    }
}
