//! Runner loop for pipeline execution.
//!
//! Launches each step in order, records what happened, and stops at the
//! first failing step whose policy is [`FailurePolicy::Abort`].

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{CommandRunner, ProcessRunner};
use crate::domain::{Event, EventType, Run, StepStatus};

use super::outcome::TestOutcome;
use super::pipeline::{FailurePolicy, Pipeline, Step, StepKind};

/// Final line printed when every fatal step succeeded
pub const SUCCESS_MESSAGE: &str = "Build completed successfully";

/// Main pipeline orchestrator
pub struct Orchestrator<R = ProcessRunner> {
    /// Executes step commands
    runner: R,

    /// Working directory for every step
    project_dir: PathBuf,
}

impl Orchestrator<ProcessRunner> {
    /// Create an orchestrator that spawns real processes
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self::with_runner(project_dir, ProcessRunner::new())
    }
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn with_runner(project_dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            runner,
            project_dir: project_dir.into(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Execute a pipeline, writing progress lines to `out`.
    ///
    /// A failing fatal step does not produce an `Err`: the returned run is in
    /// the `Failed` state and carries the exit code. `Err` is reserved for an
    /// invalid pipeline or a broken progress writer.
    #[instrument(skip(self, pipeline, out), fields(pipeline = %pipeline.name))]
    pub async fn run_pipeline<W>(&self, pipeline: &Pipeline, out: &mut W) -> Result<Run>
    where
        W: Write + Send,
    {
        pipeline.validate()?;

        let run_id = Uuid::new_v4();
        info!(%run_id, project = %self.project_dir.display(), runner = self.runner.name(), "Starting pipeline execution");

        let mut run = Run::new(run_id, pipeline.name.clone());
        run.record(Event::new(
            run_id,
            None,
            EventType::RunStarted,
            format!("Pipeline '{}' started", pipeline.name),
            StepStatus::Running,
        ));

        for step in &pipeline.steps {
            writeln!(out, "==> {} ({})", step.description, step.command_line())
                .context("Failed to write progress output")?;

            run.record(Event::new(
                run_id,
                Some(step.name.clone()),
                EventType::StepStarted,
                step.command_line(),
                StepStatus::Running,
            ));

            match self.runner.run(step, &self.project_dir).await {
                Ok(output) if output.success() => {
                    debug!(step = %step.name, duration_ms = output.duration_ms, "Step completed");
                    let mut completed = Event::new(
                        run_id,
                        Some(step.name.clone()),
                        EventType::StepCompleted,
                        format!("Step '{}' completed in {}ms", step.name, output.duration_ms),
                        StepStatus::Completed,
                    )
                    .with_duration(output.duration_ms)
                    .with_exit_code(output.exit_code);

                    if let Some((outcome, target)) = self.test_outcome(step, output.exit_code) {
                        writeln!(out, "{}", outcome.message(target))
                            .context("Failed to write progress output")?;
                        completed = completed.with_test_outcome(outcome);
                    }
                    run.record(completed);
                }
                Ok(output) => match step.on_failure {
                    FailurePolicy::Abort => {
                        let reason = format!("exited with code {}", output.exit_code);
                        self.abort(&mut run, step, output.exit_code, reason, Some(output.duration_ms));
                        return Ok(run);
                    }
                    FailurePolicy::Continue => {
                        let message = self.tolerated_message(step, output.exit_code);
                        info!(step = %step.name, exit_code = output.exit_code, "{}", message);
                        writeln!(out, "{}", message).context("Failed to write progress output")?;

                        let mut tolerated = Event::new(
                            run_id,
                            Some(step.name.clone()),
                            EventType::StepTolerated,
                            message,
                            StepStatus::Tolerated,
                        )
                        .with_duration(output.duration_ms)
                        .with_exit_code(output.exit_code);
                        if let Some((outcome, _)) = self.test_outcome(step, output.exit_code) {
                            tolerated = tolerated.with_test_outcome(outcome);
                        }
                        run.record(tolerated);
                    }
                },
                Err(e) => {
                    let exit_code = e.exit_code();
                    match step.on_failure {
                        FailurePolicy::Abort => {
                            self.abort(&mut run, step, exit_code, e.to_string(), None);
                            return Ok(run);
                        }
                        FailurePolicy::Continue => {
                            warn!(step = %step.name, error = %e, "Step could not run, continuing");
                            writeln!(out, "{}, continuing", e)
                                .context("Failed to write progress output")?;

                            run.record(
                                Event::new(
                                    run_id,
                                    Some(step.name.clone()),
                                    EventType::StepTolerated,
                                    format!("Step '{}' could not run", step.name),
                                    StepStatus::Tolerated,
                                )
                                .with_exit_code(exit_code)
                                .with_error(e.to_string()),
                            );
                        }
                    }
                }
            }
        }

        writeln!(out, "{}", SUCCESS_MESSAGE).context("Failed to write progress output")?;
        info!(%run_id, "Run completed successfully");

        run.record(Event::new(
            run_id,
            None,
            EventType::RunCompleted,
            format!("Pipeline '{}' completed", pipeline.name),
            StepStatus::Completed,
        ));

        Ok(run)
    }

    /// Outcome of a test step, with the directory it collected from
    fn test_outcome<'a>(&self, step: &'a Step, exit_code: i32) -> Option<(TestOutcome, &'a str)> {
        match (step.kind, step.target.as_deref()) {
            (StepKind::Test, Some(target)) => {
                let target_exists = self.project_dir.join(target).is_dir();
                Some((TestOutcome::classify(exit_code, target_exists), target))
            }
            _ => None,
        }
    }

    /// Informational line for a best-effort step that exited non-zero
    fn tolerated_message(&self, step: &Step, exit_code: i32) -> String {
        match self.test_outcome(step, exit_code) {
            Some((outcome, target)) => outcome.message(target),
            None => format!(
                "Step '{}' failed (exit code {}), continuing",
                step.name, exit_code
            ),
        }
    }

    /// Mark the run failed at `step`
    fn abort(
        &self,
        run: &mut Run,
        step: &Step,
        exit_code: i32,
        reason: String,
        duration_ms: Option<u64>,
    ) {
        error!(step = %step.name, exit_code, %reason, "Step failed, aborting run");

        let mut failed = Event::new(
            run.id,
            Some(step.name.clone()),
            EventType::StepFailed,
            format!("Step '{}' failed", step.name),
            StepStatus::Failed,
        )
        .with_exit_code(exit_code)
        .with_error(reason.clone());
        if let Some(ms) = duration_ms {
            failed = failed.with_duration(ms);
        }
        run.record(failed);

        run.record(
            Event::new(
                run.id,
                Some(step.name.clone()),
                EventType::RunFailed,
                format!("Run failed at step '{}'", step.name),
                StepStatus::Failed,
            )
            .with_exit_code(exit_code)
            .with_error(format!("'{}' {}", step.command_line(), reason)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_creation() {
        let orchestrator = Orchestrator::new("/tmp/project");
        assert_eq!(orchestrator.runner().name(), "process");
        assert_eq!(orchestrator.project_dir(), Path::new("/tmp/project"));
    }

    #[test]
    fn test_tolerated_message_for_missing_tests_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(temp.path());
        let pipeline = Pipeline::standard("uv");
        let test_step = pipeline.get_step("test").unwrap();

        assert_eq!(
            orchestrator.tolerated_message(test_step, 4),
            "No tests found in tests/, skipping"
        );

        std::fs::create_dir(temp.path().join("tests")).unwrap();
        assert_eq!(
            orchestrator.tolerated_message(test_step, 4),
            "Tests failed (exit code 4), continuing"
        );
    }

    #[test]
    fn test_tolerated_message_for_generic_step() {
        let orchestrator = Orchestrator::new("/tmp/project");
        let step = Step::new("docs", StepKind::Format, "Docs", "mkdocs", &["build"])
            .on_failure(FailurePolicy::Continue);

        assert_eq!(
            orchestrator.tolerated_message(&step, 3),
            "Step 'docs' failed (exit code 3), continuing"
        );
    }
}
