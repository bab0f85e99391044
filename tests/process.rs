//! Subprocess Runner Tests
//!
//! Runs real commands through `ProcessRunner` via `/bin/sh -c`.

#![cfg(unix)]

use pybuild::adapters::{CommandRunner, ProcessRunner, RunnerError};
use pybuild::core::{FailurePolicy, Orchestrator, Pipeline, Step, StepKind};
use pybuild::domain::RunState;
use tempfile::TempDir;

fn shell_step(name: &str, script: &str) -> Step {
    Step::new(name, StepKind::Format, name, "/bin/sh", &["-c", script])
}

#[tokio::test]
async fn test_exit_codes_are_reported() {
    let temp = TempDir::new().unwrap();
    let runner = ProcessRunner::new();

    let ok = runner.run(&shell_step("ok", "exit 0"), temp.path()).await.unwrap();
    assert!(ok.success());

    let failed = runner.run(&shell_step("bad", "exit 3"), temp.path()).await.unwrap();
    assert_eq!(failed.exit_code, 3);
}

#[tokio::test]
async fn test_signal_death_maps_to_128_plus_signal() {
    let temp = TempDir::new().unwrap();
    let output = ProcessRunner::new()
        .run(&shell_step("killed", "kill -9 $$"), temp.path())
        .await
        .unwrap();

    assert_eq!(output.exit_code, 137);
}

#[tokio::test]
async fn test_runs_in_project_directory() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("pyproject.toml"), "").unwrap();

    let output = ProcessRunner::new()
        .run(&shell_step("cwd", "test -f pyproject.toml"), temp.path())
        .await
        .unwrap();

    assert!(output.success());
}

#[tokio::test]
async fn test_missing_binary_is_spawn_error() {
    let temp = TempDir::new().unwrap();
    let step = Step::new(
        "sync",
        StepKind::Sync,
        "Syncing",
        "pybuild-definitely-not-installed",
        &["sync"],
    );

    let err = ProcessRunner::new().run(&step, temp.path()).await.unwrap_err();
    assert!(matches!(err, RunnerError::Spawn { .. }));
    assert_eq!(err.exit_code(), 127);
}

#[tokio::test]
async fn test_abort_leaves_later_steps_untouched() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("ran-after-failure");

    let pipeline = Pipeline {
        name: "shell".to_string(),
        description: "Shell steps".to_string(),
        steps: vec![
            shell_step("first", "exit 7"),
            shell_step("second", "touch ran-after-failure"),
        ],
    };

    let mut out = Vec::new();
    let run = Orchestrator::new(temp.path())
        .run_pipeline(&pipeline, &mut out)
        .await
        .unwrap();

    assert_eq!(run.exit_code(), 7);
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_best_effort_step_keeps_going() {
    let temp = TempDir::new().unwrap();

    let pipeline = Pipeline {
        name: "shell".to_string(),
        description: "Shell steps".to_string(),
        steps: vec![
            shell_step("flaky", "exit 1").on_failure(FailurePolicy::Continue),
            shell_step("after", "touch done"),
        ],
    };

    let mut out = Vec::new();
    let run = Orchestrator::new(temp.path())
        .run_pipeline(&pipeline, &mut out)
        .await
        .unwrap();

    assert_eq!(run.state, RunState::Completed);
    assert!(temp.path().join("done").exists());
    assert!(String::from_utf8(out)
        .unwrap()
        .contains("Step 'flaky' failed (exit code 1), continuing"));
}
