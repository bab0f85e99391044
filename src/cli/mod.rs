//! Command-line interface for pybuild.
//!
//! Running `pybuild` with no arguments executes the build pipeline in the
//! current directory. The subcommands only add ways to inspect it.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::ProcessRunner;
use crate::config::{ResolvedConfig, ENV_PROJECT_DIR, ENV_UV};
use crate::core::{Orchestrator, DEFAULT_UV};
use crate::domain::RunState;

/// pybuild - sync, lint, format and test a uv-managed Python project
#[derive(Parser, Debug)]
#[command(name = "pybuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true, env = ENV_PROJECT_DIR)]
    pub project_dir: Option<PathBuf>,

    /// Dependency manager binary used for every step
    #[arg(long, global = true, env = ENV_UV, default_value = DEFAULT_UV)]
    pub uv: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline (the default when no subcommand is given)
    Run {
        /// Print the run record as JSON on stdout (progress moves to stderr)
        #[arg(long)]
        json: bool,
    },

    /// Show the steps without running them
    Plan {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = PlanFormat::Text)]
        format: PlanFormat,
    },

    /// Show resolved configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Text,
    Json,
    Yaml,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<ExitCode> {
        let config = ResolvedConfig::resolve(self.project_dir.as_deref(), &self.uv)
            .context("Invalid configuration")?;

        match self.command.unwrap_or(Commands::Run { json: false }) {
            Commands::Run { json } => run_build(&config, json).await,
            Commands::Plan { format } => {
                show_plan(&config, format)?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Config => {
                show_config(&config);
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Run the build pipeline and map its outcome to a process exit code
async fn run_build(config: &ResolvedConfig, json: bool) -> Result<ExitCode> {
    let pipeline = config.pipeline();
    // Keep stdout parseable when the run record is requested
    let (runner, mut progress): (ProcessRunner, Box<dyn Write + Send>) = if json {
        (ProcessRunner::with_stdout_to_stderr(), Box::new(io::stderr()))
    } else {
        (ProcessRunner::new(), Box::new(io::stdout()))
    };
    let orchestrator = Orchestrator::with_runner(&config.project_dir, runner);
    let run = orchestrator.run_pipeline(&pipeline, &mut progress).await?;

    if json {
        let report = serde_json::to_string_pretty(&run).context("Failed to serialize run")?;
        println!("{}", report);
    }

    if let RunState::Failed {
        ref step,
        exit_code,
        ref error,
    } = run.state
    {
        eprintln!("\n[Build failed at step '{}' (exit code {}): {}]", step, exit_code, error);
    }

    Ok(ExitCode::from(exit_status_byte(run.exit_code())))
}

/// Print the pipeline's steps
fn show_plan(config: &ResolvedConfig, format: PlanFormat) -> Result<()> {
    let pipeline = config.pipeline();

    match format {
        PlanFormat::Json => println!("{}", pipeline.to_json()?),
        PlanFormat::Yaml => print!("{}", pipeline.to_yaml()?),
        PlanFormat::Text => {
            println!("Pipeline: {}", pipeline.name);
            println!("{}", pipeline.description);
            println!();
            for (i, step) in pipeline.steps.iter().enumerate() {
                println!(
                    "  {}. {:<10} {:<32} [{}]",
                    i + 1,
                    step.name,
                    step.command_line(),
                    step.on_failure
                );
            }
        }
    }

    Ok(())
}

fn show_config(config: &ResolvedConfig) {
    println!("Project:        {}", config.project_dir.display());
    println!(
        "pyproject.toml: {}",
        config
            .pyproject
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not found)".to_string())
    );
    println!("uv binary:      {}", config.uv);
}

/// Clamp an exit code into the byte a process can return
fn exit_status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
