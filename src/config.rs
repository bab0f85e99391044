//! Configuration for a pybuild invocation.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (--project-dir, --uv)
//! 2. Environment variables (PYBUILD_PROJECT_DIR, PYBUILD_UV)
//! 3. Defaults (current directory, `uv` from PATH)
//!
//! There is no config file. The tools themselves read their settings from the
//! project's pyproject.toml.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::pipeline::Pipeline;

/// Manifest the dependency manager syncs from
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Environment variable overriding the project directory
pub const ENV_PROJECT_DIR: &str = "PYBUILD_PROJECT_DIR";

/// Environment variable overriding the `uv` binary
pub const ENV_UV: &str = "PYBUILD_UV";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to determine current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("Project directory does not exist: {}", .0.display())]
    MissingProjectDir(PathBuf),

    #[error("Project path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Dependency manager binary cannot be empty")]
    EmptyUv,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path of the project root every step runs in
    pub project_dir: PathBuf,

    /// `uv` binary, absolute if it was given as a relative path
    pub uv: String,

    /// Path to pyproject.toml (if found)
    pub pyproject: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Resolve the project directory and tool binary.
    ///
    /// `project_dir` defaults to the current directory.
    pub fn resolve(project_dir: Option<&Path>, uv: &str) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;

        let requested = match project_dir {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => cwd.join(dir),
            None => cwd.clone(),
        };

        if !requested.exists() {
            return Err(ConfigError::MissingProjectDir(requested));
        }
        if !requested.is_dir() {
            return Err(ConfigError::NotADirectory(requested));
        }
        let project_dir = requested
            .canonicalize()
            .map_err(|_| ConfigError::MissingProjectDir(requested.clone()))?;

        let uv = resolve_binary(&cwd, uv)?;

        let pyproject = Some(project_dir.join(PYPROJECT_FILE)).filter(|p| p.is_file());
        if pyproject.is_none() {
            warn!(
                project = %project_dir.display(),
                "No {} found; dependency sync will likely fail",
                PYPROJECT_FILE
            );
        }

        debug!(project = %project_dir.display(), %uv, "Resolved configuration");

        Ok(Self {
            project_dir,
            uv,
            pyproject,
        })
    }

    /// The build pipeline for this configuration
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::standard(&self.uv)
    }
}

/// Anchor a relative binary path (one containing a separator) to `cwd`.
///
/// Bare names are left for PATH lookup. Steps run inside the project
/// directory, so a relative path would otherwise resolve against it.
fn resolve_binary(cwd: &Path, binary: &str) -> Result<String, ConfigError> {
    let binary = binary.trim();
    if binary.is_empty() {
        return Err(ConfigError::EmptyUv);
    }

    let path = Path::new(binary);
    if path.is_relative() && path.components().count() > 1 {
        return Ok(cwd.join(path).to_string_lossy().into_owned());
    }

    Ok(binary.to_string())
}
