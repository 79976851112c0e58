//! Paths command handler.
//!
//! Displays the effective runtime location and the directories godcode uses,
//! for diagnosing discovery problems.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use godcode_core::paths::{data_root, env_file_path, repo_root};
use godcode_core::{DEFAULT_ENTRY_FILE, RuntimeLocation};

use crate::bootstrap::CliContext;

/// Everything `godcode paths` prints, in `key = value` form.
#[derive(Debug, Clone)]
pub struct PathsReport {
    pub location: RuntimeLocation,
    pub data_root: Result<PathBuf, String>,
    pub env_file: Result<PathBuf, String>,
    pub repo_root: PathBuf,
}

impl PathsReport {
    pub fn collect(location: RuntimeLocation) -> Self {
        Self {
            location,
            data_root: data_root().map_err(|e| e.to_string()),
            env_file: env_file_path().map_err(|e| e.to_string()),
            repo_root: repo_root(),
        }
    }
}

fn optional(path: Option<&Path>) -> String {
    path.map_or_else(|| "(not found)".to_string(), |p| p.display().to_string())
}

fn fallible(path: &Result<PathBuf, String>) -> String {
    match path {
        Ok(p) => p.display().to_string(),
        Err(e) => format!("(unavailable: {e})"),
    }
}

impl fmt::Display for PathsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "runtime_path = {}",
            optional(self.location.runtime_path.as_deref())
        )?;
        writeln!(
            f,
            "backend_root = {}",
            optional(self.location.backend_root.as_deref())
        )?;
        writeln!(f, "entry_file = {DEFAULT_ENTRY_FILE}")?;
        writeln!(f, "resolved_at = {}", self.location.resolved_at.to_rfc3339())?;
        writeln!(f, "data_root = {}", fallible(&self.data_root))?;
        writeln!(f, "env_file = {}", fallible(&self.env_file))?;
        write!(f, "repo_root = {}", self.repo_root.display())
    }
}

/// Execute the paths command.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let location = (*ctx.gateway().location()).clone();
    println!("{}", PathsReport::collect(location));
    Ok(())
}
