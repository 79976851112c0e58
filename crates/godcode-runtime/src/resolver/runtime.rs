//! Runtime executable discovery: version probe, then absolute-path lookup.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use godcode_core::ResolutionError;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::config::ResolverConfig;

#[cfg(target_os = "windows")]
const LOOKUP_COMMAND: &str = "where";

#[cfg(not(target_os = "windows"))]
const LOOKUP_COMMAND: &str = "which";

pub(super) async fn resolve_runtime(config: &ResolverConfig) -> Result<PathBuf, ResolutionError> {
    let mut tried = Vec::with_capacity(config.runtime_candidates.len());

    for candidate in &config.runtime_candidates {
        tried.push(candidate.clone());

        let Some(program) = probe_target(config, candidate) else {
            debug!(candidate, "Runtime candidate not on search path");
            continue;
        };

        if !probe_version(config, &program).await {
            continue;
        }

        let resolved = if Path::new(candidate).is_absolute() {
            program.canonicalize().ok()
        } else {
            locate(config, candidate).await
        };

        if let Some(path) = resolved {
            info!(runtime = %path.display(), "Resolved runtime");
            return Ok(path);
        }
        debug!(candidate, "Runtime passed the probe but could not be located");
    }

    Err(ResolutionError::RuntimeNotFound { tried })
}

/// What to execute for the version probe.
///
/// With a custom search path the bare name is looked up in-process first so
/// the probe and the later lookup agree on which file is meant.
fn probe_target(config: &ResolverConfig, candidate: &str) -> Option<PathBuf> {
    if Path::new(candidate).is_absolute() {
        return Some(PathBuf::from(candidate));
    }
    match &config.search_path {
        Some(search) => which_in(candidate, search),
        None => Some(PathBuf::from(candidate)),
    }
}

/// Run `<program> --version` and match the combined output.
async fn probe_version(config: &ResolverConfig, program: &Path) -> bool {
    let mut cmd = Command::new(program);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(search) = &config.search_path {
        cmd.env("PATH", search);
    }

    let output = match timeout(config.probe_timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!(program = %program.display(), error = %e, "Version probe failed to run");
            return false;
        }
        Err(_) => {
            debug!(program = %program.display(), "Version probe timed out");
            return false;
        }
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let text = combined.trim_start();
    let accepted = config.version_pattern.is_match(text);
    debug!(
        program = %program.display(),
        version = text.lines().next().unwrap_or_default(),
        accepted,
        "Version probe"
    );
    accepted
}

/// Absolute path of `name` via the platform lookup command, falling back to
/// an in-process lookup when the command cannot be run.
async fn locate(config: &ResolverConfig, name: &str) -> Option<PathBuf> {
    let mut cmd = Command::new(LOOKUP_COMMAND);
    cmd.arg(name)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    if let Some(search) = &config.search_path {
        cmd.env("PATH", search);
    }

    match timeout(config.probe_timeout, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(PathBuf::from)
                .filter(|path| path.is_absolute())
        }
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            debug!(command = LOOKUP_COMMAND, error = %e, "Lookup command unavailable, using in-process lookup");
            match &config.search_path {
                Some(search) => which_in(name, search),
                None => which::which(name).ok(),
            }
        }
        Err(_) => None,
    }
}

fn which_in(name: &str, search: &OsStr) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(name, Some(search), cwd).ok()
}
