//! Candidate lists and probe settings for path discovery.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use godcode_core::DEFAULT_ENTRY_FILE;
use godcode_core::paths::{repo_root, resource_root};
use regex::Regex;
use tracing::debug;

#[cfg(target_os = "windows")]
const RUNTIME_CANDIDATES: &[&str] = &["python", "py"];

#[cfg(not(target_os = "windows"))]
const RUNTIME_CANDIDATES: &[&str] = &["python3", "python"];

/// Accepted `--version` output of the runtime.
pub const DEFAULT_VERSION_PATTERN: &str = r"^Python 3\.\d+";

/// Discovery settings for [`PathResolver`](super::PathResolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Executable names or absolute paths, tried in order.
    pub runtime_candidates: Vec<String>,
    /// Directories that may hold the backend program, tried in order.
    pub backend_candidates: Vec<PathBuf>,
    /// File whose presence marks a backend root.
    pub entry_file: String,
    /// Must match the combined `--version` output of a usable runtime.
    pub version_pattern: Regex,
    pub probe_timeout: Duration,
    /// Replaces `PATH` for runtime lookup when set.
    pub search_path: Option<OsString>,
}

impl ResolverConfig {
    /// Empty candidate lists with default probe settings.
    pub fn empty() -> Self {
        Self {
            runtime_candidates: Vec::new(),
            backend_candidates: Vec::new(),
            entry_file: DEFAULT_ENTRY_FILE.to_string(),
            version_pattern: default_version_pattern(),
            probe_timeout: Duration::from_secs(5),
            search_path: None,
        }
    }

    /// Platform defaults.
    ///
    /// Development locations come first, then packaged-resource locations.
    pub fn with_defaults() -> Self {
        let mut backend_candidates = vec![repo_root().join("apps").join("backend")];

        if let Ok(cwd) = std::env::current_dir() {
            backend_candidates.push(cwd.join("apps").join("backend"));
            backend_candidates.push(cwd.join("backend"));
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
        {
            backend_candidates.push(exe_dir.join("resources").join("backend"));
            backend_candidates.push(exe_dir.join("..").join("Resources").join("backend"));
            backend_candidates.push(exe_dir.join("..").join("lib").join("godcode").join("backend"));
        }

        match resource_root() {
            Ok(root) => backend_candidates.push(root.join("backend")),
            Err(e) => debug!(error = %e, "No resource root, skipping bundled backend candidate"),
        }

        Self {
            runtime_candidates: RUNTIME_CANDIDATES.iter().map(ToString::to_string).collect(),
            backend_candidates,
            ..Self::empty()
        }
    }

    /// Put an explicit runtime ahead of the defaults.
    #[must_use]
    pub fn prefer_runtime(mut self, candidate: impl Into<String>) -> Self {
        let candidate = candidate.into();
        if !candidate.trim().is_empty() {
            self.runtime_candidates.retain(|c| c != &candidate);
            self.runtime_candidates.insert(0, candidate);
        }
        self
    }

    /// Put an explicit backend root ahead of the defaults.
    #[must_use]
    pub fn prefer_backend_root(mut self, candidate: impl Into<PathBuf>) -> Self {
        let candidate = candidate.into();
        if !candidate.as_os_str().is_empty() {
            self.backend_candidates.retain(|c| c != &candidate);
            self.backend_candidates.insert(0, candidate);
        }
        self
    }

    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_version_pattern() -> Regex {
    Regex::new(DEFAULT_VERSION_PATTERN).expect("version pattern is a valid regex")
}
