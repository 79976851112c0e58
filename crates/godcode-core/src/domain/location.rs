//! Runtime location record.
//!
//! A `RuntimeLocation` is resolved once at startup and afterwards only
//! replaced wholesale, either by re-resolution or by one of the two
//! configuration setters. Readers always work on an immutable snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ResolutionError;
use crate::paths::{PathError, normalize_executable_path, normalize_optional_path};

/// Default name of the backend program's entry file.
pub const DEFAULT_ENTRY_FILE: &str = "run.py";

/// Where the runtime executable and the backend program root live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeLocation {
    /// Absolute path of the runtime executable, if known.
    pub runtime_path: Option<PathBuf>,
    /// Directory containing the backend entry file, if known.
    pub backend_root: Option<PathBuf>,
    /// When this record was produced.
    pub resolved_at: DateTime<Utc>,
    /// Why discovery left `runtime_path` empty.
    #[serde(skip)]
    runtime_error: Option<ResolutionError>,
    /// Why discovery left `backend_root` empty.
    #[serde(skip)]
    backend_error: Option<ResolutionError>,
}

/// Two locations are equal when they point at the same runtime and backend
/// root. `resolved_at` is bookkeeping and does not take part.
impl PartialEq for RuntimeLocation {
    fn eq(&self, other: &Self) -> bool {
        self.runtime_path == other.runtime_path && self.backend_root == other.backend_root
    }
}

impl Eq for RuntimeLocation {}

impl RuntimeLocation {
    /// Create a location stamped with the current time.
    pub fn new(runtime_path: Option<PathBuf>, backend_root: Option<PathBuf>) -> Self {
        Self {
            runtime_path: runtime_path.filter(|p| !p.as_os_str().is_empty()),
            backend_root: backend_root.filter(|p| !p.as_os_str().is_empty()),
            resolved_at: Utc::now(),
            runtime_error: None,
            backend_error: None,
        }
    }

    /// Attach the discovery failures for the fields that are empty, so
    /// later calls report what was tried.
    #[must_use]
    pub fn with_discovery_errors(
        mut self,
        runtime: Option<ResolutionError>,
        backend: Option<ResolutionError>,
    ) -> Self {
        self.runtime_error = runtime.filter(|_| self.runtime_path.is_none());
        self.backend_error = backend.filter(|_| self.backend_root.is_none());
        self
    }

    /// A location with neither field set.
    pub fn empty() -> Self {
        Self::new(None, None)
    }

    /// Return a copy with the update applied and a fresh timestamp.
    ///
    /// The discovery error of the replaced field is dropped; the other
    /// field keeps its own.
    #[must_use]
    pub fn apply(&self, update: &LocationUpdate) -> Self {
        match update {
            LocationUpdate::RuntimePath(path) => {
                Self::new(path.clone(), self.backend_root.clone())
                    .with_discovery_errors(None, self.backend_error.clone())
            }
            LocationUpdate::BackendRoot(path) => {
                Self::new(self.runtime_path.clone(), path.clone())
                    .with_discovery_errors(self.runtime_error.clone(), None)
            }
        }
    }

    /// Both fields present.
    pub const fn is_complete(&self) -> bool {
        self.runtime_path.is_some() && self.backend_root.is_some()
    }

    /// Turn this record into a location an invocation can be built from.
    ///
    /// Fails closed: a missing runtime is reported before a missing backend.
    /// The discovery error is reused when there is one.
    pub fn require(&self, entry_file: &str) -> Result<ResolvedLocation, ResolutionError> {
        let runtime = self.runtime_path.clone().ok_or_else(|| {
            self.runtime_error
                .clone()
                .unwrap_or(ResolutionError::RuntimeNotFound { tried: Vec::new() })
        })?;
        let backend_root = self.backend_root.clone().ok_or_else(|| {
            self.backend_error
                .clone()
                .unwrap_or_else(|| ResolutionError::BackendNotFound {
                    tried: Vec::new(),
                    entry_file: entry_file.to_string(),
                })
        })?;
        Ok(ResolvedLocation {
            runtime,
            backend_root,
        })
    }
}

impl Default for RuntimeLocation {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single configuration write against the location.
///
/// `None` clears the field. Paths are stored absolute, except a bare
/// runtime name, which is looked up on `PATH` at spawn time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationUpdate {
    RuntimePath(Option<PathBuf>),
    BackendRoot(Option<PathBuf>),
}

impl LocationUpdate {
    /// Build an update from a caller-supplied string; blank means clear.
    pub fn runtime_path(raw: &str) -> Result<Self, PathError> {
        normalize_executable_path(raw).map(Self::RuntimePath)
    }

    /// Build an update from a caller-supplied string; blank means clear.
    pub fn backend_root(raw: &str) -> Result<Self, PathError> {
        normalize_optional_path(raw).map(Self::BackendRoot)
    }

    /// The new value, `None` when the update clears the field.
    pub fn value(&self) -> Option<&Path> {
        match self {
            Self::RuntimePath(path) | Self::BackendRoot(path) => path.as_deref(),
        }
    }
}

/// A location with both fields present, ready for argv building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub runtime: PathBuf,
    pub backend_root: PathBuf,
}

impl ResolvedLocation {
    /// Full path of the entry file inside the backend root.
    pub fn entry_point(&self, entry_file: &str) -> PathBuf {
        self.backend_root.join(entry_file)
    }

    pub fn runtime(&self) -> &Path {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_timestamp() {
        let a = RuntimeLocation::new(Some("/usr/bin/python3".into()), Some("/opt/backend".into()));
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = RuntimeLocation::new(Some("/usr/bin/python3".into()), Some("/opt/backend".into()));
        assert_ne!(a.resolved_at, b.resolved_at);
        assert_eq!(a, b);
    }

    #[test]
    fn require_fails_closed_on_missing_runtime() {
        let loc = RuntimeLocation::new(None, Some("/opt/backend".into()));
        assert!(matches!(
            loc.require(DEFAULT_ENTRY_FILE),
            Err(ResolutionError::RuntimeNotFound { .. })
        ));
    }

    #[test]
    fn require_fails_closed_on_missing_backend() {
        let loc = RuntimeLocation::new(Some("/usr/bin/python3".into()), None);
        assert!(matches!(
            loc.require("main.py"),
            Err(ResolutionError::BackendNotFound { ref entry_file, .. }) if entry_file == "main.py"
        ));
    }

    #[test]
    fn empty_paths_are_treated_as_missing() {
        let loc = RuntimeLocation::new(Some(PathBuf::new()), Some(PathBuf::new()));
        assert!(!loc.is_complete());
    }

    #[test]
    fn apply_is_last_writer_wins() {
        let loc = RuntimeLocation::new(Some("/a/python".into()), Some("/a/backend".into()));
        let loc = loc.apply(&LocationUpdate::runtime_path("/b/python").unwrap());
        let loc = loc.apply(&LocationUpdate::runtime_path("/c/python").unwrap());
        assert_eq!(loc.runtime_path, Some(PathBuf::from("/c/python")));
        assert_eq!(loc.backend_root, Some(PathBuf::from("/a/backend")));

        let cleared = loc.apply(&LocationUpdate::backend_root("   ").unwrap());
        assert_eq!(cleared.backend_root, None);
    }

    #[test]
    fn relative_backend_root_is_stored_absolute() {
        let update = LocationUpdate::backend_root("apps/backend").unwrap();
        let expected = std::env::current_dir().unwrap().join("apps/backend");
        assert_eq!(update.value(), Some(expected.as_path()));
    }

    #[test]
    fn discovery_errors_survive_until_the_field_is_set() {
        let tried = ResolutionError::RuntimeNotFound {
            tried: vec!["python3".into(), "python".into()],
        };
        let loc = RuntimeLocation::new(None, Some("/opt/backend".into()))
            .with_discovery_errors(Some(tried.clone()), None);
        assert_eq!(loc.require(DEFAULT_ENTRY_FILE), Err(tried.clone()));

        let moved = loc.apply(&LocationUpdate::backend_root("/srv/backend").unwrap());
        assert_eq!(moved.require(DEFAULT_ENTRY_FILE), Err(tried));

        let fixed = moved.apply(&LocationUpdate::runtime_path("/usr/bin/python3").unwrap());
        assert!(fixed.require(DEFAULT_ENTRY_FILE).is_ok());
    }

    #[test]
    fn discovery_errors_are_dropped_for_present_fields() {
        let loc = RuntimeLocation::new(Some("/usr/bin/python3".into()), None).with_discovery_errors(
            Some(ResolutionError::RuntimeNotFound { tried: vec![] }),
            None,
        );
        assert!(matches!(
            loc.require(DEFAULT_ENTRY_FILE),
            Err(ResolutionError::BackendNotFound { .. })
        ));
    }

    #[test]
    fn entry_point_joins_backend_root() {
        let resolved = ResolvedLocation {
            runtime: "/usr/bin/python3".into(),
            backend_root: "/opt/backend".into(),
        };
        assert_eq!(
            resolved.entry_point(DEFAULT_ENTRY_FILE),
            PathBuf::from("/opt/backend/run.py")
        );
    }
}
