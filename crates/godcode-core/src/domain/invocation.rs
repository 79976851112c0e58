//! Invocation types.
//!
//! An `Invocation` describes exactly one subprocess run. It is built per
//! call, never mutated, and discarded once its result has been produced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Marker appended to a captured stream once its byte cap was reached.
pub const TRUNCATION_MARKER: &[u8] = b"\n[output truncated]";

/// One spawn-and-wait cycle against the backend program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Correlation id used in logs and push events.
    pub id: Uuid,
    /// `argv[0]` is the executable; the rest are passed verbatim.
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    /// Overrides merged on top of the inherited host environment.
    pub env: BTreeMap<String, String>,
    pub deadline: Duration,
}

impl Invocation {
    pub fn new(argv: Vec<String>, working_dir: impl Into<PathBuf>, deadline: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            argv,
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
            deadline,
        }
    }

    /// Add an environment override.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// The executable, or an empty string for a malformed invocation.
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Arguments after the executable.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// Captured outcome of a finished (or forcibly stopped) process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration_ms: u64,
    /// At least one stream hit the capture cap.
    pub truncated: bool,
}

impl InvocationResult {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Lifecycle of a single invocation.
///
/// `Idle → Spawning → Running → {Completed | Failed | TimedOut | Cancelled}`.
/// A spawn failure goes straight from `Spawning` to `Failed`, and a call
/// cancelled while waiting for admission goes from `Idle` to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    Idle,
    Spawning,
    Running,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl InvocationState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }

    /// Whether `self → next` is a legal step.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Idle => matches!(next, Self::Spawning | Self::Cancelled),
            Self::Spawning => matches!(next, Self::Running | Self::Failed | Self::Cancelled),
            Self::Running => next.is_terminal(),
            Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled => false,
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Spawning => "spawning",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}
