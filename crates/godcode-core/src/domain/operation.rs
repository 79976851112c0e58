//! Operation catalog, payloads and result shapes.
//!
//! The catalog is closed: callers can only name one of the operations below,
//! never an arbitrary command line. Wire names are kebab-case and stable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every operation the caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Ping,
    Status,
    ListSessions,
    ListSpecs,
    StartSession,
    RunQa,
    ResumeSession,
    MergeSpec,
    DiscardSpec,
    BackendVersion,
    GetLocation,
    SetRuntimePath,
    SetBackendRoot,
    ResolvePaths,
}

impl Operation {
    pub const ALL: [Self; 14] = [
        Self::Ping,
        Self::Status,
        Self::ListSessions,
        Self::ListSpecs,
        Self::StartSession,
        Self::RunQa,
        Self::ResumeSession,
        Self::MergeSpec,
        Self::DiscardSpec,
        Self::BackendVersion,
        Self::GetLocation,
        Self::SetRuntimePath,
        Self::SetBackendRoot,
        Self::ResolvePaths,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Status => "status",
            Self::ListSessions => "list-sessions",
            Self::ListSpecs => "list-specs",
            Self::StartSession => "start-session",
            Self::RunQa => "run-qa",
            Self::ResumeSession => "resume-session",
            Self::MergeSpec => "merge-spec",
            Self::DiscardSpec => "discard-spec",
            Self::BackendVersion => "backend-version",
            Self::GetLocation => "get-location",
            Self::SetRuntimePath => "set-runtime-path",
            Self::SetBackendRoot => "set-backend-root",
            Self::ResolvePaths => "resolve-paths",
        }
    }

    /// Whether serving this operation spawns the backend program.
    pub const fn spawns_process(self) -> bool {
        !matches!(
            self,
            Self::GetLocation | Self::SetRuntimePath | Self::SetBackendRoot | Self::ResolvePaths
        )
    }

    /// Whether the operation requires a payload object.
    pub const fn takes_payload(self) -> bool {
        matches!(
            self,
            Self::StartSession
                | Self::RunQa
                | Self::ResumeSession
                | Self::MergeSpec
                | Self::DiscardSpec
                | Self::SetRuntimePath
                | Self::SetBackendRoot
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A backend command line, minus the runtime and entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    /// `--status`
    Status,
    /// `--status --json`
    StatusJson,
    /// `--list --json`
    ListSpecs,
    /// `--spec=<description>`
    StartSession { description: String },
    /// `--qa --spec=<name>`
    RunQa {
        spec_name: String,
        max_iterations: Option<u32>,
        auto_fix: bool,
    },
    /// `--resume=<session-id>`
    Resume { session_id: String },
    /// `--spec=<name> --merge --force`
    Merge { spec_name: String },
    /// `--spec=<name> --discard --force`
    Discard { spec_name: String },
    /// `--version`
    Version,
}

impl BackendCommand {
    /// Backend arguments after the entry file.
    ///
    /// Valued options travel as one `--name=value` token so a value that
    /// starts with `-` is never read as an option.
    pub fn flags(&self) -> Vec<String> {
        match self {
            Self::Status => vec!["--status".into()],
            Self::StatusJson => vec!["--status".into(), "--json".into()],
            Self::ListSpecs => vec!["--list".into(), "--json".into()],
            Self::StartSession { description } => vec![valued("--spec", description)],
            Self::RunQa {
                spec_name,
                max_iterations,
                auto_fix,
            } => {
                let mut flags = vec!["--qa".into(), valued("--spec", spec_name)];
                if let Some(n) = max_iterations {
                    flags.push(valued("--max-iterations", &n.to_string()));
                }
                if *auto_fix {
                    flags.push("--auto-fix".into());
                }
                flags
            }
            Self::Resume { session_id } => vec![valued("--resume", session_id)],
            // The backend prompts for confirmation without --force, and the
            // child's stdin is closed.
            Self::Merge { spec_name } => vec![
                valued("--spec", spec_name),
                "--merge".into(),
                "--force".into(),
            ],
            Self::Discard { spec_name } => vec![
                valued("--spec", spec_name),
                "--discard".into(),
                "--force".into(),
            ],
            Self::Version => vec!["--version".into()],
        }
    }
}

fn valued(name: &str, value: &str) -> String {
    format!("{name}={value}")
}

// ============================================================================
// Payloads
// ============================================================================

fn require_non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{field}` must not be empty"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartSessionRequest {
    /// Free-form description of the unit of work.
    pub description: String,
}

impl StartSessionRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_non_blank("description", &self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunQaRequest {
    pub spec_name: String,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub auto_fix: bool,
}

impl RunQaRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_non_blank("specName", &self.spec_name)?;
        if self.max_iterations == Some(0) {
            return Err("`maxIterations` must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResumeSessionRequest {
    pub session_id: String,
}

impl ResumeSessionRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_non_blank("sessionId", &self.session_id)
    }
}

/// Payload for operations that act on one named spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpecTargetRequest {
    pub spec_name: String,
}

impl SpecTargetRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_non_blank("specName", &self.spec_name)
    }
}

/// Payload for the two configuration setters. A blank path clears the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetPathRequest {
    pub path: String,
}

// ============================================================================
// Results
// ============================================================================

/// Health probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    pub connected: bool,
    /// Human-readable probe output, possibly empty.
    pub output: String,
}

/// Machine-readable status: the JSON object the backend printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusReport(pub serde_json::Map<String, serde_json::Value>);

/// One entry of `list-sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub status: String,
    pub task: String,
}

/// One entry of `list-specs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecSummary {
    pub name: String,
    pub status: String,
}

/// Output of a command whose result is human-readable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub output: String,
    pub truncated: bool,
}

/// Parsed `--version` line, e.g. `claude-god-code 0.1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendVersion {
    pub program: String,
    pub version: String,
}
