//! Error taxonomy for the bridge.
//!
//! `BridgeError` covers everything that can go wrong between building an
//! invocation and handing a parsed result back. Adapters render it with
//! `Display`; the message is what ends up in a failed `Envelope`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::domain::InvocationResult;

/// The runtime or backend program could not be located.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No runtime candidate passed the version probe, or none is configured.
    #[error("runtime not found{}", describe_tried(tried))]
    RuntimeNotFound { tried: Vec<String> },

    /// No candidate directory contains the entry file, or none is configured.
    #[error("backend not found: no directory contains `{entry_file}`{}", describe_tried_paths(tried))]
    BackendNotFound {
        tried: Vec<PathBuf>,
        entry_file: String,
    },
}

fn describe_tried(tried: &[String]) -> String {
    if tried.is_empty() {
        " (no runtime path configured)".to_string()
    } else {
        format!(" (tried: {})", tried.join(", "))
    }
}

fn describe_tried_paths(tried: &[PathBuf]) -> String {
    if tried.is_empty() {
        " (no backend root configured)".to_string()
    } else {
        let joined: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
        format!(" (tried: {})", joined.join(", "))
    }
}

/// Failures of a single bridge call.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Location incomplete; nothing was spawned.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The OS refused to start the process.
    #[error("failed to spawn `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    /// The deadline elapsed and the process was killed.
    #[error("timed out after {}ms", deadline.as_millis())]
    Timeout {
        deadline: Duration,
        /// Whatever was captured before the kill.
        partial: Box<InvocationResult>,
    },

    /// The process exited non-zero.
    #[error("{message}")]
    Execution {
        exit_code: i32,
        message: String,
        partial: Box<InvocationResult>,
    },

    /// Output did not match the operation's result shape.
    #[error("failed to parse `{operation}` output: {reason}")]
    Parse { operation: String, reason: String },

    /// Cancelled through the caller's or the host's token.
    #[error("invocation cancelled")]
    Cancelled,
}

impl BridgeError {
    /// Build an execution error from a finished process.
    ///
    /// The message is the trimmed stderr, or a generic exit description when
    /// stderr is empty.
    pub fn execution(result: InvocationResult) -> Self {
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            describe_exit(result.exit_code)
        } else {
            stderr
        };
        Self::Execution {
            exit_code: result.exit_code,
            message,
            partial: Box::new(result),
        }
    }

    pub fn parse(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly category, used as a tracing field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(ResolutionError::RuntimeNotFound { .. }) => "runtime_not_found",
            Self::Resolution(ResolutionError::BackendNotFound { .. }) => "backend_not_found",
            Self::Spawn { .. } => "spawn",
            Self::Timeout { .. } => "timeout",
            Self::Execution { .. } => "execution",
            Self::Parse { .. } => "parse",
            Self::Cancelled => "cancelled",
        }
    }

    /// Output captured before the failure, if any.
    pub fn partial_output(&self) -> Option<&InvocationResult> {
        match self {
            Self::Timeout { partial, .. } | Self::Execution { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Human description of an exit code.
///
/// Negative codes are the runner's encoding of "killed by signal N".
pub fn describe_exit(exit_code: i32) -> String {
    if exit_code < 0 {
        format!("terminated by signal {}", -exit_code)
    } else {
        format!("exited with code {exit_code}")
    }
}
