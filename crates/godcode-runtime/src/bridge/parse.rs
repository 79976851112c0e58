//! Output parsers, one per result shape.

use std::sync::LazyLock;

use godcode_core::{
    BackendVersion, BridgeError, CommandOutput, InvocationResult, Operation, PingResult,
    SessionSummary, SpecSummary, StatusReport,
};
use regex::Regex;
use tracing::debug;

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+v?(\d+\.\d+\.\d+(?:[-+][0-9A-Za-z.\-+]+)?)$")
        .expect("version line pattern is a valid regex")
});

pub fn ping(result: &InvocationResult) -> PingResult {
    PingResult {
        connected: true,
        output: result.stdout_lossy().trim().to_string(),
    }
}

/// The trimmed stdout must be a single JSON object.
pub fn status(result: &InvocationResult) -> Result<StatusReport, BridgeError> {
    let stdout = result.stdout_lossy();
    match serde_json::from_str::<serde_json::Value>(stdout.trim()) {
        Ok(serde_json::Value::Object(map)) => Ok(StatusReport(map)),
        Ok(other) => Err(BridgeError::parse(
            Operation::Status.name(),
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(e) => Err(BridgeError::parse(Operation::Status.name(), e.to_string())),
    }
}

// The backend's list output has no agreed schema yet, so both list parsers
// report nothing regardless of what was printed.
pub fn sessions(result: &InvocationResult) -> Vec<SessionSummary> {
    debug!(
        ignored_bytes = result.stdout.len(),
        "Session listing output not parsed"
    );
    Vec::new()
}

pub fn specs(result: &InvocationResult) -> Vec<SpecSummary> {
    debug!(
        ignored_bytes = result.stdout.len(),
        "Spec listing output not parsed"
    );
    Vec::new()
}

pub fn command_output(result: &InvocationResult) -> CommandOutput {
    CommandOutput {
        output: result.stdout_lossy(),
        truncated: result.truncated,
    }
}

/// First non-blank line must read `<program> <semver>`.
pub fn version(result: &InvocationResult) -> Result<BackendVersion, BridgeError> {
    let stdout = result.stdout_lossy();
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| BridgeError::parse(Operation::BackendVersion.name(), "empty output"))?;

    let captures = VERSION_LINE.captures(line).ok_or_else(|| {
        BridgeError::parse(
            Operation::BackendVersion.name(),
            format!("unrecognised version line `{line}`"),
        )
    })?;

    Ok(BackendVersion {
        program: captures[1].to_string(),
        version: captures[2].to_string(),
    })
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
