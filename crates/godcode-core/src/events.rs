//! Host-to-caller push notifications emitted by the bridge itself.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "invocation_finished", "invocationId": "…", "operation": "ping", "success": true, "durationMs": 41 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::Operation;

/// Event channel names. Keep strings stable; callers subscribe by name.
pub mod names {
    pub const INVOCATION_STARTED: &str = "invocation:started";
    pub const INVOCATION_FINISHED: &str = "invocation:finished";
    pub const LOCATION_CHANGED: &str = "location:changed";

    pub const ALL: [&str; 3] = [INVOCATION_STARTED, INVOCATION_FINISHED, LOCATION_CHANGED];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A subprocess is about to be spawned for an operation.
    InvocationStarted {
        #[serde(rename = "invocationId")]
        invocation_id: Uuid,
        operation: Operation,
    },

    /// An operation's subprocess reached a terminal state.
    InvocationFinished {
        #[serde(rename = "invocationId")]
        invocation_id: Uuid,
        operation: Operation,
        success: bool,
        #[serde(rename = "durationMs")]
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The runtime location was replaced.
    LocationChanged {
        #[serde(rename = "runtimePath")]
        runtime_path: Option<PathBuf>,
        #[serde(rename = "backendRoot")]
        backend_root: Option<PathBuf>,
    },
}

impl BridgeEvent {
    /// Channel the event is published on.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::InvocationStarted { .. } => names::INVOCATION_STARTED,
            Self::InvocationFinished { .. } => names::INVOCATION_FINISHED,
            Self::LocationChanged { .. } => names::LOCATION_CHANGED,
        }
    }
}
