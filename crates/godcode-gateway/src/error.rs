//! Errors raised by the message channel before or around dispatch.
//!
//! Operation failures themselves are `BridgeError`s; these cover requests
//! that never reach an operation.

use godcode_core::Operation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The name is not in the operation catalog.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// The payload is missing, malformed, or fails validation.
    #[error("invalid payload for `{operation}`: {reason}")]
    InvalidPayload { operation: Operation, reason: String },

    /// The dispatch task panicked or was aborted.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChannelError {
    pub fn invalid(operation: Operation, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            operation,
            reason: reason.into(),
        }
    }
}
