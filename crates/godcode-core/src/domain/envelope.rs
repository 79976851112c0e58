//! Uniform response wrapper.
//!
//! `Envelope<T>` is the only type that crosses the caller boundary. Every
//! request gets exactly one, whether the operation succeeded or not.

use serde::{Deserialize, Serialize};

/// `{ "success": bool, "data"?: T, "error"?: string }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Erase the payload type for transport.
    ///
    /// A payload that fails to serialize turns the envelope into a failure.
    pub fn into_json(self) -> Envelope<serde_json::Value> {
        match self.data {
            Some(data) => match serde_json::to_value(data) {
                Ok(value) => Envelope {
                    success: self.success,
                    data: Some(value),
                    error: self.error,
                },
                Err(e) => Envelope::err(format!("failed to serialize response: {e}")),
            },
            None => Envelope {
                success: self.success,
                data: None,
                error: self.error,
            },
        }
    }
}
