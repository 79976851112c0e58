//! Process runner trait definition.
//!
//! A runner executes one `Invocation` and reports its captured output. It
//! owns every spawn detail: stdio wiring, deadlines, kill escalation and
//! admission control.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Invocation, InvocationResult};
use crate::error::BridgeError;

/// Executes backend invocations.
///
/// # Contract
///
/// - A zero exit code yields `Ok`; anything else yields
///   [`BridgeError::Execution`] carrying the captured output.
/// - When `invocation.deadline` elapses the process is killed and
///   [`BridgeError::Timeout`] is returned.
/// - When `cancel` fires the process is killed and
///   [`BridgeError::Cancelled`] is returned.
/// - Concurrent calls never share stdout or stderr buffers.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<InvocationResult, BridgeError>;
}
