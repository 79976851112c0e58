//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<...>`
//! - Parse CLI-specific input, go through the message channel, format output
//!
//! Handlers never spawn the backend themselves.

pub mod call;
pub mod config;
pub mod paths;
pub mod serve;
