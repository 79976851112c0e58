//! Subprocess execution for backend invocations.
//!
//! - `runner`: the `ProcessRunner` implementation (spawn, capture, deadline)
//! - `capture`: bounded per-stream output buffers
//! - `shutdown`: SIGTERM → SIGKILL escalation

mod capture;
mod runner;
mod shutdown;

pub use capture::CaptureBuffer;
pub use runner::{RunnerConfig, TokioProcessRunner};
pub use shutdown::terminate_child;
