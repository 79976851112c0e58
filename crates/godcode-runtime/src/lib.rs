//! Process runtime for godcode.
//!
//! - [`PathResolver`]: finds the runtime executable and the backend root
//! - [`TokioProcessRunner`]: the `ProcessRunner` port implementation
//! - [`CommandBridge`]: one typed method per backend operation

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the integration tests only.
#[cfg(test)]
use tokio_test as _;

pub mod bridge;
pub mod process;
pub mod resolver;

pub use bridge::{BridgeConfig, CommandBridge};
pub use process::{RunnerConfig, TokioProcessRunner};
pub use resolver::{PathResolver, ResolverConfig};
