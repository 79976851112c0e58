//! Command-line adapter for godcode.
//!
//! `godcode call <op>` runs one operation, `godcode serve` speaks
//! newline-delimited JSON on stdio for a host process, and `paths`/`config`
//! cover diagnostics and persisted overrides.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary only
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap, init_tracing};
pub use commands::Commands;
pub use config_commands::ConfigCommand;
pub use error::CliError;
pub use parser::Cli;
