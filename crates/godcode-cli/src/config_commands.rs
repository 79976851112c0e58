//! `godcode config` subcommands.

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Set the runtime executable (empty string clears it)
    SetRuntime { path: String },
    /// Set the backend root (empty string clears it)
    SetBackend { path: String },
    /// Show persisted overrides and the effective location
    Show,
}
