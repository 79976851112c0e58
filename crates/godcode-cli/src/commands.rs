//! Subcommand definitions.

use clap::Subcommand;

use crate::config_commands::ConfigCommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one operation and print its envelope as JSON
    Call {
        /// Operation name, e.g. `ping`, `run-qa`, `set-runtime-path`
        operation: String,
        /// JSON payload for operations that take one
        #[arg(short, long)]
        payload: Option<String>,
    },
    /// Serve newline-delimited JSON requests on stdin/stdout
    Serve,
    /// Show the resolved runtime location and config file paths
    Paths,
    /// Inspect or change persisted path overrides
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}
