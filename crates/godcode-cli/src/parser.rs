//! Main CLI parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Bridge between a desktop host and the godcode backend program.
#[derive(Debug, Parser)]
#[command(name = "godcode")]
#[command(about = "Run godcode backend operations through a supervised subprocess bridge")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Runtime executable to try before the built-in candidates
    #[arg(long, global = true, env = "GODCODE_RUNTIME_PATH")]
    pub runtime: Option<String>,

    /// Backend root to try before the built-in candidates
    #[arg(long = "backend-root", global = true, env = "GODCODE_BACKEND_ROOT")]
    pub backend_root: Option<PathBuf>,

    /// Deadline for each backend invocation, in seconds
    #[arg(long = "timeout-secs", global = true, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Maximum number of backend processes alive at once
    #[arg(long = "max-concurrent", global = true, default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_concurrent: u64,

    /// Per-stream output capture limit, in bytes
    #[arg(long = "capture-limit", global = true, default_value_t = 4 * 1024 * 1024)]
    pub capture_limit: usize,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_commands::ConfigCommand;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_args_work_after_the_subcommand() {
        let cli = Cli::parse_from([
            "godcode",
            "call",
            "ping",
            "--verbose",
            "--runtime",
            "/opt/py/bin/python3",
            "--timeout-secs",
            "5",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.runtime.as_deref(), Some("/opt/py/bin/python3"));
        assert_eq!(cli.timeout_secs, 5);
        assert!(matches!(cli.command, Some(Commands::Call { ref operation, .. }) if operation == "ping"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["godcode", "--timeout-secs", "0", "paths"]).is_err());
    }

    #[test]
    fn config_subcommands_parse() {
        let cli = Cli::parse_from(["godcode", "config", "set-backend", "/srv/backend"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommand::SetBackend { ref path }
            }) if path == "/srv/backend"
        ));
    }
}
