//! CLI entry point - the composition root.
//!
//! Environment first (`.env` in the working directory, then the persisted
//! `<data_root>/.env`), so clap's `env` fallbacks see both. Then tracing,
//! bootstrap, and dispatch.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::error;

use godcode_cli::error::exit_code_for;
use godcode_cli::{Cli, CliConfig, Commands, bootstrap, handlers, init_tracing};
use godcode_core::paths::env_file_path;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    if let Ok(path) = env_file_path() {
        dotenvy::from_path(path).ok();
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(&cli);
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(config).await?;

    let result = match command {
        Commands::Call { operation, payload } => {
            handlers::call::execute(&ctx, &operation, payload.as_deref()).await
        }
        Commands::Serve => handlers::serve::execute(&ctx).await,
        Commands::Paths => handlers::paths::execute(&ctx),
        Commands::Config { command } => handlers::config::execute(&ctx, command).await,
    };

    ctx.gateway().shutdown();
    result
}
