//! Config command handler.
//!
//! Setters go through the message channel so the running location, the
//! persisted `.env` value and the `location:changed` push all stay in step.

use anyhow::Result;
use godcode_core::{LocationStore, StoredPaths};
use serde_json::json;
use tracing::warn;

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;
use crate::error::CliError;

/// Execute a `config` subcommand.
pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::SetRuntime { path } => set(ctx, "set-runtime-path", &path).await,
        ConfigCommand::SetBackend { path } => set(ctx, "set-backend-root", &path).await,
        ConfigCommand::Show => show(ctx),
    }
}

async fn set(ctx: &CliContext, operation: &str, path: &str) -> Result<()> {
    if ctx.store.is_none() {
        warn!("No data directory, the new value only lasts for this process");
    }

    let envelope = ctx.channel.call(operation, Some(json!({ "path": path }))).await;
    if !envelope.success {
        let message = envelope.error.unwrap_or_else(|| format!("{operation} failed"));
        return Err(CliError::Operation(message).into());
    }

    if path.trim().is_empty() {
        println!("✓ Cleared");
    } else {
        println!("✓ Set to {}", path.trim());
    }
    Ok(())
}

fn show(ctx: &CliContext) -> Result<()> {
    let Some(store) = &ctx.store else {
        return Err(CliError::Config("no data directory available".into()).into());
    };
    let stored = store.load().map_err(CliError::from)?;
    let location = ctx.gateway().location();

    println!("env_file = {}", store.path().display());
    print!("{}", describe_overrides(&stored));
    println!(
        "effective runtime = {}",
        location
            .runtime_path
            .as_ref()
            .map_or_else(|| "(not found)".to_string(), |p| p.display().to_string())
    );
    println!(
        "effective backend_root = {}",
        location
            .backend_root
            .as_ref()
            .map_or_else(|| "(not found)".to_string(), |p| p.display().to_string())
    );
    Ok(())
}

fn describe_overrides(stored: &StoredPaths) -> String {
    let label = |value: Option<&String>| value.map_or("(not set)", String::as_str).to_string();
    format!(
        "runtime override = {}\nbackend override = {}\n",
        label(stored.runtime_path.as_ref()),
        label(stored.backend_root.as_ref())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_overrides_are_labelled() {
        let text = describe_overrides(&StoredPaths {
            runtime_path: Some("/opt/py/bin/python3".into()),
            backend_root: None,
        });
        assert_eq!(
            text,
            "runtime override = /opt/py/bin/python3\nbackend override = (not set)\n"
        );
    }
}
