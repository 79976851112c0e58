//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the bridge is wired together for the
//! CLI adapter:
//! - Event bus (push notifications)
//! - Process runner and command bridge (via godcode-runtime)
//! - Path resolver seeded with command-line overrides
//! - `.env`-backed location store (via godcode-core)
//! - Gateway and message channel (via godcode-gateway)
//!
//! Command handlers receive the composed [`CliContext`] and go through the
//! message channel for everything that touches the backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use godcode_core::{EnvFileLocationStore, LocationStore};
use godcode_gateway::{EventBus, Gateway, GatewayDeps, MessageChannel};
use godcode_runtime::{
    BridgeConfig, CommandBridge, PathResolver, ResolverConfig, RunnerConfig, TokioProcessRunner,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Runtime executable tried before the built-in candidates.
    pub runtime: Option<String>,
    /// Backend root tried before the built-in candidates.
    pub backend_root: Option<PathBuf>,
    /// Deadline applied to every backend invocation.
    pub deadline: Duration,
    pub runner: RunnerConfig,
}

impl CliConfig {
    pub fn with_defaults() -> Self {
        Self {
            runtime: None,
            backend_root: None,
            deadline: BridgeConfig::default().deadline,
            runner: RunnerConfig::default(),
        }
    }

    /// Defaults overridden by global command-line options.
    pub fn from_cli(cli: &Cli) -> Self {
        let defaults = Self::with_defaults();
        Self {
            runtime: cli.runtime.clone(),
            backend_root: cli.backend_root.clone(),
            deadline: Duration::from_secs(cli.timeout_secs),
            runner: RunnerConfig {
                max_concurrent: usize::try_from(cli.max_concurrent).unwrap_or(usize::MAX),
                capture_limit: cli.capture_limit,
                ..defaults.runner
            },
        }
    }

    fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::with_defaults();
        if let Some(runtime) = &self.runtime {
            config = config.prefer_runtime(runtime.as_str());
        }
        if let Some(root) = &self.backend_root {
            config = config.prefer_backend_root(root.as_path());
        }
        config
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// The caller-facing request/response and push surface.
    pub channel: MessageChannel,
    /// Where setter writes are persisted, if a data directory exists.
    pub store: Option<Arc<EnvFileLocationStore>>,
}

impl CliContext {
    pub fn gateway(&self) -> &Arc<Gateway> {
        self.channel.gateway()
    }
}

/// Compose the bridge and resolve the runtime location once.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let bus = EventBus::new();

    let runner = Arc::new(TokioProcessRunner::new(config.runner.clone()));
    let bridge = CommandBridge::new(
        runner,
        BridgeConfig {
            deadline: config.deadline,
            ..BridgeConfig::default()
        },
    )
    .with_emitter(Arc::new(bus.clone()));

    let resolver = PathResolver::new(config.resolver_config());

    let store = match EnvFileLocationStore::from_data_root() {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, "No data directory, path overrides will not be persisted");
            None
        }
    };

    let mut deps = GatewayDeps::new(bridge, resolver, Arc::new(bus.clone()));
    if let Some(store) = &store {
        deps = deps.with_store(Arc::clone(store) as Arc<dyn LocationStore>);
    }

    let gateway = Arc::new(Gateway::start(deps).await);

    Ok(CliContext {
        channel: MessageChannel::new(gateway, bus),
        store,
    })
}

/// Install the global subscriber.
///
/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_overrides_reach_the_config() {
        let cli = Cli::parse_from([
            "godcode",
            "--runtime",
            "/opt/py/bin/python3",
            "--backend-root",
            "/srv/backend",
            "--timeout-secs",
            "7",
            "--max-concurrent",
            "2",
            "paths",
        ]);
        let config = CliConfig::from_cli(&cli);
        assert_eq!(config.deadline, Duration::from_secs(7));
        assert_eq!(config.runner.max_concurrent, 2);
        assert_eq!(config.runner.kill_grace, RunnerConfig::default().kill_grace);

        let resolver = config.resolver_config();
        assert_eq!(resolver.runtime_candidates[0], "/opt/py/bin/python3");
        assert_eq!(resolver.backend_candidates[0], PathBuf::from("/srv/backend"));
    }

    #[test]
    fn defaults_leave_candidates_alone() {
        let resolver = CliConfig::with_defaults().resolver_config();
        assert_eq!(
            resolver.runtime_candidates,
            ResolverConfig::with_defaults().runtime_candidates
        );
    }
}
