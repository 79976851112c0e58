//! Common test utilities.
//!
//! A fake backend is a temp directory whose `run.py` is a shell script, run
//! with `/bin/sh` standing in for the runtime. `sh run.py <flags>` sees the
//! bridge's flags as `$@`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use godcode::{
    BridgeConfig, CommandBridge, EventBus, Gateway, GatewayDeps, LocationStore, MessageChannel,
    PathResolver, ResolverConfig, RunnerConfig, RuntimeLocation, TokioProcessRunner,
};
use tempfile::TempDir;

pub const SHELL: &str = "/bin/sh";

/// A backend root holding a scripted `run.py`.
pub struct FakeBackend {
    dir: TempDir,
}

impl FakeBackend {
    pub fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().expect("create backend dir");
        std::fs::write(dir.path().join("run.py"), script).expect("write run.py");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Location pointing at this backend with `/bin/sh` as the runtime.
    pub fn location(&self) -> RuntimeLocation {
        RuntimeLocation::new(Some(PathBuf::from(SHELL)), Some(self.root().to_path_buf()))
    }
}

/// Builder for a fully wired channel.
pub struct Harness {
    pub deadline: Duration,
    pub runner: RunnerConfig,
    pub resolver: ResolverConfig,
    pub store: Option<Arc<dyn LocationStore>>,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(10),
            runner: RunnerConfig::default(),
            resolver: ResolverConfig::empty(),
            store: None,
        }
    }
}

impl Harness {
    fn deps(self, bus: &EventBus) -> GatewayDeps {
        let bridge = CommandBridge::new(
            Arc::new(TokioProcessRunner::new(self.runner)),
            BridgeConfig {
                deadline: self.deadline,
                ..BridgeConfig::default()
            },
        )
        .with_emitter(Arc::new(bus.clone()));

        let deps = GatewayDeps::new(bridge, PathResolver::new(self.resolver), Arc::new(bus.clone()));
        match self.store {
            Some(store) => deps.with_store(store),
            None => deps,
        }
    }

    /// Channel around a gateway that starts at `location`.
    pub fn channel(self, location: RuntimeLocation) -> MessageChannel {
        let bus = EventBus::new();
        let gateway = Gateway::new(self.deps(&bus), location);
        MessageChannel::new(Arc::new(gateway), bus)
    }

    /// Channel around a gateway that resolves its own location.
    pub async fn started(self) -> MessageChannel {
        let bus = EventBus::new();
        let gateway = Gateway::start(self.deps(&bus)).await;
        MessageChannel::new(Arc::new(gateway), bus)
    }
}

/// Channel with default settings against `backend`.
pub fn channel_for(backend: &FakeBackend) -> MessageChannel {
    Harness::default().channel(backend.location())
}
