//! Locates the runtime executable and the backend program root.
//!
//! Resolution is deterministic for a given filesystem and environment, so
//! calling it twice without changes yields equal locations.

mod backend;
mod config;
mod runtime;

use std::path::PathBuf;

use godcode_core::{ResolutionError, RuntimeLocation};
use tracing::warn;

pub use config::{DEFAULT_VERSION_PATTERN, ResolverConfig};

/// Discovers a [`RuntimeLocation`] from a [`ResolverConfig`].
#[derive(Debug, Clone)]
pub struct PathResolver {
    config: ResolverConfig,
}

impl PathResolver {
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve both halves of the location. A half that cannot be found is
    /// left empty and logged, and its error travels with the location so
    /// callers fail closed with the candidates that were tried.
    pub async fn resolve(&self) -> RuntimeLocation {
        let (runtime, runtime_error) = split(
            self.resolve_runtime()
                .await
                .inspect_err(|e| warn!(error = %e, "Runtime resolution failed")),
        );
        let (backend, backend_error) = split(
            self.resolve_backend_root()
                .inspect_err(|e| warn!(error = %e, "Backend resolution failed")),
        );
        RuntimeLocation::new(runtime, backend).with_discovery_errors(runtime_error, backend_error)
    }

    pub async fn resolve_runtime(&self) -> Result<PathBuf, ResolutionError> {
        runtime::resolve_runtime(&self.config).await
    }

    pub fn resolve_backend_root(&self) -> Result<PathBuf, ResolutionError> {
        backend::resolve_backend_root(&self.config)
    }
}

fn split(result: Result<PathBuf, ResolutionError>) -> (Option<PathBuf>, Option<ResolutionError>) {
    match result {
        Ok(path) => (Some(path), None),
        Err(e) => (None, Some(e)),
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::with_defaults())
    }
}
