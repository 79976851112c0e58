//! Gateway - owns the runtime location and serves every operation.
//!
//! Each operation reads the current location snapshot once, so an in-flight
//! invocation keeps the location it started with even if a setter replaces
//! it mid-call. All results leave as `Envelope`s.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use godcode_core::paths::PathError;
use godcode_core::{
    BackendVersion, BridgeError, BridgeEvent, CommandOutput, Envelope, EventEmitter,
    LocationStore, LocationUpdate, Operation, PingResult, ResolvedLocation, ResumeSessionRequest,
    RunQaRequest, RuntimeLocation, SessionSummary, SpecSummary, SpecTargetRequest,
    StartSessionRequest, StatusReport,
};
use godcode_runtime::{CommandBridge, PathResolver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::deps::GatewayDeps;

pub struct Gateway {
    location: ArcSwap<RuntimeLocation>,
    bridge: CommandBridge,
    resolver: PathResolver,
    emitter: Arc<dyn EventEmitter>,
    store: Option<Arc<dyn LocationStore>>,
    /// Serializes snapshot writes with their persistence.
    writes: Mutex<()>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("location", &self.location.load())
            .field("bridge", &self.bridge)
            .field("shut_down", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway around an already-known location.
    pub fn new(deps: GatewayDeps, location: RuntimeLocation) -> Self {
        Self {
            location: ArcSwap::from_pointee(location),
            bridge: deps.bridge,
            resolver: deps.resolver,
            emitter: deps.emitter,
            store: deps.store,
            writes: Mutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Resolve the location once and create the gateway.
    pub async fn start(deps: GatewayDeps) -> Self {
        let location = deps.resolver.resolve().await;
        info!(
            runtime = ?location.runtime_path,
            backend_root = ?location.backend_root,
            "Gateway started"
        );
        Self::new(deps, location)
    }

    /// Current location snapshot.
    pub fn location(&self) -> Arc<RuntimeLocation> {
        self.location.load_full()
    }

    pub fn get_location(&self) -> Envelope<RuntimeLocation> {
        Envelope::ok((*self.location()).clone())
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the runtime path. Blank clears it; a relative path is
    /// anchored at the working directory.
    pub fn set_runtime_path(&self, raw: &str) -> Envelope<RuntimeLocation> {
        self.update(LocationUpdate::runtime_path(raw), |store, value| {
            store.save_runtime_path(value)
        })
    }

    /// Replace the backend root. Blank clears it; a relative path is
    /// anchored at the working directory.
    pub fn set_backend_root(&self, raw: &str) -> Envelope<RuntimeLocation> {
        self.update(LocationUpdate::backend_root(raw), |store, value| {
            store.save_backend_root(value)
        })
    }

    fn update(
        &self,
        update: Result<LocationUpdate, PathError>,
        persist: impl FnOnce(&dyn LocationStore, &str) -> Result<(), PathError>,
    ) -> Envelope<RuntimeLocation> {
        let update = match update {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "Rejected location override");
                return Envelope::err(e.to_string());
            }
        };

        // The store must end up holding the value of the last installed
        // snapshot, so the swap and the write happen under one lock.
        let installed = {
            let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
            let installed = Arc::new(self.location.load().apply(&update));
            self.location.store(Arc::clone(&installed));

            if let Some(store) = &self.store {
                let value = update
                    .value()
                    .map(|path| path.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if let Err(e) = persist(store.as_ref(), &value) {
                    warn!(error = %e, "Failed to persist location override");
                }
            }
            installed
        };
        info!(?update, "Runtime location updated");

        self.announce(&installed);
        Envelope::ok((*installed).clone())
    }

    /// Rerun discovery and replace the snapshot. Persisted overrides, when
    /// a store is configured, are tried before the built-in candidates.
    pub async fn re_resolve(&self) -> Envelope<RuntimeLocation> {
        let resolver = self.resolver_with_overrides();
        let location = Arc::new(resolver.resolve().await);
        {
            let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
            self.location.store(Arc::clone(&location));
        }
        info!(
            runtime = ?location.runtime_path,
            backend_root = ?location.backend_root,
            "Runtime location re-resolved"
        );
        self.announce(&location);
        Envelope::ok((*location).clone())
    }

    fn resolver_with_overrides(&self) -> PathResolver {
        let Some(store) = &self.store else {
            return self.resolver.clone();
        };
        match store.load() {
            Ok(stored) => {
                let mut config = self.resolver.config().clone();
                if let Some(runtime) = stored.runtime_path {
                    config = config.prefer_runtime(runtime);
                }
                if let Some(backend) = stored.backend_root {
                    config = config.prefer_backend_root(backend);
                }
                PathResolver::new(config)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load persisted overrides");
                self.resolver.clone()
            }
        }
    }

    fn announce(&self, location: &RuntimeLocation) {
        self.emitter.emit(BridgeEvent::LocationChanged {
            runtime_path: location.runtime_path.clone(),
            backend_root: location.backend_root.clone(),
        });
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Cancel every in-flight invocation. Later calls fail as cancelled.
    pub fn shutdown(&self) {
        info!("Gateway shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Token that fires when either the caller or the gateway cancels.
    fn link(&self, caller: &CancellationToken) -> CancellationToken {
        let linked = self.shutdown.child_token();
        if caller.is_cancelled() {
            linked.cancel();
            return linked;
        }
        let (caller, watch) = (caller.clone(), linked.clone());
        tokio::spawn(async move {
            tokio::select! {
                () = caller.cancelled() => watch.cancel(),
                () = watch.cancelled() => {}
            }
        });
        linked
    }

    async fn invoke<T, F, Fut>(
        &self,
        operation: Operation,
        caller: &CancellationToken,
        call: F,
    ) -> Envelope<T>
    where
        F: FnOnce(ResolvedLocation, CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let snapshot = self.location.load_full();
        let result = match snapshot.require(&self.bridge.config().entry_file) {
            Ok(location) => {
                let token = self.link(caller);
                // Cancelling on drop also stops the link watcher.
                let _guard = token.clone().drop_guard();
                call(location, token).await
            }
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(data) => {
                debug!(%operation, "Operation succeeded");
                Envelope::ok(data)
            }
            Err(e) => {
                error!(%operation, kind = e.kind(), error = %e, "Operation failed");
                Envelope::err(e.to_string())
            }
        }
    }

    // =========================================================================
    // Backend operations
    // =========================================================================

    pub async fn ping(&self, cancel: &CancellationToken) -> Envelope<PingResult> {
        self.invoke(Operation::Ping, cancel, |loc, token| async move {
            self.bridge.ping(&loc, &token).await
        })
        .await
    }

    pub async fn status(&self, cancel: &CancellationToken) -> Envelope<StatusReport> {
        self.invoke(Operation::Status, cancel, |loc, token| async move {
            self.bridge.status(&loc, &token).await
        })
        .await
    }

    pub async fn list_sessions(&self, cancel: &CancellationToken) -> Envelope<Vec<SessionSummary>> {
        self.invoke(Operation::ListSessions, cancel, |loc, token| async move {
            self.bridge.list_sessions(&loc, &token).await
        })
        .await
    }

    pub async fn list_specs(&self, cancel: &CancellationToken) -> Envelope<Vec<SpecSummary>> {
        self.invoke(Operation::ListSpecs, cancel, |loc, token| async move {
            self.bridge.list_specs(&loc, &token).await
        })
        .await
    }

    pub async fn start_session(
        &self,
        request: &StartSessionRequest,
        cancel: &CancellationToken,
    ) -> Envelope<CommandOutput> {
        self.invoke(Operation::StartSession, cancel, |loc, token| async move {
            self.bridge.start_session(&loc, request, &token).await
        })
        .await
    }

    pub async fn run_qa(
        &self,
        request: &RunQaRequest,
        cancel: &CancellationToken,
    ) -> Envelope<CommandOutput> {
        self.invoke(Operation::RunQa, cancel, |loc, token| async move {
            self.bridge.run_qa(&loc, request, &token).await
        })
        .await
    }

    pub async fn resume_session(
        &self,
        request: &ResumeSessionRequest,
        cancel: &CancellationToken,
    ) -> Envelope<CommandOutput> {
        self.invoke(Operation::ResumeSession, cancel, |loc, token| async move {
            self.bridge.resume_session(&loc, request, &token).await
        })
        .await
    }

    pub async fn merge_spec(
        &self,
        request: &SpecTargetRequest,
        cancel: &CancellationToken,
    ) -> Envelope<CommandOutput> {
        self.invoke(Operation::MergeSpec, cancel, |loc, token| async move {
            self.bridge.merge_spec(&loc, request, &token).await
        })
        .await
    }

    pub async fn discard_spec(
        &self,
        request: &SpecTargetRequest,
        cancel: &CancellationToken,
    ) -> Envelope<CommandOutput> {
        self.invoke(Operation::DiscardSpec, cancel, |loc, token| async move {
            self.bridge.discard_spec(&loc, request, &token).await
        })
        .await
    }

    pub async fn backend_version(&self, cancel: &CancellationToken) -> Envelope<BackendVersion> {
        self.invoke(Operation::BackendVersion, cancel, |loc, token| async move {
            self.bridge.backend_version(&loc, &token).await
        })
        .await
    }
}
