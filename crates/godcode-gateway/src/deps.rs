//! Dependency injection for [`Gateway`](crate::Gateway).

use std::sync::Arc;

use godcode_core::{EventEmitter, LocationStore};
use godcode_runtime::{CommandBridge, PathResolver};

/// Everything a gateway needs, provided up front.
///
/// ```ignore
/// let deps = GatewayDeps::new(bridge, resolver, Arc::new(bus.clone()))
///     .with_store(Arc::new(EnvFileLocationStore::from_data_root()?));
/// let gateway = Gateway::start(deps).await;
/// ```
pub struct GatewayDeps {
    pub(crate) bridge: CommandBridge,
    pub(crate) resolver: PathResolver,
    pub(crate) emitter: Arc<dyn EventEmitter>,
    pub(crate) store: Option<Arc<dyn LocationStore>>,
}

impl GatewayDeps {
    pub fn new(
        bridge: CommandBridge,
        resolver: PathResolver,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            bridge,
            resolver,
            emitter,
            store: None,
        }
    }

    /// Persist setter writes through `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn LocationStore>) -> Self {
        self.store = Some(store);
        self
    }
}
