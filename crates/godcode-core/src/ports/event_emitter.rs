//! Event emitter trait for host-to-caller push notifications.
//!
//! Implementations handle transport details (in-process listeners, stdio
//! frames, and so on).

use crate::events::BridgeEvent;

/// Emits bridge events.
///
/// # Implementations
///
/// - `NoopEmitter` for tests and one-shot CLI calls
/// - `EventBus` in the gateway crate, which fans out to subscribers
pub trait EventEmitter: Send + Sync {
    /// Emit an event. Must not block.
    fn emit(&self, event: BridgeEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn EventEmitter>;
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: BridgeEvent) {}

    fn clone_box(&self) -> Box<dyn EventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn noop_emitter_accepts_events() {
        let emitter: Arc<dyn EventEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(BridgeEvent::LocationChanged {
            runtime_path: None,
            backend_root: None,
        });
        let _boxed = emitter.clone_box();
    }
}
