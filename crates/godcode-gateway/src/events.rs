//! Named-channel event bus for host → caller notifications.
//!
//! Listeners subscribe per channel and get a [`Subscription`] back. Disposing
//! the subscription removes that one listener and nothing else. Dropping it
//! without disposing keeps the listener registered.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use godcode_core::{BridgeEvent, EventEmitter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

pub use godcode_core::events::names;

/// Callback invoked with each payload published on its channel.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Wire form of a pushed event: `{ "event": <channel>, "payload": <json> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    pub event: String,
    pub payload: Value,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<String, Vec<(u64, Listener)>>>,
}

/// Fan-out of events to per-channel listeners. Cheap to clone.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("EventBus")
            .field("channels", &channels)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` on `channel`.
    pub fn subscribe<F>(&self, channel: &str, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        trace!(channel, id, "Listener subscribed");

        Subscription {
            bus: Arc::downgrade(&self.inner),
            channel: channel.to_string(),
            id,
        }
    }

    /// Deliver `payload` to every listener on `channel`. Returns how many
    /// listeners were called.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// dispose from inside the callback. A panicking listener is logged and
    /// skipped.
    pub fn publish(&self, channel: &str, payload: &Value) -> usize {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        for listener in &listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(payload))).is_err() {
                warn!(channel, "Event listener panicked");
            }
        }
        listeners.len()
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map_or(0, Vec::len)
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: BridgeEvent) {
        match serde_json::to_value(&event) {
            Ok(payload) => {
                self.publish(event.event_name(), &payload);
            }
            Err(e) => warn!(event = event.event_name(), error = %e, "Failed to serialize event"),
        }
    }

    fn clone_box(&self) -> Box<dyn EventEmitter> {
        Box::new(self.clone())
    }
}

/// Handle for one registered listener.
#[derive(Debug)]
#[must_use = "dropping a subscription keeps the listener; call `dispose` to remove it"]
pub struct Subscription {
    bus: Weak<BusInner>,
    channel: String,
    id: u64,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Remove exactly this listener. Returns `false` if the bus is gone.
    pub fn dispose(self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let mut listeners = bus
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = listeners.get_mut(&self.channel) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(id, _)| *id != self.id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(&self.channel);
        }
        trace!(channel = %self.channel, id = self.id, removed, "Listener disposed");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn publish_reaches_every_listener_on_the_channel() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let (a, b) = (Arc::clone(&hits), Arc::clone(&hits));
        let _s1 = bus.subscribe("progress", move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let _s2 = bus.subscribe("progress", move |_| {
            b.fetch_add(10, Ordering::SeqCst);
        });
        let _other = bus.subscribe("other", |_| panic!("wrong channel"));

        assert_eq!(bus.publish("progress", &json!({"pct": 50})), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn dispose_removes_only_that_listener() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (a, b) = (Arc::clone(&seen), Arc::clone(&seen));
        let first = bus.subscribe("ch", move |v| a.lock().unwrap().push(format!("a:{v}")));
        let _second = bus.subscribe("ch", move |v| b.lock().unwrap().push(format!("b:{v}")));

        assert!(first.dispose());
        bus.publish("ch", &json!(1));

        assert_eq!(*seen.lock().unwrap(), ["b:1"]);
        assert_eq!(bus.listener_count("ch"), 1);
    }

    #[test]
    fn identical_listeners_are_tracked_separately() {
        let bus = EventBus::new();
        let listener = |_: &Value| {};
        let a = bus.subscribe("ch", listener);
        let b = bus.subscribe("ch", listener);
        assert!(a.dispose());
        assert_eq!(bus.listener_count("ch"), 1);
        assert!(b.dispose());
        assert_eq!(bus.listener_count("ch"), 0);
    }

    #[test]
    fn dispose_after_bus_is_gone_is_harmless() {
        let bus = EventBus::new();
        let sub = bus.subscribe("ch", |_| {});
        drop(bus);
        assert!(!sub.dispose());
    }

    #[test]
    fn panicking_listener_does_not_stop_delivery() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _bad = bus.subscribe("ch", |_| panic!("listener bug"));
        let _good = bus.subscribe("ch", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish("ch", &Value::Null), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bridge_events_use_their_channel_names() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let _sub = bus.subscribe(names::LOCATION_CHANGED, move |v| {
            *sink.lock().unwrap() = Some(v.clone());
        });

        bus.emit(BridgeEvent::LocationChanged {
            runtime_path: Some("/usr/bin/python3".into()),
            backend_root: None,
        });

        let payload = seen.lock().unwrap().clone().unwrap();
        assert_eq!(payload["runtimePath"], "/usr/bin/python3");
        assert_eq!(payload["type"], "location_changed");
    }
}
