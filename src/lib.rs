//! # godcode
//!
//! Bridge between a desktop host and the godcode backend program.
//!
//! This package re-exports the workspace crates so a host can depend on a
//! single crate:
//!
//! - `godcode_core` - domain types, error taxonomy, ports, path utilities
//! - `godcode_runtime` - path discovery, the process runner, the command bridge
//! - `godcode_gateway` - the gateway and the caller-facing message channel
//!
//! ```ignore
//! let bus = EventBus::new();
//! let bridge = CommandBridge::new(Arc::new(TokioProcessRunner::default()), BridgeConfig::default())
//!     .with_emitter(Arc::new(bus.clone()));
//! let deps = GatewayDeps::new(bridge, PathResolver::default(), Arc::new(bus.clone()));
//! let channel = MessageChannel::new(Arc::new(Gateway::start(deps).await), bus);
//!
//! let envelope = channel.call("ping", None).await;
//! ```

pub use godcode_core::{
    BridgeError, BridgeEvent, EnvFileLocationStore, Envelope, LocationStore, Operation,
    ProcessRunner, ResolutionError, RuntimeLocation,
};
pub use godcode_gateway::{
    ChannelError, ChannelRequest, EventBus, Gateway, GatewayDeps, MessageChannel, PushEvent,
    Subscription,
};
pub use godcode_runtime::{
    BridgeConfig, CommandBridge, PathResolver, ResolverConfig, RunnerConfig, TokioProcessRunner,
};

/// Event channel names.
pub use godcode_gateway::events::names;

/// Re-export of godcode-core for types not listed above.
pub mod core_types {
    pub use godcode_core::*;
}
