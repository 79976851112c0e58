//! Caller-facing surface of godcode.
//!
//! - [`Gateway`]: owns the runtime location and serves each operation
//! - [`MessageChannel`]: validates named requests and dispatches them
//! - [`EventBus`]: named-channel push notifications with disposable
//!   subscriptions

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod channel;
mod deps;
mod error;
pub mod events;
mod gateway;

pub use channel::{ChannelRequest, MessageChannel, Request};
pub use deps::GatewayDeps;
pub use error::ChannelError;
pub use events::{EventBus, Listener, PushEvent, Subscription};
pub use gateway::Gateway;
