//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the bridge expects from infrastructure. They
//! use only domain types and never leak process or filesystem details.

pub mod event_emitter;
pub mod location_store;
pub mod process_runner;

pub use event_emitter::{EventEmitter, NoopEmitter};
pub use location_store::{LocationStore, StoredPaths};
pub use process_runner::ProcessRunner;
