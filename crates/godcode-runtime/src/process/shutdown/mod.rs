//! Forced termination of backend invocations.
//!
//! Children are spawned as process-group leaders on Unix, so signalling the
//! group also reaches anything the backend forked.

mod child;

pub use child::{kill_group, terminate_child};
