//! Core domain types and port definitions for godcode.
//!
//! This crate holds everything the bridge layers agree on: the runtime
//! location record, invocation types, the operation catalog, the response
//! envelope, the error taxonomy, and the port traits that adapters implement.
//! It performs no process spawning of its own.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod paths;
pub mod ports;

pub use domain::{
    BackendCommand, BackendVersion, CommandOutput, DEFAULT_ENTRY_FILE, Envelope, Invocation,
    InvocationResult, InvocationState, LocationUpdate, Operation, PingResult, ResolvedLocation,
    ResumeSessionRequest, RunQaRequest, RuntimeLocation, SessionSummary, SetPathRequest,
    SpecSummary, SpecTargetRequest, StartSessionRequest, StatusReport, TRUNCATION_MARKER,
};
pub use error::{BridgeError, ResolutionError};
pub use events::BridgeEvent;
pub use ports::{EventEmitter, LocationStore, NoopEmitter, ProcessRunner, StoredPaths};

// Re-export path utilities
pub use paths::{
    BACKEND_ROOT_KEY, EnvFileLocationStore, PathError, RUNTIME_PATH_KEY, data_root, env_file_path,
    normalize_executable_path, normalize_optional_path, normalize_user_path, repo_root,
    resource_root,
};
