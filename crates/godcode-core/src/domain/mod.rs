//! Domain types shared by every bridge layer.
//!
//! - `location` - where the runtime and backend program live
//! - `invocation` - one spawn-and-wait cycle and its result
//! - `operation` - the fixed catalog of caller-visible operations
//! - `envelope` - the uniform response wrapper crossing the caller boundary

mod envelope;
mod invocation;
mod location;
mod operation;

pub use envelope::Envelope;
pub use invocation::{Invocation, InvocationResult, InvocationState, TRUNCATION_MARKER};
pub use location::{DEFAULT_ENTRY_FILE, LocationUpdate, ResolvedLocation, RuntimeLocation};
pub use operation::{
    BackendCommand, BackendVersion, CommandOutput, Operation, PingResult, ResumeSessionRequest,
    RunQaRequest, SessionSummary, SetPathRequest, SpecSummary, SpecTargetRequest,
    StartSessionRequest, StatusReport,
};
