//! Persistence port for the two user-configurable paths.

use serde::{Deserialize, Serialize};

use crate::paths::PathError;

/// Raw values as they were persisted. `None` means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPaths {
    pub runtime_path: Option<String>,
    pub backend_root: Option<String>,
}

/// Loads and saves the runtime path and backend root overrides.
///
/// Saving an empty string clears the stored value.
pub trait LocationStore: Send + Sync {
    fn load(&self) -> Result<StoredPaths, PathError>;

    fn save_runtime_path(&self, value: &str) -> Result<(), PathError>;

    fn save_backend_root(&self, value: &str) -> Result<(), PathError>;
}
