//! Path utilities for godcode data directories and persisted overrides.
//!
//! - Data root (where `.env` lives)
//! - Resource root (bundled backend lookup)
//! - `.env` persistence of the runtime path and backend root
//!
//! OS-specific logic is kept private in `platform`.

mod config;
mod error;
mod platform;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::PathError;

pub use platform::{
    data_root, normalize_executable_path, normalize_optional_path, normalize_user_path, repo_root,
    resource_root,
};

pub use config::{BACKEND_ROOT_KEY, EnvFileLocationStore, RUNTIME_PATH_KEY, env_file_path};
