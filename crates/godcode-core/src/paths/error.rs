//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from path resolution and `.env` persistence.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Cannot determine system data directory")]
    NoDataDir,

    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    #[error("Path cannot be empty")]
    EmptyPath,

    /// Failed to read or write the environment file.
    #[error("Failed to access env file {path}: {reason}")]
    EnvFileError { path: PathBuf, reason: String },

    #[error("Cannot determine current directory: {0}")]
    CurrentDirError(String),
}
