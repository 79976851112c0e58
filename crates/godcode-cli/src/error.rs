//! CLI-specific error types and exit-code mapping.

use godcode_core::paths::PathError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or payload parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The operation ran and reported failure.
    #[error("{0}")]
    Operation(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// - 1: operation failed
    /// - 2: invalid arguments (`EX_USAGE` style)
    /// - 64-78: sysexits.h categories
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Operation(_) => 1,
            Self::Arguments(_) => 2,
            Self::Internal(_) => 70, // EX_SOFTWARE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error bubbled up to `main`.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_sysexits() {
        assert_eq!(CliError::Arguments(String::new()).exit_code(), 2);
        assert_eq!(CliError::Config(String::new()).exit_code(), 78);
        assert_eq!(CliError::from(PathError::NoDataDir).exit_code(), 78);
    }

    #[test]
    fn anyhow_errors_keep_their_cli_code() {
        let err = anyhow::Error::from(CliError::Io("disk full".into()));
        assert_eq!(exit_code_for(&err), 74);
        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), 1);
    }
}
