//! Telemetry error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors that can occur during telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A required input was not supplied (or was blank)
    #[error("missing required field '{field}' (flag -{flag} or ${env})")]
    MissingField {
        /// Human readable field name
        field: &'static str,
        /// Short command-line flag
        flag: char,
        /// Environment variable equivalent
        env: &'static str,
    },

    /// An input was supplied but could not be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// State file or its directory could not be read, created or written
    #[error("state file '{path}': {source}")]
    Storage {
        /// Path that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Network error during report submission (connect failure, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Server returned an error status
    #[error("server error: HTTP {0}")]
    Server(u16),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TelemetryError {
    /// Wrap an IO error with the state path it concerns
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
