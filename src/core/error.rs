//! Error types for core module
//!
//! Provides custom error types for core functionality including settings
//! persistence and home directory resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the core module
#[derive(Error, Debug)]
pub enum CoreError {
    /// File system error on settings or data directories
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings serialization/deserialization error
    #[error("Settings serialization error: {0}")]
    SettingsSerialization(#[from] serde_json::Error),

    /// A duration setting could not be parsed or is out of range
    #[error("Invalid duration {value:?}: {message}")]
    InvalidDuration { value: String, message: String },

    /// Interval configuration that cannot produce a schedule
    #[error("Invalid review configuration: {message}")]
    InvalidReviewConfig { message: String },

    /// No home directory to put the trainer data in
    #[error("Could not determine the user's home directory")]
    NoHomeDirectory,
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
