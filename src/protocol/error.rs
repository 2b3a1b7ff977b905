//! Error types for the protocol loop
//!
//! Malformed commands are not errors; they are logged and skipped. Only a
//! broken stream or a picker that cannot move ends the session.

use thiserror::Error;

use crate::trainer::TrainerError;

#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Reading a command or writing a reply failed
    #[error("Protocol stream error: {0}")]
    Io(#[from] std::io::Error),

    /// No move could be produced for `go`
    #[error(transparent)]
    Picker(#[from] TrainerError),
}

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
