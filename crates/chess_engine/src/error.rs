//! Error types for the engine bridge
//!
//! Covers the lifecycle of an external UCI engine process: locating the
//! binary, spawning it, talking to it over pipes, and interpreting its replies.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while driving an external engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine binary does not exist
    #[error("Missing engine binary: {}", path.display())]
    Missing { path: PathBuf },

    /// Engine binary exists but cannot be executed
    #[error("Engine binary is not executable: {}", path.display())]
    NotExecutable { path: PathBuf },

    /// Process could not be started
    #[error("Failed to start engine {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the engine pipes failed
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A standard stream of the child was not captured
    #[error("Engine {stream} handle unavailable")]
    Pipe { stream: &'static str },

    /// Engine closed its output before answering
    #[error("Engine terminated while waiting for `{expected}`")]
    Terminated { expected: &'static str },

    /// Engine answered with something that is not a usable move
    #[error("Engine protocol error: {message}")]
    Protocol { message: String },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
