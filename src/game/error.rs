//! Error types for game module
//!
//! Provides custom error types for building a game from protocol input:
//! start positions and the moves played from them.

/// Errors that can occur in game logic
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// FEN text could not be parsed or describes an impossible position
    #[error("Invalid FEN {fen:?}: {message}")]
    InvalidFen { fen: String, message: String },

    /// Move text is not UCI notation
    #[error("Invalid UCI move {text:?}: {message}")]
    InvalidUci { text: String, message: String },

    /// Move is well formed but not legal in the current position
    #[error("Illegal move {text} at ply {ply}")]
    IllegalMove { text: String, ply: usize },
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
