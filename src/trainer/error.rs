//! Error types for the trainer session

use chess_engine::EngineError;
use thiserror::Error;

use crate::core::CoreError;
use crate::game::GameError;
use crate::repertoire::RepertoireError;

/// Errors that can stop a training session
#[derive(Error, Debug)]
pub enum TrainerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Repertoire(#[from] RepertoireError),

    /// The fallback engine failed to produce a move
    #[error("Fallback engine failed: {0}")]
    Engine(#[from] EngineError),

    /// A move from the fallback engine does not fit the game
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Result type alias for trainer operations
pub type TrainerResult<T> = Result<T, TrainerError>;
