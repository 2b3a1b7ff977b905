//! Game module - the position and move history the trainer reasons about
//!
//! # Module Organization
//!
//! - `state` - [`GameState`], moves played from a start position
//! - `error` - [`GameError`] for malformed or illegal protocol input

pub mod error;
pub mod state;

pub use error::{GameError, GameResult};
pub use state::{san_of, GameState};
