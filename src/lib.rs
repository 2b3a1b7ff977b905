//! Opening repertoire trainer
//!
//! Trains a player to reproduce a prepared opening repertoire with spaced
//! repetition, while posing as a UCI engine. The user plays one color in any
//! UCI front end; the trainer answers with the other color's moves from the
//! repertoire, choosing the branch that is due for review the soonest, and
//! grades every answer of the user.
//!
//! # Module Organization
//!
//! - `core` - configuration, clock and paths
//! - `game` - [`game::GameState`], the moves played so far
//! - `repertoire` - move trees, review scheduling and PGN persistence
//! - `trainer` - the session over both colors, with engine fallback
//! - `protocol` - UCI command loop

pub mod core;
pub mod game;
pub mod protocol;
pub mod repertoire;
pub mod trainer;
