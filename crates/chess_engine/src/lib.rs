//! External chess engine bridge
//!
//! Drives a full-strength engine binary (Stockfish or any other UCI engine)
//! as a child process. The trainer only falls back to it once the repertoire
//! has nothing to say about the current position, so the surface is small:
//! spawn, ask for a move under a fixed time budget, quit.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut engine = UciEngine::spawn("/usr/bin/stockfish", Duration::from_secs(1))?;
//! let reply = engine.best_move(None, &["e2e4".to_string()])?;
//! println!("bestmove {reply}");
//! ```

pub mod error;
pub mod uci;

pub use error::{EngineError, EngineResult};
pub use uci::UciEngine;
