//! Protocol module - the UCI front end
//!
//! # Module Organization
//!
//! - `uci` - [`UciSession`] command loop and the [`MovePicker`] it asks for moves
//! - `error` - [`ProtocolError`]

pub mod error;
pub mod uci;

pub use error::{ProtocolError, ProtocolResult};
pub use uci::{MovePicker, UciSession};
