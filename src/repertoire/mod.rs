//! Repertoire module - move trees, their review schedules and their files
//!
//! # Module Organization
//!
//! - `tree` - [`MoveTree`] arena of positions reached from the initial position
//! - `annotation` - [`ReviewAnnotation`] codec for the tags stored in comments
//! - `pgn` - PGN reader and writer for source files and review records
//! - `merge` - folding source trees into one canonical tree
//! - `reconcile` - carrying schedules over from the previous record
//! - `scheduler` - [`Scheduler`] query and update rules
//! - `book` - [`RepertoireBook`], the per-color lifecycle tying it together
//! - `error` - [`RepertoireError`] and [`PgnError`]
//!
//! # Data Flow
//!
//! ```text
//! repertoire/<color>/**.pgn ──read──▶ merge ──▶ reconcile ◀──read── review/<color>.pgn
//!                                                  │
//!                                                  ▼
//!                          RepertoireBook ──save after each update──▶ review/<color>.pgn
//! ```

pub mod annotation;
pub mod book;
pub mod error;
pub mod merge;
pub mod pgn;
pub mod reconcile;
pub mod scheduler;
pub mod tree;

pub use annotation::ReviewAnnotation;
pub use book::RepertoireBook;
pub use error::{PgnError, RepertoireError, RepertoireResult};
pub use scheduler::{Location, Outcome, ReviewQuery, Scheduler};
pub use tree::{MoveTree, NodeId};
