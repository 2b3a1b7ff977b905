//! Error types for the repertoire module
//!
//! Covers reading source and review records, persisting the review tree, and
//! creating backups. Lookups and annotation misses are not errors: they are
//! ordinary outcomes of the scheduler.

use std::path::PathBuf;

use thiserror::Error;

/// Problems found while parsing PGN movetext
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    /// Token is not SAN, or not legal in the position it is played from
    #[error("line {line}: illegal or unreadable move {token:?}")]
    IllegalMove { token: String, line: usize },

    /// `)` without a matching `(`
    #[error("line {line}: unbalanced variation end")]
    UnbalancedVariation { line: usize },

    /// `(` before any move it could be an alternative to
    #[error("line {line}: variation does not follow a move")]
    OrphanVariation { line: usize },

    /// `}` or `]` with nothing to close
    #[error("line {line}: unexpected {ch:?}")]
    UnexpectedChar { ch: char, line: usize },

    /// `{` never closed
    #[error("line {line}: unterminated comment")]
    UnterminatedComment { line: usize },

    /// `[FEN ...]` tag: repertoires always start from the initial position
    #[error("games starting from a custom position are not supported")]
    CustomStartPosition,
}

/// Errors that can occur while loading or saving a repertoire book
#[derive(Error, Debug)]
pub enum RepertoireError {
    /// Reading or writing a record failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be parsed
    #[error("Invalid PGN in {}: {source}", path.display())]
    Pgn {
        path: PathBuf,
        #[source]
        source: PgnError,
    },

    /// Pruned moves could not be backed up; the review file is left untouched
    #[error("Failed to back up {} to {}: {source}", from.display(), to.display())]
    Backup {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for repertoire operations
pub type RepertoireResult<T> = Result<T, RepertoireError>;
