//! Trainer module - a training session over both colors
//!
//! The [`Trainer`] answers move requests for whichever side the user is not
//! playing. The book of the user's color grades the last move and supplies
//! the reply; when it has none the fallback engine plays instead. Feedback
//! (review counts, end of line, corrections) goes to a [`Notifier`].
//!
//! # Module Organization
//!
//! - `notify` - [`Notifier`] sinks
//! - `fallback` - [`FallbackEngine`] and its UCI engine implementation
//! - `error` - [`TrainerError`]

pub mod error;
pub mod fallback;
pub mod notify;

use std::rc::Rc;

use shakmaty::{ByColor, Color, Move};
use tracing::debug;

use crate::core::TrainerPaths;
use crate::game::GameState;
use crate::repertoire::{RepertoireBook, Scheduler};

pub use error::{TrainerError, TrainerResult};
pub use fallback::FallbackEngine;
pub use notify::{Notifier, RecordingNotifier, StderrNotifier};

/// Played plies below which a game counts as just started
const OPENING_PLIES: usize = 2;

pub const END_OF_VARIATION: &str = "You reached the end of this variation, congratulations!";
pub const WRONG_MOVE: &str = "Sorry, that's not the move!";
pub const NOTHING_TO_REVIEW: &str = "No moves left to review, congratulations!";

/// Training session over the white and black books
pub struct Trainer {
    books: ByColor<RepertoireBook>,
    fallback: Box<dyn FallbackEngine>,
    notifier: Rc<dyn Notifier>,
}

impl Trainer {
    pub fn new(
        books: ByColor<RepertoireBook>,
        fallback: Box<dyn FallbackEngine>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            books,
            fallback,
            notifier,
        }
    }

    /// Open both books in the standard layout
    pub fn open(
        paths: &TrainerPaths,
        scheduler: Scheduler,
        fallback: Box<dyn FallbackEngine>,
        notifier: Rc<dyn Notifier>,
    ) -> TrainerResult<Self> {
        Ok(Self::new(open_books(paths, scheduler)?, fallback, notifier))
    }

    pub fn book(&self, color: Color) -> &RepertoireBook {
        self.books.get(color)
    }

    /// Move for the side to play in `game`
    ///
    /// The user is assumed to play the other side, so the book of that color
    /// is consulted.
    pub fn next_move(&mut self, game: &GameState) -> TrainerResult<Move> {
        if game.ply() < OPENING_PLIES {
            self.report_review_status();
        }

        let trained = !game.turn();
        let query = self.books.get_mut(trained).next_move(game)?;

        if query.bottom_reached {
            self.notifier.send(END_OF_VARIATION);
            self.report_review_status();
        }
        if let Some(correction) = &query.correction {
            if let Some(played) = game.ply().checked_sub(1).and_then(|ply| game.san(ply)) {
                debug!("[TRAINER] {} instead of {}", played, correction);
            }
            self.notifier.send(WRONG_MOVE);
            self.notifier.send(&format!("Correct move: {correction}"));
        }

        match query.mv {
            Some(mv) => Ok(mv),
            None => {
                debug!("[TRAINER] No book move at ply {}, asking the engine", game.ply());
                self.fallback.next_move(game)
            }
        }
    }

    /// Due positions per color
    pub fn pending_counts(&self) -> ByColor<usize> {
        pending_counts(&self.books)
    }

    /// Tell the user how much is left to review
    pub fn report_review_status(&self) {
        for message in review_status_messages(self.pending_counts()) {
            self.notifier.send(&message);
        }
    }
}

/// Open the white and black books with one scheduler
pub fn open_books(
    paths: &TrainerPaths,
    scheduler: Scheduler,
) -> TrainerResult<ByColor<RepertoireBook>> {
    Ok(ByColor {
        white: RepertoireBook::open(paths, Color::White, scheduler.clone())?,
        black: RepertoireBook::open(paths, Color::Black, scheduler)?,
    })
}

pub fn pending_counts(books: &ByColor<RepertoireBook>) -> ByColor<usize> {
    ByColor {
        white: books.white.pending_review_count(),
        black: books.black.pending_review_count(),
    }
}

/// Status report lines for the given pending counts
pub fn review_status_messages(pending: ByColor<usize>) -> Vec<String> {
    if pending.white + pending.black == 0 {
        return vec![NOTHING_TO_REVIEW.to_string()];
    }
    vec![
        format!("{} moves to review as white.", pending.white),
        format!("{} moves to review as black.", pending.black),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_messages() {
        assert_eq!(
            review_status_messages(ByColor { white: 0, black: 0 }),
            vec![NOTHING_TO_REVIEW]
        );
        assert_eq!(
            review_status_messages(ByColor { white: 0, black: 3 }),
            vec!["0 moves to review as white.", "3 moves to review as black."]
        );
    }
}
