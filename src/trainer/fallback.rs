//! Fallback move source for positions the repertoire does not cover

use chess_engine::UciEngine;
use shakmaty::Move;
use tracing::debug;

use crate::game::GameState;
use crate::trainer::error::TrainerResult;

/// Anything that can always answer with a legal move
pub trait FallbackEngine {
    fn next_move(&mut self, game: &GameState) -> TrainerResult<Move>;
}

impl FallbackEngine for UciEngine {
    fn next_move(&mut self, game: &GameState) -> TrainerResult<Move> {
        let uci = self.best_move(game.start_fen(), &game.uci_moves())?;
        let mv = game.resolve_uci(&uci)?;
        debug!("[ENGINE] Fallback move {} at ply {}", uci, game.ply());
        Ok(mv)
    }
}
