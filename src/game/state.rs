//! Game state - the sequence of moves played so far
//!
//! [`GameState`] is what the protocol layer hands to the trainer: a start
//! position plus every move played from it. Legality is delegated entirely
//! to `shakmaty`; the repertoire code only ever compares moves for equality
//! and asks for notation.
//!
//! # Positions
//!
//! Every intermediate position is kept, so `position_before(ply)` is a lookup
//! rather than a replay. Index 0 is the start position, index `n` the position
//! after `n` moves.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::game::error::{GameError, GameResult};

/// Moves played from a start position
#[derive(Debug, Clone)]
pub struct GameState {
    /// FEN of a non-standard start position, `None` for the initial position
    start_fen: Option<String>,
    /// `positions[i]` is the position after `i` moves
    positions: Vec<Chess>,
    moves: Vec<Move>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Standard initial position, no moves
    pub fn new() -> Self {
        Self {
            start_fen: None,
            positions: vec![Chess::default()],
            moves: Vec::new(),
        }
    }

    /// Start from an arbitrary position
    ///
    /// A FEN that describes the standard initial position yields the same
    /// state as [`GameState::new`].
    pub fn from_fen(fen: &str) -> GameResult<Self> {
        let parsed = Fen::from_ascii(fen.as_bytes()).map_err(|err| GameError::InvalidFen {
            fen: fen.to_string(),
            message: err.to_string(),
        })?;
        let position: Chess =
            parsed
                .into_position(CastlingMode::Standard)
                .map_err(|err| GameError::InvalidFen {
                    fen: fen.to_string(),
                    message: err.to_string(),
                })?;

        let normalized = Fen::from_position(position.clone(), EnPassantMode::Legal);
        let initial = Fen::from_position(Chess::default(), EnPassantMode::Legal);
        let start_fen = (normalized != initial).then(|| normalized.to_string());

        Ok(Self {
            start_fen,
            positions: vec![position],
            moves: Vec::new(),
        })
    }

    /// Play a move given in UCI notation (`e2e4`, `e7e8q`, `e1g1`)
    pub fn push_uci(&mut self, text: &str) -> GameResult<()> {
        let uci = Uci::from_ascii(text.as_bytes()).map_err(|err| GameError::InvalidUci {
            text: text.to_string(),
            message: err.to_string(),
        })?;
        let mv = self.resolve_uci(&uci)?;
        self.push(mv)
    }

    /// Play a move given in SAN (`Nf3`, `exd5`, `O-O`, `Qf3+`)
    pub fn push_san(&mut self, text: &str) -> GameResult<()> {
        let illegal = || GameError::IllegalMove {
            text: text.to_string(),
            ply: self.ply(),
        };
        let san: SanPlus = text.parse().map_err(|_| illegal())?;
        let mv = san.san.to_move(self.position()).map_err(|_| illegal())?;
        self.push(mv)
    }

    /// Play an already resolved move
    pub fn push(&mut self, mv: Move) -> GameResult<()> {
        let next = self
            .position()
            .clone()
            .play(&mv)
            .map_err(|_| GameError::IllegalMove {
                text: Uci::from_standard(&mv).to_string(),
                ply: self.ply(),
            })?;
        self.positions.push(next);
        self.moves.push(mv);
        Ok(())
    }

    /// Resolve a UCI move against the current position
    pub fn resolve_uci(&self, uci: &Uci) -> GameResult<Move> {
        uci.to_move(self.position())
            .map_err(|_| GameError::IllegalMove {
                text: uci.to_string(),
                ply: self.ply(),
            })
    }

    /// Moves played so far, in order
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of half-moves played
    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    /// Side to move in the current position
    pub fn turn(&self) -> Color {
        self.position().turn()
    }

    /// Current position
    pub fn position(&self) -> &Chess {
        // positions always holds the start position
        &self.positions[self.positions.len() - 1]
    }

    /// Position after `ply` moves, `None` beyond the current ply
    pub fn position_before(&self, ply: usize) -> Option<&Chess> {
        self.positions.get(ply)
    }

    /// SAN of the move played at index `ply`
    pub fn san(&self, ply: usize) -> Option<String> {
        let mv = self.moves.get(ply)?;
        Some(san_of(&self.positions[ply], mv))
    }

    /// Moves in UCI notation, as sent to an engine
    pub fn uci_moves(&self) -> Vec<String> {
        self.moves
            .iter()
            .map(|mv| Uci::from_standard(mv).to_string())
            .collect()
    }

    /// FEN of a non-standard start position
    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    /// Whether the game began from the standard initial position
    pub fn is_standard_start(&self) -> bool {
        self.start_fen.is_none()
    }

    /// FEN of the current position
    pub fn fen(&self) -> String {
        Fen::from_position(self.position().clone(), EnPassantMode::Legal).to_string()
    }
}

/// SAN of `mv` played from `position`, with check or mate suffix
pub fn san_of(position: &Chess, mv: &Move) -> String {
    SanPlus::from_move(position.clone(), mv).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_is_standard() {
        //! A fresh game starts from the initial position with White to move
        let game = GameState::new();
        assert!(game.is_standard_start());
        assert_eq!(game.ply(), 0);
        assert_eq!(game.turn(), Color::White);
        assert!(game.uci_moves().is_empty());
    }

    #[test]
    fn test_push_uci_tracks_turn_and_notation() {
        let mut game = GameState::new();
        game.push_uci("e2e4").unwrap();
        game.push_uci("e7e5").unwrap();
        game.push_uci("g1f3").unwrap();

        assert_eq!(game.ply(), 3);
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.san(2).as_deref(), Some("Nf3"));
        assert_eq!(game.uci_moves(), vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn test_castling_in_both_notations() {
        //! King-two-squares UCI and O-O SAN resolve to the same move
        let mut by_uci = GameState::new();
        let mut by_san = GameState::new();
        for (uci, san) in [
            ("e2e4", "e4"),
            ("e7e5", "e5"),
            ("g1f3", "Nf3"),
            ("b8c6", "Nc6"),
            ("f1c4", "Bc4"),
            ("g8f6", "Nf6"),
            ("e1g1", "O-O"),
        ] {
            by_uci.push_uci(uci).unwrap();
            by_san.push_san(san).unwrap();
        }
        assert_eq!(by_uci.moves(), by_san.moves());
        assert_eq!(by_uci.san(6).as_deref(), Some("O-O"));
    }

    #[test]
    fn test_check_suffix_in_san() {
        let mut game = GameState::new();
        for san in ["e4", "f5", "Qh5+"] {
            game.push_san(san).unwrap();
        }
        assert_eq!(game.san(2).as_deref(), Some("Qh5+"));
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut game = GameState::new();
        assert!(matches!(
            game.push_uci("e2e5"),
            Err(GameError::IllegalMove { ply: 0, .. })
        ));
        assert!(matches!(
            game.push_uci("zz"),
            Err(GameError::InvalidUci { .. })
        ));
        assert_eq!(game.ply(), 0);
    }

    #[test]
    fn test_from_fen() {
        //! Only a genuinely different start position is flagged as non-standard
        let standard =
            GameState::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(standard.is_standard_start());

        let custom = GameState::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert!(!custom.is_standard_start());
        assert_eq!(custom.start_fen(), Some("4k3/8/8/8/8/8/8/4K2R w K - 0 1"));

        assert!(GameState::from_fen("not a fen").is_err());
    }

    #[test]
    fn test_position_before() {
        let mut game = GameState::new();
        game.push_uci("d2d4").unwrap();
        assert_eq!(game.position_before(0).unwrap().turn(), Color::White);
        assert_eq!(game.position_before(1).unwrap().turn(), Color::Black);
        assert!(game.position_before(2).is_none());
    }
}
