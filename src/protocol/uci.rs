//! Minimal UCI command loop
//!
//! Enough of the Universal Chess Interface for a GUI or a bot bridge to play
//! against the trainer:
//!
//! | Command                                   | Reply                        |
//! |-------------------------------------------|------------------------------|
//! | `uci`                                     | `id name`, `id author`, `uciok` |
//! | `isready`                                 | `readyok`                    |
//! | `ucinewgame`                              | nothing                      |
//! | `position startpos\|fen <fen> [moves ..]` | nothing                      |
//! | `go ...`                                  | `bestmove <move>`            |
//! | `d`                                       | FEN of the current position  |
//! | `quit`                                    | ends the session             |
//!
//! Anything else is ignored. Search limits given to `go` are ignored too:
//! the trainer answers from its book or lets the fallback engine use its own
//! fixed budget.

use std::io::{BufRead, Write};

use shakmaty::uci::Uci;
use shakmaty::Move;
use tracing::{debug, warn};

use crate::game::{GameResult, GameState};
use crate::protocol::error::ProtocolResult;
use crate::trainer::{Trainer, TrainerResult};

pub const ENGINE_NAME: &str = "Repertoire Trainer";
pub const ENGINE_AUTHOR: &str = "trilltino";

/// FEN fields following `position fen`
const FEN_FIELDS: usize = 6;

/// Source of the moves answered to `go`
pub trait MovePicker {
    fn pick_move(&mut self, game: &GameState) -> TrainerResult<Move>;
}

impl MovePicker for Trainer {
    fn pick_move(&mut self, game: &GameState) -> TrainerResult<Move> {
        self.next_move(game)
    }
}

/// Whether the loop keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// One UCI session: the current game and the picker answering `go`
pub struct UciSession<P> {
    picker: P,
    game: GameState,
}

impl<P: MovePicker> UciSession<P> {
    pub fn new(picker: P) -> Self {
        Self {
            picker,
            game: GameState::new(),
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn picker(&self) -> &P {
        &self.picker
    }

    /// Serve commands from `input` until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> ProtocolResult<()> {
        for line in input.lines() {
            let line = line?;
            if self.handle(&line, output)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    fn handle<W: Write>(&mut self, line: &str, output: &mut W) -> ProtocolResult<Flow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            return Ok(Flow::Continue);
        };

        match command {
            "quit" => return Ok(Flow::Quit),
            "uci" => {
                writeln!(output, "id name {ENGINE_NAME}")?;
                writeln!(output, "id author {ENGINE_AUTHOR}")?;
                writeln!(output, "uciok")?;
            }
            "isready" => writeln!(output, "readyok")?,
            "ucinewgame" => {}
            "position" => match parse_position(&tokens[1..]) {
                Ok(Some(game)) => self.game = game,
                Ok(None) => debug!("Ignoring malformed command: {}", line),
                Err(err) => warn!("Ignoring position: {}", err),
            },
            "d" => writeln!(output, "{}", self.game.fen())?,
            "go" => {
                let mv = self.picker.pick_move(&self.game)?;
                writeln!(output, "bestmove {}", Uci::from_standard(&mv))?;
            }
            _ => debug!("Ignoring unknown command: {}", line),
        }
        output.flush()?;
        Ok(Flow::Continue)
    }
}

/// Game described by the arguments of `position`, `None` if they are malformed
fn parse_position(args: &[&str]) -> GameResult<Option<GameState>> {
    let (mut game, rest) = match args.first() {
        Some(&"startpos") => (GameState::new(), &args[1..]),
        Some(&"fen") if args.len() > FEN_FIELDS => {
            let fen = args[1..=FEN_FIELDS].join(" ");
            (GameState::from_fen(&fen)?, &args[FEN_FIELDS + 1..])
        }
        _ => return Ok(None),
    };

    match rest.split_first() {
        None => {}
        Some((&"moves", moves)) => {
            for mv in moves {
                game.push_uci(mv)?;
            }
        }
        Some(_) => return Ok(None),
    }
    Ok(Some(game))
}
