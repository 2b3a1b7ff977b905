//! PGN reading and writing for move trees
//!
//! Source repertoires and persisted review records are both plain PGN files.
//! Only what a repertoire needs is kept: the tree of moves (variations
//! included) and the comment of each node. Tag pairs are read and skipped;
//! the writer emits the Seven Tag Roster with placeholder values.
//!
//! # Reading
//!
//! - Only the first game of a file is read.
//! - Moves are SAN, resolved with `shakmaty` against the position they are
//!   played from; move numbers, NAGs, `!`/`?` suffixes and results are skipped.
//! - A comment after a move belongs to the node that move reached; a comment
//!   before the first move belongs to the root; a comment opening a variation
//!   is dropped. Several comments on one node are joined with a space.
//!
//! # Writing
//!
//! Export order is main move, then each sibling variation in parentheses,
//! then the main continuation. Lines wrap at 80 columns.

use shakmaty::san::SanPlus;
use shakmaty::{Chess, Color, Move, Position};

use crate::game::san_of;
use crate::repertoire::error::PgnError;
use crate::repertoire::tree::{MoveTree, NodeId};

const LINE_WIDTH: usize = 80;

const SEVEN_TAG_ROSTER: [(&str, &str); 7] = [
    ("Event", "?"),
    ("Site", "?"),
    ("Date", "????.??.??"),
    ("Round", "?"),
    ("White", "?"),
    ("Black", "?"),
    ("Result", "*"),
];

/// Parse the first game of a PGN text into a move tree
///
/// An empty text, or one holding only tags, yields a tree with just the root.
pub fn read_game(text: &str) -> Result<MoveTree, PgnError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut tree = MoveTree::new();
    let mut frame = Frame {
        node: tree.root(),
        position: Chess::default(),
        previous: None,
    };
    let mut stack: Vec<Frame> = Vec::new();
    let mut movetext_started = false;
    let mut lexer = Lexer::new(text);

    while let Some(token) = lexer.next_token()? {
        let line = lexer.line;
        match token {
            Token::Tag { name, value } => {
                if movetext_started {
                    // tags of the next game
                    break;
                }
                if name == "FEN" && !value.trim().is_empty() {
                    return Err(PgnError::CustomStartPosition);
                }
            }
            Token::Comment(comment) => {
                movetext_started = true;
                let comment = comment.trim();
                if comment.is_empty() {
                    continue;
                }
                if frame.previous.is_some() || stack.is_empty() {
                    append_comment(&mut tree, frame.node, comment);
                }
            }
            Token::VariationStart => {
                movetext_started = true;
                let Some((node, position)) = frame.previous.clone() else {
                    return Err(PgnError::OrphanVariation { line });
                };
                let parent = std::mem::replace(
                    &mut frame,
                    Frame {
                        node,
                        position,
                        previous: None,
                    },
                );
                stack.push(parent);
            }
            Token::VariationEnd => {
                frame = stack.pop().ok_or(PgnError::UnbalancedVariation { line })?;
            }
            Token::Result => {
                movetext_started = true;
                if stack.is_empty() {
                    break;
                }
            }
            Token::Nag => movetext_started = true,
            Token::San(word) => {
                movetext_started = true;
                let illegal = || PgnError::IllegalMove {
                    token: word.to_string(),
                    line,
                };
                let san: SanPlus = normalize_castling(word).parse().map_err(|_| illegal())?;
                let mv = san.san.to_move(&frame.position).map_err(|_| illegal())?;
                let next = frame.position.clone().play(&mv).map_err(|_| illegal())?;
                let child = tree.child_or_insert(frame.node, &mv);
                let position = std::mem::replace(&mut frame.position, next);
                frame.previous = Some((frame.node, position));
                frame.node = child;
            }
        }
    }

    Ok(tree)
}

/// Render a move tree as a single PGN game
pub fn write_game(tree: &MoveTree) -> String {
    let mut out = String::new();
    for (name, value) in SEVEN_TAG_ROSTER {
        out.push_str(&format!("[{name} \"{value}\"]\n"));
    }
    out.push('\n');

    let mut tokens = Vec::new();
    let root_comment = tree.comment(tree.root());
    if !root_comment.is_empty() {
        tokens.push(comment_token(root_comment));
    }
    write_line(tree, tree.root(), &Chess::default(), &mut tokens, false);
    tokens.push("*".to_string());

    out.push_str(&wrap(&tokens));
    out.push_str("\n\n");
    out
}

/// Main line from `node`, with sibling variations at every branching point
fn write_line(
    tree: &MoveTree,
    node: NodeId,
    position: &Chess,
    tokens: &mut Vec<String>,
    force_number: bool,
) {
    let mut node = node;
    let mut position = position.clone();
    let mut force_number = force_number;

    while let Some((&main, alternatives)) = tree.children(node).split_first() {
        write_move(tree, main, &position, tokens, force_number);
        force_number = !tree.comment(main).is_empty();

        for &alternative in alternatives {
            tokens.push("(".to_string());
            write_move(tree, alternative, &position, tokens, true);
            let after = played(&position, tree.mv(alternative));
            write_line(
                tree,
                alternative,
                &after,
                tokens,
                !tree.comment(alternative).is_empty(),
            );
            tokens.push(")".to_string());
            force_number = true;
        }

        position = played(&position, tree.mv(main));
        node = main;
    }
}

fn write_move(
    tree: &MoveTree,
    node: NodeId,
    position: &Chess,
    tokens: &mut Vec<String>,
    force_number: bool,
) {
    let Some(mv) = tree.mv(node) else {
        return;
    };
    let fullmoves = position.fullmoves().get();
    match position.turn() {
        Color::White => tokens.push(format!("{fullmoves}.")),
        Color::Black if force_number => tokens.push(format!("{fullmoves}...")),
        Color::Black => {}
    }
    tokens.push(san_of(position, mv));

    let comment = tree.comment(node);
    if !comment.is_empty() {
        tokens.push(comment_token(comment));
    }
}

/// Position after `mv`; tree moves were legal when they were inserted
fn played(position: &Chess, mv: Option<&Move>) -> Chess {
    let mut next = position.clone();
    if let Some(mv) = mv {
        next.play_unchecked(mv);
    }
    next
}

fn comment_token(comment: &str) -> String {
    format!("{{ {} }}", comment.replace('}', "").trim())
}

fn wrap(tokens: &[String]) -> String {
    let mut out = String::new();
    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(token);
        line_len += token.len();
    }
    out
}

fn append_comment(tree: &mut MoveTree, node: NodeId, comment: &str) {
    let existing = tree.comment(node);
    let joined = if existing.is_empty() {
        comment.to_string()
    } else {
        format!("{existing} {comment}")
    };
    tree.set_comment(node, joined);
}

fn normalize_castling(word: &str) -> String {
    if let Some(rest) = word.strip_prefix("0-0-0") {
        format!("O-O-O{rest}")
    } else if let Some(rest) = word.strip_prefix("0-0") {
        format!("O-O{rest}")
    } else {
        word.to_string()
    }
}

/// Parser position inside one (possibly nested) variation
#[derive(Clone)]
struct Frame {
    node: NodeId,
    position: Chess,
    /// Node and position before the last move, where an alternative branches off
    previous: Option<(NodeId, Chess)>,
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Tag { name: &'a str, value: &'a str },
    Comment(&'a str),
    VariationStart,
    VariationEnd,
    Nag,
    Result,
    San(&'a str),
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text[..self.pos].ends_with('\n')
    }

    /// Consume up to (not including) the first char matching `stop`
    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(stop).unwrap_or(rest.len());
        let taken = &rest[..len];
        self.line += taken.matches('\n').count();
        self.pos += len;
        taken
    }

    /// Consume a tag value up to and including its closing quote
    fn skip_quoted(&mut self) {
        let mut escaped = false;
        let len = self
            .rest()
            .find(|c| {
                let closing = !escaped && c == '"';
                escaped = !escaped && c == '\\';
                closing || c == '\n'
            })
            .unwrap_or(self.rest().len());
        self.pos += len;
        if self.rest().starts_with('"') {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_until(|c| !c.is_whitespace());
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, PgnError> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.rest().chars().next() else {
                return Ok(None);
            };
            match c {
                '%' if self.at_line_start() => {
                    self.take_until(|c| c == '\n');
                }
                ';' => {
                    self.pos += 1;
                    let comment = self.take_until(|c| c == '\n');
                    return Ok(Some(Token::Comment(comment)));
                }
                '{' => {
                    let line = self.line;
                    self.pos += 1;
                    let comment = self.take_until(|c| c == '}');
                    if self.rest().is_empty() {
                        return Err(PgnError::UnterminatedComment { line });
                    }
                    self.pos += 1;
                    return Ok(Some(Token::Comment(comment)));
                }
                '[' => {
                    self.pos += 1;
                    let start = self.pos;
                    self.take_until(|c| c == '"' || c == ']' || c == '\n');
                    if self.rest().starts_with('"') {
                        self.pos += 1;
                        self.skip_quoted();
                        self.take_until(|c| c == ']' || c == '\n');
                    }
                    let inner = &self.text[start..self.pos];
                    if self.rest().starts_with(']') {
                        self.pos += 1;
                    }
                    let inner = inner.trim();
                    let (name, value) = inner.split_once(char::is_whitespace).unwrap_or((inner, ""));
                    let value = value.trim().trim_matches('"');
                    return Ok(Some(Token::Tag { name, value }));
                }
                '(' => {
                    self.pos += 1;
                    return Ok(Some(Token::VariationStart));
                }
                ')' => {
                    self.pos += 1;
                    return Ok(Some(Token::VariationEnd));
                }
                '$' => {
                    self.pos += 1;
                    self.take_until(|c| !c.is_ascii_digit());
                    return Ok(Some(Token::Nag));
                }
                _ => {
                    let word = self.take_until(|c| c.is_whitespace() || "(){}[];".contains(c));
                    if word.is_empty() {
                        // `}` or `]` outside a comment or tag
                        return Err(PgnError::UnexpectedChar { ch: c, line: self.line });
                    }
                    if let Some(token) = classify_word(word) {
                        return Ok(Some(token));
                    }
                }
            }
        }
    }
}

/// Token for a bare word, `None` for move numbers and annotation glyphs
fn classify_word(word: &str) -> Option<Token<'_>> {
    if matches!(word, "1-0" | "0-1" | "1/2-1/2" | "*") {
        return Some(Token::Result);
    }
    // "12." / "12..." / "12.Nf3"
    let digits = word.len() - word.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let word = if digits > 0 && word[digits..].starts_with('.') {
        word[digits..].trim_start_matches('.')
    } else {
        word
    };
    let word = word.trim_end_matches(['!', '?']);
    if word.is_empty() {
        None
    } else {
        Some(Token::San(word))
    }
}
