//! Spaced-repetition scheduling over a move tree
//!
//! Only nodes where the trained side is to move carry a schedule: they are
//! the positions the user is quizzed on. Their due-time says when the user
//! should see the position again, their interval how far the next due-time
//! is pushed after a correct answer.
//!
//! # Query
//!
//! [`Scheduler::next_move`] is asked for the opponent's move. It first grades
//! the user's last move (it matched a known line, or it did not), then picks
//! the reply whose line is due the earliest.
//!
//! # Update Rules
//!
//! | Outcome   | Due-time               | Interval                              |
//! |-----------|------------------------|---------------------------------------|
//! | correct   | now + current interval | × growth factor, capped, if it was due |
//! | incorrect | now                    | initial interval                      |
//!
//! A missing due-time reads as "now" and a missing interval as the initial
//! interval, so a never-reviewed node is always graded as due.

use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};
use shakmaty::{Color, Move};
use tracing::debug;

use crate::core::{Clock, ReviewConfig};
use crate::game::{san_of, GameState};
use crate::repertoire::annotation::ReviewAnnotation;
use crate::repertoire::tree::{MoveTree, NodeId};

/// Grade of the user's answer at a scheduled node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Where a game stands relative to a tree
///
/// | `node`  | `previous` | Meaning                                       |
/// |---------|------------|-----------------------------------------------|
/// | `Some`  | parent     | every move is known                           |
/// | `None`  | `Some`     | only the last move is unknown                 |
/// | `None`  | `None`     | the game left the tree earlier (or never was) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub node: Option<NodeId>,
    pub previous: Option<NodeId>,
}

/// Winner of the earliest-due search below a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueChoice {
    /// Direct child whose move gets played
    pub child: NodeId,
    /// Node the due-time was read from, `child` or one of its descendants
    pub node: NodeId,
    pub due: DateTime<Utc>,
}

/// Answer to a move query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQuery {
    /// Move to play for the opponent, `None` if the tree has none
    pub mv: Option<Move>,
    /// The line ends here, nothing more to learn in it
    pub bottom_reached: bool,
    /// SAN of the expected move after a wrong answer
    pub correction: Option<String>,
    /// Some schedule was rewritten and the tree must be saved
    pub updated: bool,
}

/// Review scheduling rules bound to a clock
#[derive(Clone)]
pub struct Scheduler {
    config: ReviewConfig,
    clock: Rc<dyn Clock>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("now", &self.clock.now())
            .finish()
    }
}

impl Scheduler {
    pub fn new(config: ReviewConfig, clock: Rc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Replay the moves of `game` from the root of `tree`
    pub fn locate(tree: &MoveTree, game: &GameState) -> Location {
        let untracked = Location {
            node: None,
            previous: None,
        };
        if !game.is_standard_start() {
            return untracked;
        }

        let mut node = tree.root();
        let mut previous = None;
        for (ply, mv) in game.moves().iter().enumerate() {
            previous = Some(node);
            match tree.child_with_move(node, mv) {
                Some(child) => node = child,
                None if ply + 1 == game.ply() => {
                    return Location {
                        node: None,
                        previous: Some(node),
                    };
                }
                None => return untracked,
            }
        }
        Location {
            node: Some(node),
            previous,
        }
    }

    /// Grade the user's last move and choose the opponent's reply
    pub fn next_move(&self, tree: &mut MoveTree, game: &GameState) -> ReviewQuery {
        let mut query = ReviewQuery::default();

        match Self::locate(tree, game) {
            Location {
                node: Some(node),
                previous,
            } => {
                if let Some(previous) = previous.filter(|&id| !tree.is_root(id)) {
                    self.apply_outcome(tree, previous, Outcome::Correct);
                    query.updated = true;
                }
                match self.earliest_due(tree, node) {
                    Some(choice) => {
                        query.mv = tree.mv(choice.child).cloned();
                        query.bottom_reached = tree.children(choice.child).is_empty();
                        if query.bottom_reached {
                            self.apply_outcome(tree, choice.child, Outcome::Correct);
                            query.updated = true;
                        }
                    }
                    None => query.bottom_reached = true,
                }
            }
            Location {
                node: None,
                previous: Some(previous),
            } => {
                let expected = tree.first_child(previous);
                if !tree.is_root(previous) {
                    // past the end of a prepared line there is nothing to get wrong
                    let outcome = match expected {
                        Some(_) => Outcome::Incorrect,
                        None => Outcome::Correct,
                    };
                    self.apply_outcome(tree, previous, outcome);
                    query.updated = true;
                }
                query.correction = expected
                    .and_then(|id| tree.mv(id))
                    .zip(game.ply().checked_sub(1).and_then(|ply| game.position_before(ply)))
                    .map(|(mv, position)| san_of(position, mv));
            }
            Location { node: None, .. } => {}
        }

        query
    }

    /// Child of `base` whose line holds the earliest due-time
    ///
    /// Each child competes with its own due-time and with the earliest one
    /// found below its main continuation. Ties keep the earlier child.
    pub fn earliest_due(&self, tree: &MoveTree, base: NodeId) -> Option<DueChoice> {
        earliest_due_at(tree, base, self.clock.now())
    }

    /// Rewrite the schedule of `node` after an answer
    pub fn apply_outcome(
        &self,
        tree: &mut MoveTree,
        node: NodeId,
        outcome: Outcome,
    ) -> ReviewAnnotation {
        let now = self.clock.now();
        let initial = self.config.initial_interval;

        let updated = match outcome {
            Outcome::Correct => {
                let current = tree.annotation(node);
                let due = current.due.unwrap_or(now);
                let interval = current.interval.unwrap_or(initial);
                let was_due = due <= now;
                ReviewAnnotation {
                    due: Some(now.checked_add_signed(interval).unwrap_or(DateTime::<Utc>::MAX_UTC)),
                    interval: Some(if was_due { self.grow(interval) } else { interval }),
                }
            }
            Outcome::Incorrect => ReviewAnnotation {
                due: Some(now),
                interval: Some(initial),
            },
        };

        tree.set_annotation(node, updated);
        debug!(
            "{:?} answer at ply {}: due {:?}, interval {:?}",
            outcome,
            tree.ply(node),
            updated.due,
            updated.interval
        );
        updated
    }

    /// Scheduled nodes for `trained` that are due now
    pub fn pending_count(&self, tree: &MoveTree, trained: Color) -> usize {
        let now = self.clock.now();
        tree.descendants()
            .filter(|&id| tree.turn(id) == trained)
            .filter(|&id| tree.annotation(id).due.map_or(true, |due| due <= now))
            .count()
    }

    fn grow(&self, interval: TimeDelta) -> TimeDelta {
        let max = self.config.max_interval;
        interval
            .checked_mul(self.config.growth_factor)
            .map_or(max, |grown| grown.min(max))
    }
}

fn earliest_due_at(tree: &MoveTree, base: NodeId, now: DateTime<Utc>) -> Option<DueChoice> {
    let mut best: Option<DueChoice> = None;
    for &child in tree.children(base) {
        let due = tree.annotation(child).due.unwrap_or(now);
        if best.map_or(true, |best| due < best.due) {
            best = Some(DueChoice {
                child,
                node: child,
                due,
            });
        }
        let Some(main) = tree.first_child(child) else {
            continue;
        };
        if let Some(deep) = earliest_due_at(tree, main, now) {
            if best.map_or(true, |best| deep.due < best.due) {
                best = Some(DueChoice {
                    child,
                    node: deep.node,
                    due: deep.due,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use crate::repertoire::pgn::read_game;

    const NOON: &str = "2023-01-01T12:00:00Z";

    fn at(text: &str) -> DateTime<Utc> {
        text.parse().unwrap()
    }

    fn scheduler(clock: &Rc<FixedClock>) -> Scheduler {
        let config = ReviewConfig {
            initial_interval: TimeDelta::minutes(10),
            growth_factor: 6,
            max_interval: TimeDelta::days(2),
        };
        Scheduler::new(config, clock.clone())
    }

    fn game(sans: &[&str]) -> GameState {
        let mut game = GameState::new();
        for san in sans {
            game.push_san(san).unwrap();
        }
        game
    }

    fn node_at(tree: &MoveTree, sans: &[&str]) -> NodeId {
        tree.find(game(sans).moves()).unwrap()
    }

    fn schedule(tree: &mut MoveTree, sans: &[&str], due: &str, interval: TimeDelta) {
        let node = node_at(tree, sans);
        tree.set_annotation(
            node,
            ReviewAnnotation {
                due: Some(at(due)),
                interval: Some(interval),
            },
        );
    }

    #[test]
    fn test_locate_cases() {
        let tree = read_game("1. e4 e5 2. Nf3 *").unwrap();

        let full = Scheduler::locate(&tree, &game(&["e4", "e5"]));
        assert_eq!(full.node, Some(node_at(&tree, &["e4", "e5"])));
        assert_eq!(full.previous, Some(node_at(&tree, &["e4"])));

        let last_wrong = Scheduler::locate(&tree, &game(&["e4", "c5"]));
        assert_eq!(last_wrong.node, None);
        assert_eq!(last_wrong.previous, Some(node_at(&tree, &["e4"])));

        let lost = Scheduler::locate(&tree, &game(&["e4", "c5", "Nf3"]));
        assert_eq!(lost, Location { node: None, previous: None });

        let start = Scheduler::locate(&tree, &GameState::new());
        assert_eq!(start.node, Some(tree.root()));
        assert_eq!(start.previous, None);
    }

    #[test]
    fn test_locate_custom_start_is_untracked() {
        let tree = read_game("1. e4 *").unwrap();
        let game = GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            Scheduler::locate(&tree, &game),
            Location { node: None, previous: None }
        );
    }

    #[test]
    fn test_correct_on_time_grows_interval() {
        //! Due-time moves by the old interval, the interval compounds
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 *").unwrap();
        schedule(&mut tree, &["e4"], NOON, TimeDelta::hours(1));
        let e4 = node_at(&tree, &["e4"]);

        let updated = scheduler.apply_outcome(&mut tree, e4, Outcome::Correct);
        assert_eq!(updated.due, Some(at("2023-01-01T13:00:00Z")));
        assert_eq!(updated.interval, Some(TimeDelta::hours(6)));
        assert_eq!(tree.annotation(e4), updated);
    }

    #[test]
    fn test_early_review_keeps_interval() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 *").unwrap();
        schedule(&mut tree, &["e4"], "2023-01-01T12:05:00Z", TimeDelta::hours(1));
        let e4 = node_at(&tree, &["e4"]);

        let updated = scheduler.apply_outcome(&mut tree, e4, Outcome::Correct);
        assert_eq!(updated.due, Some(at("2023-01-01T13:00:00Z")));
        assert_eq!(updated.interval, Some(TimeDelta::hours(1)));
    }

    #[test]
    fn test_interval_is_capped() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 *").unwrap();
        schedule(&mut tree, &["e4"], NOON, TimeDelta::hours(12));
        let e4 = node_at(&tree, &["e4"]);

        let updated = scheduler.apply_outcome(&mut tree, e4, Outcome::Correct);
        assert_eq!(updated.due, Some(at("2023-01-02T00:00:00Z")));
        assert_eq!(updated.interval, Some(TimeDelta::days(2)));

        clock.set(at("2023-01-03T00:00:00Z"));
        let updated = scheduler.apply_outcome(&mut tree, e4, Outcome::Correct);
        assert_eq!(updated.interval, Some(TimeDelta::days(2)));
    }

    #[test]
    fn test_incorrect_resets_regardless_of_history() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 *").unwrap();
        schedule(&mut tree, &["e4"], "2023-02-01T00:00:00Z", TimeDelta::days(2));
        let e4 = node_at(&tree, &["e4"]);

        let updated = scheduler.apply_outcome(&mut tree, e4, Outcome::Incorrect);
        assert_eq!(updated.due, Some(at(NOON)));
        assert_eq!(updated.interval, Some(TimeDelta::minutes(10)));
    }

    #[test]
    fn test_fresh_node_counts_as_due() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 *").unwrap();
        let e4 = node_at(&tree, &["e4"]);

        let updated = scheduler.apply_outcome(&mut tree, e4, Outcome::Correct);
        assert_eq!(updated.due, Some(at("2023-01-01T12:10:00Z")));
        assert_eq!(updated.interval, Some(TimeDelta::hours(1)));
    }

    #[test]
    fn test_earliest_due_looks_down_the_main_line() {
        //! A deep due-time makes its top-level move win
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        // training White: Black's replies are chosen
        let mut tree = read_game("1. e4 e5 2. Nf3 Nc6 *").unwrap();
        let sicilian = read_game("1. e4 c5 2. Nf3 d6 *").unwrap();
        crate::repertoire::merge::merge_into(&mut tree, &sicilian, Color::White);

        schedule(&mut tree, &["e4", "e5"], "2023-01-01T15:00:00Z", TimeDelta::hours(1));
        schedule(&mut tree, &["e4", "c5"], "2023-01-01T14:00:00Z", TimeDelta::hours(1));
        schedule(&mut tree, &["e4", "e5", "Nf3", "Nc6"], "2023-01-01T12:30:00Z", TimeDelta::hours(1));
        schedule(&mut tree, &["e4", "c5", "Nf3", "d6"], "2023-01-01T13:00:00Z", TimeDelta::hours(1));

        let e4 = node_at(&tree, &["e4"]);
        let choice = scheduler.earliest_due(&tree, e4).unwrap();
        assert_eq!(choice.child, node_at(&tree, &["e4", "e5"]));
        assert_eq!(choice.node, node_at(&tree, &["e4", "e5", "Nf3", "Nc6"]));
        assert_eq!(choice.due, at("2023-01-01T12:30:00Z"));
    }

    #[test]
    fn test_earliest_due_ties_keep_first_child() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let tree = read_game("1. e4 (1. d4) (1. c4) *").unwrap();
        let choice = scheduler.earliest_due(&tree, tree.root()).unwrap();
        assert_eq!(choice.child, node_at(&tree, &["e4"]));
        assert_eq!(choice.due, at(NOON));
    }

    #[test]
    fn test_next_move_grades_and_hints() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 2. Nf3 Nc6 *").unwrap();

        // training Black: 1. e4 is offered from the start
        let query = scheduler.next_move(&mut tree, &GameState::new());
        assert_eq!(query.mv, tree.mv(node_at(&tree, &["e4"])).cloned());
        assert!(!query.updated);

        // 1... c5 is not the prepared answer
        let query = scheduler.next_move(&mut tree, &game(&["e4", "c5"]));
        assert_eq!(query.mv, None);
        assert_eq!(query.correction.as_deref(), Some("e5"));
        let e4 = node_at(&tree, &["e4"]);
        assert_eq!(tree.annotation(e4).due, Some(at(NOON)));
        assert_eq!(tree.annotation(e4).interval, Some(TimeDelta::minutes(10)));

        // 1... e5 is, and the book answers 2. Nf3
        let query = scheduler.next_move(&mut tree, &game(&["e4", "e5"]));
        assert!(query.updated);
        assert_eq!(query.mv, tree.mv(node_at(&tree, &["e4", "e5", "Nf3"])).cloned());
        assert!(!query.bottom_reached);
        assert_eq!(tree.annotation(e4).due, Some(at("2023-01-01T12:10:00Z")));
    }

    #[test]
    fn test_next_move_bottom_grades_last_move() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 2. Nf3 *").unwrap();

        let query = scheduler.next_move(&mut tree, &game(&["e4", "e5"]));
        assert!(query.bottom_reached);
        let nf3 = node_at(&tree, &["e4", "e5", "Nf3"]);
        assert_eq!(tree.annotation(nf3).due, Some(at("2023-01-01T12:10:00Z")));

        // the user answers past the end of the line
        let query = scheduler.next_move(&mut tree, &game(&["e4", "e5", "Nf3", "Nc6"]));
        assert_eq!(query.mv, None);
        assert!(!query.bottom_reached);
        assert_eq!(query.correction, None);
        assert_eq!(tree.annotation(nf3).interval, Some(TimeDelta::minutes(10)));
    }

    #[test]
    fn test_next_move_outside_tree() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 *").unwrap();

        let query = scheduler.next_move(&mut tree, &game(&["d4", "d5"]));
        assert_eq!(query, ReviewQuery::default());
    }

    #[test]
    fn test_pending_count_matches_scheduled_nodes() {
        let clock = Rc::new(FixedClock::new(at(NOON)));
        let scheduler = scheduler(&clock);
        let mut tree = read_game("1. e4 e5 2. Nf3 Nc6 (2... d6) *").unwrap();

        // Black nodes: e4 and Nf3
        assert_eq!(scheduler.pending_count(&tree, Color::Black), 2);
        // White nodes: root excluded, e5, Nc6 and d6
        assert_eq!(scheduler.pending_count(&tree, Color::White), 3);

        schedule(&mut tree, &["e4"], "2023-01-01T12:10:00Z", TimeDelta::minutes(10));
        assert_eq!(scheduler.pending_count(&tree, Color::Black), 1);

        clock.set(at("2023-01-01T12:10:00Z"));
        assert_eq!(scheduler.pending_count(&tree, Color::Black), 2);
    }
}
