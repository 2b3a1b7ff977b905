//! Move tree arena
//!
//! A repertoire is a tree of positions: the root is the initial position and
//! every other node is reached by exactly one move from its parent. Nodes live
//! in a flat arena and refer to each other by [`NodeId`], which keeps the
//! parent back-reference needed by the scheduler without ownership cycles.
//!
//! # Child Order
//!
//! Children are kept in insertion order. Order is meaningful: the first child
//! is the main continuation, the one offered as a correction hint, and the
//! one that wins ties when picking the earliest due move.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut tree = MoveTree::new();
//! let e4 = tree.add_child(tree.root(), e4_move);
//! let e5 = tree.add_child(e4, e5_move);
//! assert_eq!(tree.parent(e5), Some(e4));
//! assert_eq!(tree.turn(e5), Color::White);
//! ```

use shakmaty::{Color, Move};

use crate::repertoire::annotation::ReviewAnnotation;

/// Index of a node inside its [`MoveTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    /// Move that reached this node, `None` only for the root
    mv: Option<Move>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    comment: String,
    /// Half-moves from the root
    ply: usize,
}

/// Tree of positions reached from the initial position
#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<Node>,
}

impl Default for MoveTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveTree {
    /// Tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                mv: None,
                parent: None,
                children: Vec::new(),
                comment: String::new(),
                ply: 0,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root()
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when the tree holds no move at all
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Move that reached `id`
    pub fn mv(&self, id: NodeId) -> Option<&Move> {
        self.nodes[id.0].mv.as_ref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Main continuation of `id`
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.first().copied()
    }

    /// Child of `id` reached by `mv`
    pub fn child_with_move(&self, id: NodeId, mv: &Move) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.mv(child) == Some(mv))
    }

    /// Append a child reached by `mv`; the caller checks for duplicates
    pub fn add_child(&mut self, parent: NodeId, mv: Move) -> NodeId {
        let id = NodeId(self.nodes.len());
        let ply = self.nodes[parent.0].ply + 1;
        self.nodes.push(Node {
            mv: Some(mv),
            parent: Some(parent),
            children: Vec::new(),
            comment: String::new(),
            ply,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Existing child reached by `mv`, or a new one appended at the end
    pub fn child_or_insert(&mut self, parent: NodeId, mv: &Move) -> NodeId {
        match self.child_with_move(parent, mv) {
            Some(child) => child,
            None => self.add_child(parent, mv.clone()),
        }
    }

    /// Half-moves from the root to `id`
    pub fn ply(&self, id: NodeId) -> usize {
        self.nodes[id.0].ply
    }

    /// Side to move in the position of `id`
    pub fn turn(&self, id: NodeId) -> Color {
        if self.ply(id) % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn comment(&self, id: NodeId) -> &str {
        &self.nodes[id.0].comment
    }

    pub fn set_comment(&mut self, id: NodeId, comment: impl Into<String>) {
        self.nodes[id.0].comment = comment.into();
    }

    /// Review schedule stored in the comment of `id`
    pub fn annotation(&self, id: NodeId) -> ReviewAnnotation {
        ReviewAnnotation::decode(self.comment(id))
    }

    /// Rewrite the review tags of `id`, leaving other comment text alone
    pub fn set_annotation(&mut self, id: NodeId, annotation: ReviewAnnotation) {
        annotation.encode_into(&mut self.nodes[id.0].comment);
    }

    /// Moves from the root down to `id`
    pub fn path(&self, id: NodeId) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.ply(id));
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if let Some(mv) = self.mv(current) {
                moves.push(mv.clone());
            }
            current = parent;
        }
        moves.reverse();
        moves
    }

    /// Node reached by playing `moves` from the root
    pub fn find(&self, moves: &[Move]) -> Option<NodeId> {
        moves
            .iter()
            .try_fold(self.root(), |node, mv| self.child_with_move(node, mv))
    }

    /// Every node below the root, parents before children, siblings in order
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(self.root()).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }
}

/// Pre-order walk returned by [`MoveTree::descendants`]
pub struct Descendants<'a> {
    tree: &'a MoveTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    /// Moves of a SAN line, each resolved in its own position
    fn line(sans: &[&str]) -> Vec<Move> {
        let mut game = GameState::new();
        for san in sans {
            game.push_san(san).unwrap();
        }
        game.moves().to_vec()
    }

    #[test]
    fn test_new_tree_is_empty_root() {
        let tree = MoveTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert!(tree.mv(tree.root()).is_none());
        assert!(tree.parent(tree.root()).is_none());
        assert_eq!(tree.turn(tree.root()), Color::White);
        assert!(tree.annotation(tree.root()).is_empty());
    }

    #[test]
    fn test_parent_links_and_turns() {
        let moves = line(&["e4", "e5", "Nf3"]);
        let mut tree = MoveTree::new();
        let mut node = tree.root();
        for mv in &moves {
            node = tree.add_child(node, mv.clone());
        }

        assert_eq!(tree.ply(node), 3);
        assert_eq!(tree.turn(node), Color::Black);
        assert_eq!(tree.path(node), moves);
        assert_eq!(tree.find(&moves), Some(node));

        let parent = tree.parent(node).unwrap();
        assert_eq!(tree.turn(parent), Color::White);
        assert_eq!(tree.mv(parent), Some(&moves[1]));
    }

    #[test]
    fn test_child_or_insert_reuses_existing() {
        let moves = line(&["d4"]);
        let mut tree = MoveTree::new();
        let first = tree.child_or_insert(tree.root(), &moves[0]);
        let second = tree.child_or_insert(tree.root(), &moves[0]);
        assert_eq!(first, second);
        assert_eq!(tree.children(tree.root()).len(), 1);
    }

    #[test]
    fn test_find_stops_at_unknown_move() {
        let known = line(&["e4", "e5"]);
        let unknown = line(&["e4", "c5"]);
        let mut tree = MoveTree::new();
        let e4 = tree.add_child(tree.root(), known[0].clone());
        tree.add_child(e4, known[1].clone());

        assert!(tree.find(&unknown).is_none());
        assert_eq!(tree.find(&unknown[..1]), Some(e4));
        assert_eq!(tree.find(&[]), Some(tree.root()));
    }

    #[test]
    fn test_descendants_preorder() {
        //! Parents come before children and siblings keep their order
        let e4_line = line(&["e4", "e5"]);
        let c5 = line(&["e4", "c5"]);
        let d4 = line(&["d4"]);

        let mut tree = MoveTree::new();
        let e4 = tree.add_child(tree.root(), e4_line[0].clone());
        let e5 = tree.add_child(e4, e4_line[1].clone());
        let c5 = tree.add_child(e4, c5[1].clone());
        let d4 = tree.add_child(tree.root(), d4[0].clone());

        let order: Vec<NodeId> = tree.descendants().collect();
        assert_eq!(order, vec![e4, e5, c5, d4]);
    }

    #[test]
    fn test_annotation_goes_through_comment() {
        let moves = line(&["e4"]);
        let mut tree = MoveTree::new();
        let e4 = tree.add_child(tree.root(), moves[0].clone());
        tree.set_comment(e4, "King's pawn");

        let annotation = ReviewAnnotation {
            due: Some("2023-01-01T12:10:00Z".parse().unwrap()),
            interval: Some(chrono::TimeDelta::hours(1)),
        };
        tree.set_annotation(e4, annotation);

        assert_eq!(tree.annotation(e4), annotation);
        assert!(tree.comment(e4).starts_with("King's pawn ["));
    }
}
