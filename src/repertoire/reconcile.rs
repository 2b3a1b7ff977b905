//! Reconciling a freshly merged tree with the persisted review record
//!
//! The merged tree decides which moves exist; the persisted tree decides
//! their order and remembers their schedules. The result has exactly the
//! shape of the merged tree:
//!
//! - a persisted child the sources no longer contain is dropped, subtree and
//!   all, and counted once
//! - a persisted child still present keeps its position and its comment
//! - a merged child missing from the record is appended with no comment

use tracing::debug;

use crate::repertoire::tree::{MoveTree, NodeId};

/// Working tree built from `persisted` and `merged`
#[derive(Debug)]
pub struct Reconciled {
    pub tree: MoveTree,
    /// Number of pruned subtrees
    pub deleted: usize,
}

/// Reconcile `merged` onto `persisted`
pub fn reconcile(persisted: &MoveTree, merged: &MoveTree) -> Reconciled {
    let mut tree = MoveTree::new();
    tree.set_comment(tree.root(), persisted.comment(persisted.root()));

    let mut deleted = 0;
    let root = tree.root();
    reconcile_node(
        &mut tree,
        root,
        Some((persisted, persisted.root())),
        merged,
        merged.root(),
        &mut deleted,
    );

    if deleted > 0 {
        debug!("Reconciliation pruned {} subtree(s)", deleted);
    }
    Reconciled { tree, deleted }
}

fn reconcile_node(
    tree: &mut MoveTree,
    node: NodeId,
    persisted: Option<(&MoveTree, NodeId)>,
    merged: &MoveTree,
    merged_node: NodeId,
    deleted: &mut usize,
) {
    // surviving persisted children, in persisted order
    if let Some((record, record_node)) = persisted {
        for &record_child in record.children(record_node) {
            let Some(mv) = record.mv(record_child) else {
                continue;
            };
            match merged.child_with_move(merged_node, mv) {
                Some(merged_child) => {
                    let child = tree.add_child(node, mv.clone());
                    tree.set_comment(child, record.comment(record_child));
                    reconcile_node(
                        tree,
                        child,
                        Some((record, record_child)),
                        merged,
                        merged_child,
                        deleted,
                    );
                }
                None => *deleted += 1,
            }
        }
    }

    // new moves from the sources
    for &merged_child in merged.children(merged_node) {
        let Some(mv) = merged.mv(merged_child) else {
            continue;
        };
        if tree.child_with_move(node, mv).is_some() {
            continue;
        }
        let child = tree.add_child(node, mv.clone());
        reconcile_node(tree, child, None, merged, merged_child, deleted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::repertoire::annotation::ReviewAnnotation;
    use crate::repertoire::pgn::read_game;
    use chrono::TimeDelta;

    fn node_at(tree: &MoveTree, sans: &[&str]) -> Option<NodeId> {
        let mut game = GameState::new();
        for san in sans {
            game.push_san(san).unwrap();
        }
        tree.find(game.moves())
    }

    fn annotated(text: &str, sans: &[&str]) -> MoveTree {
        let mut tree = read_game(text).unwrap();
        let node = node_at(&tree, sans).unwrap();
        tree.set_annotation(
            node,
            ReviewAnnotation {
                due: Some("2023-01-01T12:10:00Z".parse().unwrap()),
                interval: Some(TimeDelta::hours(1)),
            },
        );
        tree
    }

    #[test]
    fn test_annotations_survive_on_matched_paths() {
        let persisted = annotated("1. e4 e5 2. Nf3 Nc6 *", &["e4"]);
        let merged = read_game("1. e4 e5 2. Nf3 Nc6 *").unwrap();

        let result = reconcile(&persisted, &merged);
        assert_eq!(result.deleted, 0);
        assert_eq!(result.tree.len(), merged.len());

        let e4 = node_at(&result.tree, &["e4"]).unwrap();
        assert_eq!(result.tree.annotation(e4).interval, Some(TimeDelta::hours(1)));
    }

    #[test]
    fn test_removed_lines_are_pruned_once() {
        //! A pruned subtree counts once, however deep it goes
        let persisted = annotated("1. e4 e5 (1... c5 2. Nf3 d6 3. d4) 2. Nf3 *", &["e4", "c5"]);
        let merged = read_game("1. e4 e5 2. Nf3 *").unwrap();

        let result = reconcile(&persisted, &merged);
        assert_eq!(result.deleted, 1);
        assert!(node_at(&result.tree, &["e4", "c5"]).is_none());
        assert_eq!(result.tree.len(), 4);
    }

    #[test]
    fn test_new_lines_are_appended_unannotated() {
        let persisted = annotated("1. d4 d5 *", &["d4"]);
        let merged = read_game("1. c4 e5 (1... d5) *").unwrap();
        let mut merged_with_d4 = read_game("1. d4 d5 *").unwrap();
        crate::repertoire::merge::merge_into(&mut merged_with_d4, &merged, shakmaty::Color::Black);

        let result = reconcile(&persisted, &merged_with_d4);
        assert_eq!(result.deleted, 0);

        let root_children = result.tree.children(result.tree.root());
        assert_eq!(root_children.len(), 2);
        let d4 = node_at(&result.tree, &["d4"]).unwrap();
        let c4 = node_at(&result.tree, &["c4"]).unwrap();
        assert_eq!(root_children, &[d4, c4]);
        assert!(!result.tree.annotation(d4).is_empty());
        assert!(result.tree.annotation(c4).is_empty());
    }

    #[test]
    fn test_persisted_order_is_kept() {
        let persisted = read_game("1. e4 e5 (1... c5) *").unwrap();
        let merged = read_game("1. e4 c5 (1... e5) *").unwrap();

        let result = reconcile(&persisted, &merged);
        let e4 = node_at(&result.tree, &["e4"]).unwrap();
        let e5 = node_at(&result.tree, &["e4", "e5"]).unwrap();
        assert_eq!(result.tree.first_child(e4), Some(e5));
    }

    #[test]
    fn test_empty_merge_prunes_everything() {
        let persisted = read_game("1. e4 e5 (1... c5) *").unwrap();
        let result = reconcile(&persisted, &MoveTree::new());
        assert_eq!(result.deleted, 1);
        assert!(result.tree.is_empty());
    }
}
