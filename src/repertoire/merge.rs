//! Folding source repertoires into one canonical tree
//!
//! Source files are merged one after the other, in sorted path order. At a
//! node where the trained side is to move, the first reply ever merged is the
//! only one kept: later files cannot add a second answer to the same
//! position. Where the opponent is to move every distinct try is kept, since
//! those are the moves the trainer will play against the user.
//!
//! Only moves are merged. Comments from source files never reach the
//! canonical tree, which carries nothing but review annotations.

use shakmaty::Color;
use tracing::trace;

use crate::repertoire::tree::{MoveTree, NodeId};

/// Merge `source` into `target` for a user training `trained`
pub fn merge_into(target: &mut MoveTree, source: &MoveTree, trained: Color) {
    merge_node(target, target.root(), source, source.root(), trained);
}

fn merge_node(
    target: &mut MoveTree,
    target_node: NodeId,
    source: &MoveTree,
    source_node: NodeId,
    trained: Color,
) {
    for &source_child in source.children(source_node) {
        let Some(mv) = source.mv(source_child) else {
            continue;
        };
        let target_child = match target.child_with_move(target_node, mv) {
            Some(child) => child,
            None if target.turn(target_node) == trained
                && !target.children(target_node).is_empty() =>
            {
                trace!("Skipping alternative user move at ply {}", target.ply(target_node));
                continue;
            }
            None => target.add_child(target_node, mv.clone()),
        };
        merge_node(target, target_child, source, source_child, trained);
    }
}
