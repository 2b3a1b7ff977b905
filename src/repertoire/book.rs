//! Repertoire book: one trained color, its review tree and its record file
//!
//! Opening a book runs the whole load sequence:
//!
//! 1. merge every `*.pgn` below the color's source directory, in sorted path
//!    order, into a fresh tree
//! 2. if a review record exists, reconcile the fresh tree with it and back
//!    the record up when moves were pruned
//! 3. save the result, so the record always mirrors the sources
//!
//! After that every schedule change is written through to disk at once.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use shakmaty::Color;
use tracing::{debug, info, warn};

use crate::core::{color_name, TrainerPaths};
use crate::game::GameState;
use crate::repertoire::annotation::ReviewAnnotation;
use crate::repertoire::error::{RepertoireError, RepertoireResult};
use crate::repertoire::merge::merge_into;
use crate::repertoire::pgn::{read_game, write_game};
use crate::repertoire::reconcile::reconcile;
use crate::repertoire::scheduler::{Location, Outcome, ReviewQuery, Scheduler};
use crate::repertoire::tree::{MoveTree, NodeId};

const BACKUP_DIRNAME: &str = "backup";
const PGN_EXTENSION: &str = "pgn";

/// Review tree of one color, persisted after every change
#[derive(Debug)]
pub struct RepertoireBook {
    color: Color,
    tree: MoveTree,
    path: PathBuf,
    /// Subtrees pruned while opening
    deleted_moves: usize,
    scheduler: Scheduler,
}

impl RepertoireBook {
    /// Open the book of `color` in the standard layout
    pub fn open(paths: &TrainerPaths, color: Color, scheduler: Scheduler) -> RepertoireResult<Self> {
        Self::open_at(
            paths.review_file(color),
            &paths.repertoire_dir(color),
            color,
            scheduler,
        )
    }

    /// Open a book whose record lives at `path`, fed from `source_dir`
    pub fn open_at(
        path: impl Into<PathBuf>,
        source_dir: &Path,
        color: Color,
        scheduler: Scheduler,
    ) -> RepertoireResult<Self> {
        let path = path.into();

        let sources = source_files(source_dir)?;
        let mut merged = MoveTree::new();
        for source in &sources {
            let text = read_text(source)?;
            let tree = read_game(&text).map_err(|source_err| RepertoireError::Pgn {
                path: source.clone(),
                source: source_err,
            })?;
            merge_into(&mut merged, &tree, color);
        }
        info!(
            "[BOOK] Merged {} source file(s) for {}",
            sources.len(),
            color_name(color)
        );

        let mut book = Self {
            color,
            tree: merged,
            path,
            deleted_moves: 0,
            scheduler,
        };

        if book.path.exists() {
            let text = read_text(&book.path)?;
            let persisted = read_game(&text).map_err(|source| RepertoireError::Pgn {
                path: book.path.clone(),
                source,
            })?;
            let reconciled = reconcile(&persisted, &book.tree);
            book.tree = reconciled.tree;
            book.deleted_moves = reconciled.deleted;
            if book.deleted_moves > 0 {
                book.create_backup()?;
            }
        } else {
            debug!("[BOOK] No review record at {:?}, starting fresh", book.path);
        }

        book.save()?;
        Ok(book)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    /// Record file this book is saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subtrees pruned from the record when the book was opened
    pub fn deleted_moves(&self) -> usize {
        self.deleted_moves
    }

    /// Grade the user's last move, pick the opponent's reply and save
    pub fn next_move(&mut self, game: &GameState) -> RepertoireResult<ReviewQuery> {
        let query = self.scheduler.next_move(&mut self.tree, game);
        if query.updated {
            self.save()?;
        }
        Ok(query)
    }

    /// Positions of this color that are due for review
    pub fn pending_review_count(&self) -> usize {
        self.scheduler.pending_count(&self.tree, self.color)
    }

    /// Apply an answer to `node` and save
    pub fn apply_outcome(
        &mut self,
        node: NodeId,
        outcome: Outcome,
    ) -> RepertoireResult<ReviewAnnotation> {
        let annotation = self.scheduler.apply_outcome(&mut self.tree, node, outcome);
        self.save()?;
        Ok(annotation)
    }

    /// Where `game` stands in this book
    pub fn find_node(&self, game: &GameState) -> Location {
        Scheduler::locate(&self.tree, game)
    }

    /// Schedule of the node reached by `game`, if the book knows it
    pub fn annotation_at(&self, game: &GameState) -> Option<ReviewAnnotation> {
        self.find_node(game)
            .node
            .map(|node| self.tree.annotation(node))
    }

    /// Rewrite the whole record file
    pub fn save(&self) -> RepertoireResult<()> {
        fs::write(&self.path, write_game(&self.tree)).map_err(|source| RepertoireError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Copy the record, as it was before reconciliation, next to it
    fn create_backup(&self) -> RepertoireResult<PathBuf> {
        let backup_dir = self
            .path
            .parent()
            .map(|dir| dir.join(BACKUP_DIRNAME))
            .unwrap_or_else(|| PathBuf::from(BACKUP_DIRNAME));
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stamp = self.scheduler.now().to_rfc3339_opts(SecondsFormat::Secs, false);
        let backup = backup_dir.join(format!("{filename}.{stamp}"));

        let backup_error = |source| RepertoireError::Backup {
            from: self.path.clone(),
            to: backup.clone(),
            source,
        };
        fs::create_dir_all(&backup_dir).map_err(backup_error)?;
        fs::copy(&self.path, &backup).map_err(backup_error)?;

        warn!(
            "[BOOK] {} move(s) deleted, backup created: {}",
            self.deleted_moves,
            backup.display()
        );
        Ok(backup)
    }
}

/// Every `*.pgn` below `dir`, sorted by path
///
/// A missing directory holds no sources.
fn source_files(dir: &Path) -> RepertoireResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    if dir.is_dir() {
        collect_pgn_files(dir, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect_pgn_files(dir: &Path, files: &mut Vec<PathBuf>) -> RepertoireResult<()> {
    let io_error = |source| RepertoireError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            collect_pgn_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == PGN_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> RepertoireResult<String> {
    fs::read_to_string(path).map_err(|source| RepertoireError::Io {
        path: path.to_path_buf(),
        source,
    })
}
