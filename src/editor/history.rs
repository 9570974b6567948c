//! Linear undo/redo history.
//!
//! Each top-level command that changed the tree leaves one [`Record`]
//! holding the document before and after it. `undone` counts how many
//! records, from the newest, are currently undone. Undo and redo leave the
//! live cursor in the record they step away from, so stepping back returns
//! to it.

use tracing::debug;

use crate::document::Document;
use crate::error::{EditError, Result};

/// Default number of records kept before the oldest are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// The effect of one top-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Identifier of the command (its key or source text).
    pub command: String,
    pub before: Document,
    pub after: Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    records: Vec<Record>,
    undone: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// An empty history keeping at most `limit` records (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            undone: 0,
            limit: limit.max(1),
        }
    }

    /// Number of committed records, including undone ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The undo pointer: how many of the newest records are undone.
    pub const fn position(&self) -> usize {
        self.undone
    }

    /// Reset the undo pointer, e.g. when a transaction rolls back.
    pub fn set_position(&mut self, position: usize) {
        self.undone = position.min(self.records.len());
    }

    pub fn can_undo(&self) -> bool {
        self.undone < self.records.len()
    }

    pub const fn can_redo(&self) -> bool {
        self.undone > 0
    }

    /// Drop every undone record. Called before any new top-level command.
    pub fn discard_redo(&mut self) {
        if self.undone > 0 {
            debug!(discarded = self.undone, "history: redo records discarded");
            self.records.truncate(self.records.len() - self.undone);
            self.undone = 0;
        }
    }

    /// Commit a new record, invalidating redo.
    pub fn push(&mut self, record: Record) {
        self.discard_redo();
        self.records.push(record);
        if self.records.len() > self.limit {
            self.records.remove(0);
        }
    }

    /// Restore the document to before the newest not-yet-undone record.
    pub fn undo(&mut self, doc: &mut Document) -> Result<&Record> {
        if !self.can_undo() {
            return Err(EditError::NothingToUndo);
        }
        let index = self.records.len() - 1 - self.undone;
        self.undone += 1;
        let record = &mut self.records[index];
        // Redo comes back to where the cursor is now.
        if record.after.tree.resolve(doc.cursor.path()).is_ok() {
            record.after.cursor.clone_from(&doc.cursor);
        }
        doc.clone_from(&record.before);
        Ok(record)
    }

    /// Re-apply the most recently undone record.
    pub fn redo(&mut self, doc: &mut Document) -> Result<&Record> {
        if !self.can_redo() {
            return Err(EditError::NothingToRedo);
        }
        self.undone -= 1;
        let index = self.records.len() - 1 - self.undone;
        let record = &mut self.records[index];
        if record.before.tree.resolve(doc.cursor.path()).is_ok() {
            record.before.cursor.clone_from(&doc.cursor);
        }
        doc.clone_from(&record.after);
        Ok(record)
    }
}
