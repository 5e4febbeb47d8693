//! Linear undo/redo history.
//!
//! Snapshots form a single line with a cursor pointing at the current state.
//! Committing after an undo truncates everything past the cursor: there is
//! no branching.
//!
//! ```text
//! commit A, B, C        [A, B, C]   cursor → C
//! undo                  [A, B, C]   cursor → B   (C is redoable)
//! commit D              [A, B, D]   cursor → D   (C is gone)
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Nothing to redo")]
    NothingToRedo,
}

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    cursor: usize,
    /// Oldest entries are dropped beyond this many. `None` is unbounded.
    max_entries: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_entries: None,
        }
    }
}

impl<T> History<T> {
    /// History capped at `max_entries` snapshots (at least one).
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::default()
        }
    }

    /// Drop every entry and start over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push(initial);
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Truncate after the cursor, append, and move the cursor to the new end.
    pub fn commit(&mut self, snapshot: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        if let Some(max) = self.max_entries {
            let excess = self.entries.len().saturating_sub(max);
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Result<&T, HistoryError> {
        if !self.can_undo() {
            return Err(HistoryError::NothingToUndo);
        }
        self.cursor -= 1;
        Ok(&self.entries[self.cursor])
    }

    pub fn redo(&mut self) -> Result<&T, HistoryError> {
        if !self.can_redo() {
            return Err(HistoryError::NothingToRedo);
        }
        self.cursor += 1;
        Ok(&self.entries[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    #[cfg(test)]
    fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
