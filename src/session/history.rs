//! Snapshot history backing undo/redo for one annotation session.
//!
//! Every mutation of the committed boxes first records the previous list
//! here. Undo swaps the current list with the latest snapshot; redo swaps
//! it back. Recording a new snapshot clears the redo side.

use crate::geom::BoundingBox;

/// Configuration for the history.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept; the oldest is dropped first.
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

type Snapshot = Vec<BoundingBox>;

#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    config: HistoryConfig,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Records the state before a mutation.
    pub fn record(&mut self, before: &[BoundingBox]) {
        self.redo_stack.clear();
        self.undo_stack.push(before.to_vec());
        if self.undo_stack.len() > self.config.max_history {
            let excess = self.undo_stack.len() - self.config.max_history;
            self.undo_stack.drain(..excess);
        }
    }

    /// Returns the state to restore, stashing `current` for redo.
    pub fn undo(&mut self, current: &[BoundingBox]) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.to_vec());
        Some(previous)
    }

    /// Returns the state to re-apply, stashing `current` for undo.
    pub fn redo(&mut self, current: &[BoundingBox]) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.to_vec());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
