//! # Undo/Redo History
//!
//! Bounded linear history of document snapshots.
//!
//! ## Design
//!
//! - Each accepted edit records the document as it was *before* the edit
//! - Undo swaps the current document with the most recent past snapshot
//!   and moves the current one to the front of the future
//! - Redo is the mirror image
//! - New edits clear the future (redo is invalidated once history diverges)
//! - `past` holds at most `capacity` entries; the oldest is evicted first
//!
//! Snapshots are `Arc`s so recording one is a pointer copy.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new();
//! history.record(current.clone());
//! current = next;
//!
//! if let Some(previous) = history.undo(current.clone()) {
//!     current = previous;
//! }
//! ```

use crate::ConfigDocument;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of undo levels
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Immutable snapshot of a full document
pub type HistoryEntry = Arc<ConfigDocument>;

#[derive(Debug)]
pub struct History {
    /// Snapshots before each edit (most recent last)
    past: VecDeque<HistoryEntry>,

    /// Snapshots undone from (most recent first)
    future: VecDeque<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    capacity: usize,
}

impl History {
    /// History with the default capacity (50)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            capacity,
        }
    }

    /// Record the document as it was before an edit
    pub fn record(&mut self, previous: HistoryEntry) {
        self.past.push_back(previous);

        if self.capacity > 0 && self.past.len() > self.capacity {
            self.past.pop_front();
        }

        self.future.clear();
    }

    /// Step back; returns the document to make current, or `None` if there
    /// is nothing to undo
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let previous = self.past.pop_back()?;
        self.future.push_front(current);
        Some(previous)
    }

    /// Step forward; returns the document to make current, or `None` if
    /// there is nothing to redo
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let next = self.future.pop_front()?;
        self.past.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.past.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.future.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop both stacks; the current document is not touched
    pub fn reset(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(n: i64) -> HistoryEntry {
        Arc::new(ConfigDocument::from_value(json!({ "hero": { "n": n } })).unwrap())
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_undo_redo() {
        let mut history = History::new();

        history.record(snapshot(0));
        let current = snapshot(1);
        assert!(history.can_undo());

        let undone = history.undo(current.clone()).unwrap();
        assert_eq!(undone, snapshot(0));
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 1);

        let redone = history.redo(undone).unwrap();
        assert_eq!(redone, current);
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_empty_undo_and_redo_are_noops() {
        let mut history = History::new();
        assert!(history.undo(snapshot(0)).is_none());
        assert!(history.redo(snapshot(0)).is_none());
        assert_eq!(history.redo_levels(), 0);
        assert_eq!(history.undo_levels(), 0);
    }

    #[test]
    fn test_new_record_clears_future() {
        let mut history = History::new();
        history.record(snapshot(0));
        let previous = history.undo(snapshot(1)).unwrap();
        assert_eq!(history.redo_levels(), 1);

        history.record(previous);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_enforced() {
        let mut history = History::with_capacity(3);
        for n in 0..5 {
            history.record(snapshot(n));
        }
        assert_eq!(history.undo_levels(), 3);

        // Oldest two were evicted
        let mut current = snapshot(5);
        let mut seen = Vec::new();
        while let Some(previous) = history.undo(current.clone()) {
            seen.push(previous.clone());
            current = previous;
        }
        assert_eq!(seen, vec![snapshot(4), snapshot(3), snapshot(2)]);
        assert_eq!(history.redo_levels(), 3);
    }

    #[test]
    fn test_future_is_most_recent_first() {
        let mut history = History::new();
        history.record(snapshot(0));
        history.record(snapshot(1));
        let mut current = snapshot(2);

        current = history.undo(current).unwrap();
        current = history.undo(current).unwrap();
        assert_eq!(current, snapshot(0));

        current = history.redo(current).unwrap();
        assert_eq!(current, snapshot(1));
        current = history.redo(current).unwrap();
        assert_eq!(current, snapshot(2));
    }

    #[test]
    fn test_reset_clears_both_stacks() {
        let mut history = History::new();
        history.record(snapshot(0));
        history.record(snapshot(1));
        history.undo(snapshot(2));

        history.reset();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_unlimited_capacity() {
        let mut history = History::with_capacity(0);
        for n in 0..200 {
            history.record(snapshot(n));
        }
        assert_eq!(history.undo_levels(), 200);
    }
}
