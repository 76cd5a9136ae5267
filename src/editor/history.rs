//! Linear undo/redo history
//!
//! Snapshots are shared `Arc<Document>`s, so recording an entry is a pointer
//! copy. A new edit clears the redo stack.

use std::sync::Arc;

use crate::model::{Document, Selection};

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A published state to return to.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub document: Arc<Document>,
    pub selection: Option<Selection>,
}

/// Undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<Entry>,
    redo: Vec<Entry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state an edit is about to replace.
    pub fn record(&mut self, entry: Entry) {
        self.undo.push(entry);
        if self.undo.len() > self.limit {
            let excess = self.undo.len() - self.limit;
            self.undo.drain(..excess);
        }
        self.redo.clear();
    }

    /// Step back, handing in the current state so it can be redone.
    pub fn undo(&mut self, current: Entry) -> Option<Entry> {
        let entry = self.undo.pop()?;
        self.redo.push(current);
        Some(entry)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Entry) -> Option<Entry> {
        let entry = self.redo.pop()?;
        self.undo.push(current);
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn entry(text: &str) -> Entry {
        Entry {
            document: Arc::new(Document::new(vec![Node::paragraph(text)])),
            selection: None,
        }
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::new(10);
        history.record(entry("a"));
        let back = history.undo(entry("b")).unwrap();
        assert_eq!(back.document.plain_text(), "a");
        let forward = history.redo(entry("a")).unwrap();
        assert_eq!(forward.document.plain_text(), "b");
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        history.record(entry("a"));
        history.undo(entry("b"));
        assert!(history.can_redo());
        history.record(entry("c"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(2);
        history.record(entry("1"));
        history.record(entry("2"));
        history.record(entry("3"));
        assert_eq!(history.undo(entry("4")).unwrap().document.plain_text(), "3");
        assert_eq!(history.undo(entry("3")).unwrap().document.plain_text(), "2");
        assert!(history.undo(entry("2")).is_none());
    }
}
