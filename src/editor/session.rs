//! Editor session
//!
//! [`Editor`] owns the published document snapshot and is the entry point for
//! host input. Every call stages a copy of the snapshot in a [`Transaction`],
//! runs the edit, normalizes and publishes the result. A failing edit is
//! discarded and the published snapshot stays as it was.

use std::sync::Arc;

use log::debug;

use crate::config::Settings;
use crate::error::EditError;
use crate::markdown;
use crate::model::{
    Alignment, DiagramProps, Document, Edge, Element, ImagePatch, ImageProps, Mark, Marks,
    Metadata, Node, NodePatch, Path, Selection,
};
use crate::rules::{Handling, Input, RuleChain};

use super::commands::{self, BlockType, FormattingState, Payload};
use super::history::{Entry, History};
use super::normalize::normalize_document;
use super::stats::{DocumentStats, DEFAULT_WORDS_PER_MINUTE};
use super::transaction::Transaction;
use super::transforms::{self, At, Mode};

/// An editing session over one document.
#[derive(Debug)]
pub struct Editor {
    document: Arc<Document>,
    selection: Option<Selection>,
    rules: RuleChain,
    history: History,
    /// Marks for the next inserted text, set by toggling a mark on a caret
    pending_marks: Option<Marks>,
    /// Incremented whenever the published document changes
    version: u64,
    saved_version: u64,
    words_per_minute: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Document::default())
    }
}

impl Editor {
    /// Start a session with the standard rule chain. The document is
    /// normalized and the caret placed at its start.
    pub fn new(document: Document) -> Self {
        Self::with_rules(document, RuleChain::standard())
    }

    pub fn with_rules(document: Document, rules: RuleChain) -> Self {
        let document = normalize_document(document);
        let selection = document.start().map(Selection::collapsed);
        Self {
            document: Arc::new(document),
            selection,
            rules,
            history: History::default(),
            pending_marks: None,
            version: 0,
            saved_version: 0,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }

    /// Apply the history limit and reading speed from settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.history = History::new(settings.history_limit);
        self.words_per_minute = settings.words_per_minute;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snapshot Access
    // ─────────────────────────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The current normalized snapshot, shared without copying.
    pub fn snapshot(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Content version, bumped on every published change including undo/redo.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_modified(&self) -> bool {
        self.version != self.saved_version
    }

    pub fn mark_saved(&mut self) {
        self.saved_version = self.version;
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::from_document_with_rate(&self.document, self.words_per_minute)
    }

    pub fn to_markdown(&self, metadata: Option<&Metadata>) -> String {
        markdown::to_markdown(&self.document, metadata)
    }

    /// Replace the document wholesale, as when loading. History is cleared.
    pub fn load(&mut self, document: Document) {
        let document = normalize_document(document);
        self.selection = document.start().map(Selection::collapsed);
        self.document = Arc::new(document);
        self.history.clear();
        self.pending_marks = None;
        self.version += 1;
        self.saved_version = self.version;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transactions
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `edit` on a staged copy and publish the normalized result.
    /// Returns `false` (and changes nothing) when the edit fails.
    fn transact<F>(&mut self, label: &str, edit: F) -> bool
    where
        F: FnOnce(&mut Transaction, &RuleChain) -> Result<(), EditError>,
    {
        let mut tx = Transaction::new((*self.document).clone(), self.selection.clone());
        if let Err(err) = edit(&mut tx, &self.rules) {
            debug!("{} discarded: {}", label, err);
            return false;
        }
        let (document, selection) = tx.commit();
        let changed = document != *self.document;
        if changed {
            self.history.record(Entry {
                document: Arc::clone(&self.document),
                selection: self.selection.clone(),
            });
            self.document = Arc::new(document);
            self.version += 1;
        }
        if changed || selection != self.selection {
            self.pending_marks = None;
        }
        self.selection = selection;
        true
    }

    fn current_entry(&self) -> Entry {
        Entry {
            document: Arc::clone(&self.document),
            selection: self.selection.clone(),
        }
    }

    fn restore(&mut self, entry: Entry) {
        self.document = entry.document;
        self.selection = entry
            .selection
            .and_then(|sel| {
                let anchor = self.document.clamp_point(&sel.anchor)?;
                let focus = self.document.clamp_point(&sel.focus)?;
                Some(Selection::new(anchor, focus))
            })
            .or_else(|| self.document.start().map(Selection::collapsed));
        self.pending_marks = None;
        self.version += 1;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Undo / Redo
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns `true` if undo was performed.
    pub fn undo(&mut self) -> bool {
        let current = self.current_entry();
        match self.history.undo(current) {
            Some(entry) => {
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if redo was performed.
    pub fn redo(&mut self) -> bool {
        let current = self.current_entry();
        match self.history.redo(current) {
            Some(entry) => {
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Host Input
    // ─────────────────────────────────────────────────────────────────────────

    /// Typed text. Input rules see it first; otherwise it is inserted with any
    /// pending marks.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let marks = self.pending_marks;
        self.transact("insert_text", |tx, rules| {
            if rules.dispatch(tx, Input::InsertText(text))? == Handling::Handled {
                return Ok(());
            }
            transforms::insert_text(tx, text, marks)
        })
    }

    /// Enter.
    pub fn insert_break(&mut self) -> bool {
        self.transact("insert_break", |tx, rules| {
            if rules.dispatch(tx, Input::InsertBreak)? == Handling::Handled {
                return Ok(());
            }
            commands::insert_break(tx)
        })
    }

    /// Backspace.
    pub fn delete_backward(&mut self) -> bool {
        self.transact("delete_backward", |tx, rules| {
            if rules.dispatch(tx, Input::DeleteBackward)? == Handling::Handled {
                return Ok(());
            }
            transforms::delete_backward(tx)
        })
    }

    /// Delete.
    pub fn delete_forward(&mut self) -> bool {
        self.transact("delete_forward", |tx, rules| {
            if rules.dispatch(tx, Input::DeleteForward)? == Handling::Handled {
                return Ok(());
            }
            transforms::delete_forward(tx)
        })
    }

    pub fn paste(&mut self, payload: Payload) -> bool {
        self.transact("paste", |tx, _| commands::paste(tx, payload))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Node Operations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn insert_nodes(&mut self, nodes: Vec<Node>, at: Option<At>) -> bool {
        self.transact("insert_nodes", |tx, _| {
            transforms::insert_nodes(tx, nodes, at).map(|_| ())
        })
    }

    pub fn remove_nodes(&mut self, at: Option<At>, pred: impl Fn(&Node) -> bool, mode: Mode) -> bool {
        self.transact("remove_nodes", |tx, _| transforms::remove_nodes(tx, at, pred, mode))
    }

    pub fn set_nodes(
        &mut self,
        patch: NodePatch,
        at: Option<At>,
        pred: impl Fn(&Node) -> bool,
        mode: Mode,
    ) -> bool {
        self.transact("set_nodes", |tx, _| transforms::set_nodes(tx, patch, at, pred, mode))
    }

    pub fn wrap_nodes(&mut self, wrapper: Element, at: Option<At>, split: bool) -> bool {
        self.transact("wrap_nodes", |tx, _| transforms::wrap_nodes(tx, wrapper, at, split))
    }

    pub fn unwrap_nodes(&mut self, pred: impl Fn(&Node) -> bool, at: Option<At>, split: bool) -> bool {
        self.transact("unwrap_nodes", |tx, _| transforms::unwrap_nodes(tx, pred, at, split))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the selection. Invalid points leave it unchanged.
    pub fn select(&mut self, selection: Selection) -> bool {
        self.transact("select", |tx, _| transforms::select(tx, selection))
    }

    /// Move the caret by `distance` positions, clamped to the document.
    pub fn move_selection(&mut self, distance: isize) -> bool {
        self.transact("move_selection", |tx, _| transforms::move_selection(tx, distance))
    }

    pub fn collapse(&mut self, edge: Edge) -> bool {
        self.transact("collapse", |tx, _| transforms::collapse(tx, edge))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    pub fn insert_image(&mut self, props: ImageProps) -> Option<Path> {
        let mut inserted = None;
        self.transact("insert_image", |tx, _| {
            inserted = Some(commands::insert_image(tx, props)?);
            Ok(())
        });
        inserted
    }

    pub fn update_image(&mut self, path: Path, patch: ImagePatch) -> bool {
        self.transact("update_image", |tx, _| commands::update_image(tx, path, patch))
    }

    pub fn insert_diagram(&mut self, diagram_type: &str, code: &str) -> Option<Path> {
        let mut inserted = None;
        self.transact("insert_diagram", |tx, _| {
            inserted = Some(commands::insert_diagram(tx, diagram_type, code)?);
            Ok(())
        });
        inserted
    }

    pub fn update_diagram(&mut self, path: Path, props: DiagramProps) -> bool {
        self.transact("update_diagram", |tx, _| commands::update_diagram(tx, path, props))
    }

    pub fn insert_table(&mut self, rows: usize, columns: usize) -> Option<Path> {
        let mut inserted = None;
        self.transact("insert_table", |tx, _| {
            inserted = Some(commands::insert_table(tx, rows, columns)?);
            Ok(())
        });
        inserted
    }

    pub fn insert_table_row(&mut self) -> bool {
        self.transact("insert_table_row", |tx, _| {
            commands::insert_table_row(tx).map(|_| ())
        })
    }

    pub fn insert_table_column(&mut self) -> bool {
        self.transact("insert_table_column", |tx, _| commands::insert_table_column(tx))
    }

    pub fn insert_link(&mut self, url: &str, text: Option<&str>) -> bool {
        self.transact("insert_link", |tx, _| commands::insert_link(tx, url, text))
    }

    /// Toggle a mark on the selection. On a caret the change applies to the
    /// next typed text instead.
    pub fn toggle_mark(&mut self, mark: Mark) -> bool {
        let Some(sel) = self.selection.clone() else {
            return false;
        };
        if sel.is_expanded() {
            return self.transact("toggle_mark", |tx, _| commands::toggle_mark_range(tx, mark));
        }
        let base = self
            .pending_marks
            .unwrap_or_else(|| commands::marks_at(&self.document, &sel.focus));
        self.pending_marks = Some(base.toggled(mark));
        true
    }

    pub fn toggle_block(&mut self, block: BlockType) -> bool {
        self.transact("toggle_block", |tx, _| commands::toggle_block(tx, block))
    }

    pub fn set_alignment(&mut self, align: Option<Alignment>) -> bool {
        self.transact("set_alignment", |tx, _| commands::set_alignment(tx, align))
    }

    /// Toolbar state, with pending marks taking precedence on a caret.
    pub fn formatting_state(&self) -> FormattingState {
        let mut state = commands::formatting_state(&self.document, self.selection.as_ref());
        if let Some(marks) = self.pending_marks {
            state.marks = marks;
        }
        state
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, HeadingLevel, Point};

    fn type_chars(editor: &mut Editor, text: &str) {
        for c in text.chars() {
            editor.insert_text(&c.to_string());
        }
    }

    fn caret(path: &[usize], offset: usize) -> Selection {
        Selection::collapsed(Point::new(path.to_vec(), offset))
    }

    #[test]
    fn test_new_normalizes_and_places_caret() {
        let editor = Editor::new(Document::new(vec![]));
        assert_eq!(editor.document().children, vec![Node::paragraph("")]);
        assert_eq!(editor.selection(), Some(&caret(&[0, 0], 0)));
    }

    #[test]
    fn test_end_to_end_image_then_paragraph() {
        let mut editor = Editor::new(Document::new(vec![Node::paragraph("Hello ")]));
        assert!(editor.select(caret(&[0, 0], 6)));
        assert!(editor.insert_image(ImageProps::new("a.png", "A")).is_some());
        assert!(editor.insert_nodes(vec![Node::paragraph("")], None));
        assert_eq!(editor.to_markdown(None), "Hello \n\n![A](a.png)\n\n");
    }

    #[test]
    fn test_numbered_list_shortcut() {
        let mut editor = Editor::default();
        type_chars(&mut editor, "1. ");
        assert_eq!(
            editor.document().children,
            vec![Node::element(
                ElementKind::NumberedList,
                vec![Node::list_item("")]
            )]
        );
        assert_eq!(editor.selection(), Some(&caret(&[0, 0, 0], 0)));
        assert_eq!(editor.to_markdown(None), "1. ");
    }

    #[test]
    fn test_four_hashes_stay_literal() {
        let mut editor = Editor::default();
        type_chars(&mut editor, "#### ");
        assert_eq!(editor.document().children, vec![Node::paragraph("#### ")]);
    }

    #[test]
    fn test_heading_shortcut_then_typing() {
        let mut editor = Editor::default();
        type_chars(&mut editor, "## Title");
        assert_eq!(
            editor.document().children,
            vec![Node::heading(HeadingLevel::H2, "Title")]
        );
    }

    #[test]
    fn test_backspace_after_image() {
        let mut editor = Editor::new(Document::new(vec![
            Node::image(ImageProps::new("a.png", "A")),
            Node::paragraph("after"),
        ]));
        editor.select(caret(&[1, 0], 0));
        assert!(editor.delete_backward());
        assert_eq!(editor.document().children, vec![Node::paragraph("after")]);
        assert_eq!(editor.selection(), Some(&caret(&[0, 0], 0)));
    }

    #[test]
    fn test_undo_redo_restores_snapshots() {
        let mut editor = Editor::default();
        type_chars(&mut editor, "ab");
        assert!(editor.undo());
        assert_eq!(editor.document().plain_text(), "a");
        assert!(editor.redo());
        assert_eq!(editor.document().plain_text(), "ab");
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_selection_only_change_is_not_recorded() {
        let mut editor = Editor::new(Document::new(vec![Node::paragraph("abc")]));
        editor.move_selection(2);
        assert!(!editor.can_undo());
        assert!(!editor.is_modified());
    }

    #[test]
    fn test_failed_edit_changes_nothing() {
        let mut editor = Editor::new(Document::new(vec![Node::paragraph("abc")]));
        let before = editor.snapshot();
        assert!(!editor.select(caret(&[4, 0], 0)));
        assert!(!editor.update_image(Path::new(vec![0]), ImagePatch::default()));
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_move_selection_out_of_bounds_clamps() {
        let mut editor = Editor::new(Document::new(vec![Node::paragraph("abc")]));
        assert!(editor.move_selection(-10));
        assert_eq!(editor.selection(), Some(&caret(&[0, 0], 0)));
    }

    #[test]
    fn test_pending_mark_applies_to_next_text() {
        let mut editor = Editor::new(Document::new(vec![Node::paragraph("a")]));
        editor.select(caret(&[0, 0], 1));
        editor.toggle_mark(Mark::Bold);
        assert!(editor.formatting_state().marks.bold);
        editor.insert_text("b");
        let children = editor.document().children[0].children();
        assert_eq!(children.len(), 2);
        assert!(children[1].as_text().is_some_and(|t| t.bold && t.text == "b"));
        assert_eq!(editor.to_markdown(None), "a**b**");
    }

    #[test]
    fn test_modified_tracking() {
        let mut editor = Editor::default();
        editor.insert_text("x");
        assert!(editor.is_modified());
        editor.mark_saved();
        assert!(!editor.is_modified());
    }

    #[test]
    fn test_settings_apply_history_limit() {
        let settings = Settings {
            history_limit: 1,
            ..Settings::default()
        };
        let mut editor = Editor::default().with_settings(&settings);
        type_chars(&mut editor, "abc");
        assert!(editor.undo());
        assert!(!editor.undo());
    }
}
