//! Block-specific deletion overrides
//!
//! Backspace at the very start of a quote, list item or code block turns the
//! block back into a paragraph instead of merging it upward. Deleting toward
//! an image or diagram removes that void block whole.

use crate::editor::{transforms, Transaction};
use crate::error::EditError;
use crate::model::{ElementKind, NodePatch};

use super::{CaretLine, Handling, Input, InputRule};

// ─────────────────────────────────────────────────────────────────────────────
// Block Reset
// ─────────────────────────────────────────────────────────────────────────────

/// Backspace at offset 0 of a BlockQuote, ListItem or CodeBlock converts it to
/// a Paragraph. A list item is also lifted out of its list.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockResetOnDelete;

impl InputRule for BlockResetOnDelete {
    fn name(&self) -> &'static str {
        "block-reset-on-delete"
    }

    fn try_handle(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError> {
        if input != Input::DeleteBackward {
            return Ok(Handling::Passthrough);
        }
        let Some(line) = CaretLine::of(tx) else {
            return Ok(Handling::Passthrough);
        };
        let resettable = matches!(
            line.kind,
            ElementKind::BlockQuote | ElementKind::ListItem | ElementKind::CodeBlock { .. }
        );
        if !resettable || !line.at_start(tx) {
            return Ok(Handling::Passthrough);
        }
        tx.set_node(line.line.clone(), NodePatch::kind(ElementKind::Paragraph))?;
        if line.kind == ElementKind::ListItem {
            transforms::lift_node(tx, &line.line)?;
        }
        Ok(Handling::Handled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Void Deletion
// ─────────────────────────────────────────────────────────────────────────────

/// Deleting into an adjacent void block (or from inside one) removes it and
/// leaves the caret where it was.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidDeletion;

impl InputRule for VoidDeletion {
    fn name(&self) -> &'static str {
        "void-deletion"
    }

    fn try_handle(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError> {
        let backward = match input {
            Input::DeleteBackward => true,
            Input::DeleteForward => false,
            _ => return Ok(Handling::Passthrough),
        };
        let Some(line) = CaretLine::of(tx) else {
            return Ok(Handling::Passthrough);
        };
        let doc = tx.document();

        if line.kind.is_void() {
            tx.remove_node(line.line)?;
            return Ok(Handling::Handled);
        }

        let neighbour = if backward {
            if !line.at_start(tx) {
                return Ok(Handling::Passthrough);
            }
            doc.leaf_before(&line.caret.path)
        } else {
            if !line.at_end(tx) {
                return Ok(Handling::Passthrough);
            }
            doc.leaf_after(&line.caret.path)
        };
        let void = neighbour.and_then(|leaf| doc.void_above(&leaf));
        match void {
            Some(void) => {
                tx.remove_node(void)?;
                Ok(Handling::Handled)
            }
            None => Ok(Handling::Passthrough),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
