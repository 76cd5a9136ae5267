//! Input rules
//!
//! Host input (typed text, Enter, Backspace, Delete) is offered to an ordered
//! chain of named rules before the default edit runs. Each rule either handles
//! the input completely, issuing its own edits on the transaction, or passes
//! it on to the next rule. The chain is fixed at construction time.

mod deletion;
mod shortcuts;

use log::debug;

use crate::editor::Transaction;
use crate::error::EditError;
use crate::model::{ElementKind, Path, Point};

pub use deletion::{BlockResetOnDelete, VoidDeletion};
pub use shortcuts::{BlockQuoteShortcut, CodeFenceShortcut, HeadingShortcut, ListShortcut};

/// A discrete input event from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    InsertText(&'a str),
    InsertBreak,
    DeleteBackward,
    DeleteForward,
}

/// Outcome of offering an input to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    Handled,
    Passthrough,
}

/// One interceptor in the chain.
pub trait InputRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Handle `input` on the transaction or pass. A rule that passes must not
    /// have changed the transaction.
    fn try_handle(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError>;
}

/// Ordered rule pipeline.
pub struct RuleChain {
    rules: Vec<Box<dyn InputRule>>,
}

impl Default for RuleChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RuleChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl RuleChain {
    /// A chain with no rules; every input falls through.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Markdown shortcuts in priority order (heading, quote, list, code fence),
    /// then the block-specific deletion overrides.
    pub fn standard() -> Self {
        Self::empty()
            .with(HeadingShortcut)
            .with(BlockQuoteShortcut)
            .with(ListShortcut)
            .with(CodeFenceShortcut)
            .with(BlockResetOnDelete)
            .with(VoidDeletion)
    }

    /// Append a rule at the lowest priority.
    pub fn with(mut self, rule: impl InputRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Offer `input` to each rule in order until one handles it.
    pub fn dispatch(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError> {
        for rule in &self.rules {
            if rule.try_handle(tx, input)? == Handling::Handled {
                debug!("{:?} handled by {}", input, rule.name());
                return Ok(Handling::Handled);
            }
        }
        Ok(Handling::Passthrough)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Caret Context
// ─────────────────────────────────────────────────────────────────────────────

/// The line under a collapsed caret.
#[derive(Debug, Clone)]
pub(crate) struct CaretLine {
    pub caret: Point,
    pub line: Path,
    pub kind: ElementKind,
}

impl CaretLine {
    /// `None` when there is no selection or it is expanded.
    pub fn of(tx: &Transaction) -> Option<Self> {
        let sel = tx.selection()?;
        if sel.is_expanded() {
            return None;
        }
        let doc = tx.document();
        let line = doc.line_block(&sel.focus.path)?;
        let kind = doc.kind(&line)?.clone();
        Some(Self {
            caret: sel.focus.clone(),
            line,
            kind,
        })
    }

    /// Text of the line from its start up to the caret.
    pub fn text_before(&self, tx: &Transaction) -> String {
        tx.document().line_text_before(&self.line, &self.caret)
    }

    pub fn at_start(&self, tx: &Transaction) -> bool {
        tx.document().start_of(&self.line).as_ref() == Some(&self.caret)
    }

    pub fn at_end(&self, tx: &Transaction) -> bool {
        tx.document().end_of(&self.line).as_ref() == Some(&self.caret)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
