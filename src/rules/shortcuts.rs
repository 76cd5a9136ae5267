//! Markdown shortcut autoconversion
//!
//! Typing a Markdown block prefix at the start of a line converts the line to
//! the matching block type. A rule looks at the text from the line start to
//! the caret plus the text being inserted and fires only on an exact match;
//! the prefix is removed and the keystroke is consumed.

use regex::Regex;
use std::sync::OnceLock;

use crate::editor::{transforms, Transaction};
use crate::error::EditError;
use crate::model::{Element, ElementKind, HeadingLevel, NodePatch};

use super::{CaretLine, Handling, Input, InputRule};

/// Cached regex for an ordered list marker before the space.
fn numbered_marker() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+\.$").ok()).as_ref()
}

/// Block kinds a shortcut may convert.
fn convertible(kind: &ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Paragraph | ElementKind::Heading { .. } | ElementKind::BlockQuote
    )
}

/// The caret line and its would-be text when `input` is typed text.
fn typed_line(tx: &Transaction, input: Input<'_>) -> Option<(CaretLine, String)> {
    let Input::InsertText(text) = input else {
        return None;
    };
    let line = CaretLine::of(tx)?;
    let mut typed = line.text_before(tx);
    typed.push_str(text);
    Some((line, typed))
}

/// Delete the line's text from its start to the caret.
fn clear_prefix(tx: &mut Transaction, line: &CaretLine) -> Result<(), EditError> {
    let start = tx
        .document()
        .start_of(&line.line)
        .ok_or_else(|| EditError::InvalidPath(line.line.clone()))?;
    transforms::delete_range(tx, start, line.caret.clone())
}

// ─────────────────────────────────────────────────────────────────────────────
// Heading
// ─────────────────────────────────────────────────────────────────────────────

/// `# `, `## ` and `### ` convert the line to a heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingShortcut;

impl InputRule for HeadingShortcut {
    fn name(&self) -> &'static str {
        "heading-shortcut"
    }

    fn try_handle(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError> {
        let Some((line, typed)) = typed_line(tx, input) else {
            return Ok(Handling::Passthrough);
        };
        if !convertible(&line.kind) {
            return Ok(Handling::Passthrough);
        }
        let level = match typed.as_str() {
            "# " => HeadingLevel::H1,
            "## " => HeadingLevel::H2,
            "### " => HeadingLevel::H3,
            _ => return Ok(Handling::Passthrough),
        };
        clear_prefix(tx, &line)?;
        tx.set_node(line.line, NodePatch::kind(ElementKind::heading(level)))?;
        Ok(Handling::Handled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Quote
// ─────────────────────────────────────────────────────────────────────────────

/// `> ` converts the line to a block quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockQuoteShortcut;

impl InputRule for BlockQuoteShortcut {
    fn name(&self) -> &'static str {
        "block-quote-shortcut"
    }

    fn try_handle(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError> {
        let Some((line, typed)) = typed_line(tx, input) else {
            return Ok(Handling::Passthrough);
        };
        if !convertible(&line.kind) || typed != "> " {
            return Ok(Handling::Passthrough);
        }
        clear_prefix(tx, &line)?;
        tx.set_node(line.line, NodePatch::kind(ElementKind::BlockQuote))?;
        Ok(Handling::Handled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lists
// ─────────────────────────────────────────────────────────────────────────────

/// `- ` / `* ` start a bulleted list, `<N>. ` a numbered one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListShortcut;

impl ListShortcut {
    fn list_kind(typed: &str) -> Option<ElementKind> {
        match typed {
            "- " | "* " => Some(ElementKind::BulletedList),
            _ => {
                let marker = typed.strip_suffix(' ')?;
                numbered_marker()
                    .is_some_and(|re| re.is_match(marker))
                    .then_some(ElementKind::NumberedList)
            }
        }
    }
}

impl InputRule for ListShortcut {
    fn name(&self) -> &'static str {
        "list-shortcut"
    }

    fn try_handle(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError> {
        let Some((line, typed)) = typed_line(tx, input) else {
            return Ok(Handling::Passthrough);
        };
        let in_item = line.kind == ElementKind::ListItem;
        if !convertible(&line.kind) && !in_item {
            return Ok(Handling::Passthrough);
        }
        let Some(list_kind) = Self::list_kind(&typed) else {
            return Ok(Handling::Passthrough);
        };
        clear_prefix(tx, &line)?;

        let parent = line
            .line
            .parent()
            .ok_or_else(|| EditError::InvalidPath(line.line.clone()))?;
        if in_item {
            if tx.document().kind(&parent) == Some(&list_kind) {
                return Ok(Handling::Handled);
            }
            // Only this item changes kind; its siblings stay in the old list.
            let item = transforms::lift_node(tx, &line.line)?;
            let root = item
                .parent()
                .ok_or_else(|| EditError::InvalidPath(item.clone()))?;
            let index = item.index().unwrap_or(0);
            tx.wrap_nodes(root, index, 1, Element::new(list_kind, vec![]))?;
            return Ok(Handling::Handled);
        }

        tx.set_node(line.line.clone(), NodePatch::kind(ElementKind::ListItem))?;
        let index = line.line.index().unwrap_or(0);
        let previous_list = line
            .line
            .previous()
            .filter(|prev| tx.document().kind(prev) == Some(&list_kind));
        match previous_list {
            Some(prev) => {
                let len = tx.document().node(&prev).map(|n| n.children().len()).unwrap_or(0);
                tx.move_node(line.line.clone(), prev.child(len))?;
            }
            None => tx.wrap_nodes(parent, index, 1, Element::new(list_kind, vec![]))?,
        }
        Ok(Handling::Handled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Code Fence
// ─────────────────────────────────────────────────────────────────────────────

/// A third backtick after two, or Enter on a line that is exactly three
/// backticks, converts the line to a code block.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeFenceShortcut;

const FENCE: &str = "```";

impl InputRule for CodeFenceShortcut {
    fn name(&self) -> &'static str {
        "code-fence-shortcut"
    }

    fn try_handle(&self, tx: &mut Transaction, input: Input<'_>) -> Result<Handling, EditError> {
        let matched = match input {
            Input::InsertText(_) => typed_line(tx, input)
                .filter(|(line, typed)| convertible(&line.kind) && typed == FENCE)
                .map(|(line, _)| line),
            Input::InsertBreak => CaretLine::of(tx).filter(|line| {
                convertible(&line.kind)
                    && line.at_end(tx)
                    && tx.document().node(&line.line).map(|n| n.text_content()).as_deref()
                        == Some(FENCE)
            }),
            _ => None,
        };
        let Some(line) = matched else {
            return Ok(Handling::Passthrough);
        };
        clear_prefix(tx, &line)?;
        tx.set_node(line.line, NodePatch::kind(ElementKind::code_block()))?;
        Ok(Handling::Handled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Node, Point, Selection};

    fn tx_with(doc: Document, path: &[usize], offset: usize) -> Transaction {
        Transaction::new(doc, Some(Selection::collapsed(Point::new(path.to_vec(), offset))))
    }

    fn line(text: &str) -> Transaction {
        let len = text.chars().count();
        tx_with(Document::new(vec![Node::paragraph(text)]), &[0, 0], len)
    }

    #[test]
    fn test_heading_levels() {
        for (prefix, level) in [("#", HeadingLevel::H1), ("##", HeadingLevel::H2), ("###", HeadingLevel::H3)] {
            let mut tx = line(prefix);
            let handled = HeadingShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap();
            assert_eq!(handled, Handling::Handled);
            let (doc, _) = tx.commit();
            assert_eq!(doc.children[0], Node::heading(level, ""));
        }
    }

    #[test]
    fn test_four_hashes_do_not_convert() {
        let mut tx = line("####");
        let handled = HeadingShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap();
        assert_eq!(handled, Handling::Passthrough);
        assert_eq!(tx.op_count(), 0);
    }

    #[test]
    fn test_shortcut_needs_exact_line_match() {
        let mut tx = line("a#");
        assert_eq!(
            HeadingShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap(),
            Handling::Passthrough
        );
    }

    #[test]
    fn test_shortcut_ignores_expanded_selection() {
        let mut tx = line("#");
        tx.set_selection(Some(Selection::new(
            Point::new(vec![0, 0], 0),
            Point::new(vec![0, 0], 1),
        )));
        assert_eq!(
            HeadingShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap(),
            Handling::Passthrough
        );
    }

    #[test]
    fn test_block_quote() {
        let mut tx = line(">");
        assert_eq!(
            BlockQuoteShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap(),
            Handling::Handled
        );
        let (doc, _) = tx.commit();
        assert_eq!(doc.kind(&vec![0].into()), Some(&ElementKind::BlockQuote));
    }

    #[test]
    fn test_numbered_list() {
        let mut tx = line("1.");
        assert_eq!(
            ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap(),
            Handling::Handled
        );
        let (doc, sel) = tx.commit();
        assert_eq!(
            doc.children[0],
            Node::element(ElementKind::NumberedList, vec![Node::list_item("")])
        );
        assert_eq!(sel.unwrap().focus, Point::new(vec![0, 0, 0], 0));
    }

    #[test]
    fn test_bulleted_list_markers() {
        for marker in ["-", "*"] {
            let mut tx = line(marker);
            ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap();
            let (doc, _) = tx.commit();
            assert_eq!(doc.kind(&vec![0].into()), Some(&ElementKind::BulletedList));
        }
    }

    #[test]
    fn test_list_continues_previous_list() {
        let doc = Document::new(vec![
            Node::element(ElementKind::BulletedList, vec![Node::list_item("a")]),
            Node::paragraph("-"),
        ]);
        let mut tx = tx_with(doc, &[1, 0], 1);
        ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap();
        let (doc, _) = tx.commit();
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.children[0].children().len(), 2);
    }

    #[test]
    fn test_list_reused_inside_item() {
        let doc = Document::new(vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::list_item("1.")],
        )]);
        let mut tx = tx_with(doc, &[0, 0, 0], 2);
        ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap();
        let (doc, _) = tx.commit();
        assert_eq!(
            doc.children[0],
            Node::element(ElementKind::NumberedList, vec![Node::list_item("")])
        );
    }

    #[test]
    fn test_numbered_marker_inside_bulleted_list_splits_item_out() {
        let doc = Document::new(vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::list_item("a"), Node::list_item("1."), Node::list_item("c")],
        )]);
        let mut tx = tx_with(doc, &[0, 1, 0], 2);
        ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap();
        let (doc, sel) = tx.commit();
        assert_eq!(
            doc.children,
            vec![
                Node::element(ElementKind::BulletedList, vec![Node::list_item("a")]),
                Node::element(ElementKind::NumberedList, vec![Node::list_item("")]),
                Node::element(ElementKind::BulletedList, vec![Node::list_item("c")]),
            ]
        );
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0, 0], 0));
    }

    #[test]
    fn test_same_kind_marker_inside_list_keeps_list() {
        let doc = Document::new(vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::list_item("a"), Node::list_item("-")],
        )]);
        let mut tx = tx_with(doc, &[0, 1, 0], 1);
        ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap();
        let (doc, _) = tx.commit();
        assert_eq!(
            doc.children[0],
            Node::element(
                ElementKind::BulletedList,
                vec![Node::list_item("a"), Node::list_item("")]
            )
        );
    }

    #[test]
    fn test_non_ascii_digits_are_not_a_marker() {
        let mut tx = line("\u{663}.");
        assert_eq!(
            ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap(),
            Handling::Passthrough
        );
    }

    #[test]
    fn test_non_numeric_marker_ignored() {
        let mut tx = line("a.");
        assert_eq!(
            ListShortcut.try_handle(&mut tx, Input::InsertText(" ")).unwrap(),
            Handling::Passthrough
        );
    }

    #[test]
    fn test_code_fence_on_third_backtick() {
        let mut tx = line("``");
        assert_eq!(
            CodeFenceShortcut.try_handle(&mut tx, Input::InsertText("`")).unwrap(),
            Handling::Handled
        );
        let (doc, _) = tx.commit();
        assert_eq!(doc.kind(&vec![0].into()), Some(&ElementKind::code_block()));
        assert_eq!(doc.children[0].text_content(), "");
    }

    #[test]
    fn test_code_fence_on_enter() {
        let mut tx = line("```");
        assert_eq!(
            CodeFenceShortcut.try_handle(&mut tx, Input::InsertBreak).unwrap(),
            Handling::Handled
        );
        let mut tx = line("```js");
        assert_eq!(
            CodeFenceShortcut.try_handle(&mut tx, Input::InsertBreak).unwrap(),
            Handling::Passthrough
        );
    }
}
