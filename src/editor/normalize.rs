//! Normalization engine
//!
//! After every mutation the transaction's dirty paths are revisited bottom-up
//! and repaired until the tree satisfies its structural invariants:
//!
//! 1. void repair: Image and Diagram hold exactly one empty text leaf
//! 2. container repair: every element holds only the children its content
//!    model allows, and never none at all; the root holds only blocks
//! 3. table shape repair: every row is as wide as the widest row
//!
//! Each visit applies the first repair that is needed and returns; the ops it
//! issues mark the affected paths dirty again, so the loop converges on a tree
//! where no visit changes anything. Normalization never fails: an op that is
//! rejected is logged and the path is dropped.

use log::{debug, warn};

use crate::error::EditError;
use crate::model::{
    ContentModel, Document, Element, ElementKind, Node, NodePatch, Path, Text,
};

use super::transaction::Transaction;
use super::transforms;

/// Repair budget per dirty path seeded into a pass.
const ITERATIONS_PER_PATH: usize = 42;

/// Normalize every dirty path of `tx`.
pub fn normalize(tx: &mut Transaction) {
    let budget = (tx.dirty_len() + 1) * ITERATIONS_PER_PATH;
    let mut iterations = 0;
    while let Some(path) = tx.pop_dirty() {
        if iterations >= budget {
            warn!(
                "Normalization stopped after {} repairs; the document may be left unrepaired",
                iterations
            );
            break;
        }
        iterations += 1;
        if let Err(err) = normalize_path(tx, &path) {
            debug!("Skipping normalization at {:?}: {}", path.as_slice(), err);
        }
    }
}

/// Normalize a whole document from scratch.
pub fn normalize_document(doc: Document) -> Document {
    let mut tx = Transaction::new(doc, None);
    tx.mark_all_dirty();
    normalize(&mut tx);
    let (doc, _) = tx.commit();
    doc
}

/// Apply the first repair needed at `path`.
fn normalize_path(tx: &mut Transaction, path: &Path) -> Result<(), EditError> {
    if path.is_root() {
        return normalize_root(tx);
    }
    let element = match tx.document().node(path) {
        Some(Node::Element(element)) => element.clone(),
        _ => return Ok(()),
    };

    if element.kind.is_void() {
        return repair_void(tx, path, &element);
    }
    let repaired = match element.kind.content_model() {
        ContentModel::Inline => repair_text_block(tx, path, &element)?,
        ContentModel::TextOnly => repair_link(tx, path, &element)?,
        ContentModel::ListItems => repair_list(tx, path, &element)?,
        ContentModel::TableRows => repair_table(tx, path, &element)?,
        ContentModel::TableCells => repair_row(tx, path, &element)?,
        ContentModel::Void => false,
    };
    if !repaired && element.kind == ElementKind::Table {
        repair_table_shape(tx, path, &element)?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

fn normalize_root(tx: &mut Transaction) -> Result<(), EditError> {
    let children = tx.document().children.clone();
    if children.is_empty() {
        return tx.insert_node(Path::new(vec![0]), Node::paragraph(""));
    }
    for (i, child) in children.iter().enumerate() {
        let here = Path::new(vec![i]);
        if child.is_inline_content() {
            let run = inline_run(&children, i);
            return tx.wrap_nodes(Path::root(), i, run, Element::new(ElementKind::Paragraph, vec![]));
        }
        match child.kind() {
            Some(ElementKind::ListItem) | Some(ElementKind::TableCell) => {
                return tx.set_node(here, NodePatch::kind(ElementKind::Paragraph));
            }
            Some(ElementKind::TableRow) => {
                return tx.wrap_nodes(Path::root(), i, 1, Element::new(ElementKind::Table, vec![]));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Length of the run of inline content starting at `start`.
fn inline_run(children: &[Node], start: usize) -> usize {
    children[start..]
        .iter()
        .take_while(|child| child.is_inline_content())
        .count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Void Repair
// ─────────────────────────────────────────────────────────────────────────────

fn repair_void(tx: &mut Transaction, path: &Path, element: &Element) -> Result<(), EditError> {
    if element.children == [Node::Text(Text::default())] {
        return Ok(());
    }
    for i in (0..element.children.len()).rev() {
        tx.remove_node(path.child(i))?;
    }
    tx.insert_node(path.child(0), Node::Text(Text::default()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Container Repair
// ─────────────────────────────────────────────────────────────────────────────

fn repair_text_block(tx: &mut Transaction, path: &Path, element: &Element) -> Result<bool, EditError> {
    if element.children.is_empty() {
        tx.insert_node(path.child(0), Node::text(""))?;
        return Ok(true);
    }
    for (i, child) in element.children.iter().enumerate() {
        let Node::Element(inner) = child else {
            continue;
        };
        if inner.kind.is_inline() {
            continue;
        }
        if !inner.kind.is_void() {
            tx.unwrap_node(path.child(i))?;
            return Ok(true);
        }
        if path.len() == 1 {
            transforms::lift_node(tx, &path.child(i))?;
        } else {
            debug!(
                "Dropping {} nested inside {}",
                inner.kind.name(),
                element.kind.name()
            );
            tx.remove_node(path.child(i))?;
        }
        return Ok(true);
    }
    merge_adjacent_texts(tx, path, element)
}

/// Merge neighbouring text leaves with equal marks and drop empty leaves
/// that have siblings.
fn merge_adjacent_texts(tx: &mut Transaction, path: &Path, element: &Element) -> Result<bool, EditError> {
    let children = &element.children;
    for i in 1..children.len() {
        if let (Node::Text(prev), Node::Text(text)) = (&children[i - 1], &children[i]) {
            if prev.marks() == text.marks() {
                tx.merge_node(path.child(i))?;
                return Ok(true);
            }
        }
    }
    if children.len() > 1 {
        for (i, child) in children.iter().enumerate() {
            if matches!(child, Node::Text(text) if text.is_empty()) {
                tx.remove_node(path.child(i))?;
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn repair_link(tx: &mut Transaction, path: &Path, element: &Element) -> Result<bool, EditError> {
    for (i, child) in element.children.iter().enumerate() {
        if !child.is_text() {
            tx.unwrap_node(path.child(i))?;
            return Ok(true);
        }
    }
    if element.children.iter().all(|child| child.text_content().is_empty()) {
        tx.remove_node(path.clone())?;
        return Ok(true);
    }
    merge_adjacent_texts(tx, path, element)
}

fn repair_list(tx: &mut Transaction, path: &Path, element: &Element) -> Result<bool, EditError> {
    if element.children.is_empty() {
        tx.insert_node(path.child(0), Node::list_item(""))?;
        return Ok(true);
    }
    for (i, child) in element.children.iter().enumerate() {
        match child.kind() {
            Some(ElementKind::ListItem) => continue,
            None | Some(ElementKind::Link { .. }) => {
                let run = inline_run(&element.children, i);
                tx.wrap_nodes(path.clone(), i, run, Element::new(ElementKind::ListItem, vec![]))?;
            }
            Some(kind) if kind.is_list() => tx.unwrap_node(path.child(i))?,
            Some(_) => tx.set_node(path.child(i), NodePatch::kind(ElementKind::ListItem))?,
        }
        return Ok(true);
    }
    Ok(false)
}

fn repair_table(tx: &mut Transaction, path: &Path, element: &Element) -> Result<bool, EditError> {
    if element.children.is_empty() {
        let row = Node::element(
            ElementKind::TableRow,
            vec![Node::Element(Element::with_text(ElementKind::TableCell, ""))],
        );
        tx.insert_node(path.child(0), row)?;
        return Ok(true);
    }
    for (i, child) in element.children.iter().enumerate() {
        if child.kind() != Some(&ElementKind::TableRow) {
            tx.wrap_nodes(path.clone(), i, 1, Element::new(ElementKind::TableRow, vec![]))?;
            return Ok(true);
        }
    }
    Ok(false)
}

fn repair_row(tx: &mut Transaction, path: &Path, element: &Element) -> Result<bool, EditError> {
    if element.children.is_empty() {
        tx.insert_node(path.child(0), Node::Element(Element::with_text(ElementKind::TableCell, "")))?;
        return Ok(true);
    }
    for (i, child) in element.children.iter().enumerate() {
        match child.kind() {
            Some(ElementKind::TableCell) => continue,
            None | Some(ElementKind::Link { .. }) => {
                let run = inline_run(&element.children, i);
                tx.wrap_nodes(path.clone(), i, run, Element::new(ElementKind::TableCell, vec![]))?;
            }
            Some(kind) if kind.is_text_block() || kind.is_void() => {
                tx.set_node(path.child(i), NodePatch::kind(ElementKind::TableCell))?
            }
            Some(_) => tx.unwrap_node(path.child(i))?,
        }
        return Ok(true);
    }
    Ok(false)
}

// ─────────────────────────────────────────────────────────────────────────────
// Table Shape Repair
// ─────────────────────────────────────────────────────────────────────────────

/// Pad short rows with empty cells appended at the end.
fn repair_table_shape(tx: &mut Transaction, path: &Path, table: &Element) -> Result<(), EditError> {
    let width = table
        .children
        .iter()
        .map(|row| row.children().len())
        .max()
        .unwrap_or(0)
        .max(1);
    for (r, row) in table.children.iter().enumerate() {
        let row_path = path.child(r);
        for c in row.children().len()..width {
            tx.insert_node(
                row_path.child(c),
                Node::Element(Element::with_text(ElementKind::TableCell, "")),
            )?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
