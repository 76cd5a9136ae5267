//! Mutation operations
//!
//! The composable edits every higher-level behaviour is built from: node
//! insertion and removal, property updates, wrapping and unwrapping, text
//! insertion and range deletion, and caret motion. Each runs against a
//! [`Transaction`]; an error aborts the whole transaction, so callers see
//! either the full edit or none of it.

use log::debug;

use crate::error::EditError;
use crate::model::{
    Document, Edge, Element, ElementKind, Marks, Node, NodePatch, Path, Point, Selection, Text,
};
use crate::string_utils::char_len;

use super::transaction::Transaction;

/// Where an operation applies when the selection should not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum At {
    /// Exactly the node at this path
    Path(Path),
    /// A caret position
    Point(Point),
    /// A range of the document
    Range(Selection),
}

/// Which of the nested matches in a range to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every match
    All,
    /// Matches without a matching ancestor
    Highest,
    /// Matches without a matching descendant
    #[default]
    Lowest,
}

// ─────────────────────────────────────────────────────────────────────────────
// Range Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Start and end points of a location, defaulting to the selection.
pub fn range_of(tx: &Transaction, at: Option<&At>) -> Result<(Point, Point), EditError> {
    let doc = tx.document();
    match at {
        Some(At::Path(path)) => {
            let start = doc
                .start_of(path)
                .ok_or_else(|| EditError::InvalidPath(path.clone()))?;
            let end = doc
                .end_of(path)
                .ok_or_else(|| EditError::InvalidPath(path.clone()))?;
            Ok((start, end))
        }
        Some(At::Point(point)) => Ok((point.clone(), point.clone())),
        Some(At::Range(range)) => Ok((range.start().clone(), range.end().clone())),
        None => tx
            .selection()
            .map(|sel| (sel.start().clone(), sel.end().clone()))
            .ok_or(EditError::NoSelection),
    }
}

/// Paths of the nodes spanned by the leaves `start..=end` that satisfy `pred`,
/// in document order.
pub fn nodes_in_range(
    doc: &Document,
    start: &Path,
    end: &Path,
    pred: impl Fn(&Node) -> bool,
    mode: Mode,
) -> Vec<Path> {
    let spanned: Vec<Path> = doc
        .descendants()
        .into_iter()
        .filter(|(path, node)| (path.contains(start) || (path > start && path <= end)) && pred(node))
        .map(|(path, _)| path)
        .collect();
    match mode {
        Mode::All => spanned,
        Mode::Highest => spanned
            .iter()
            .filter(|path| !spanned.iter().any(|other| other.is_ancestor_of(path)))
            .cloned()
            .collect(),
        Mode::Lowest => spanned
            .iter()
            .filter(|path| !spanned.iter().any(|other| path.is_ancestor_of(other)))
            .cloned()
            .collect(),
    }
}

/// Text blocks and voids touched by the location, in document order.
pub fn lines_in_range(tx: &Transaction, at: Option<&At>) -> Result<Vec<Path>, EditError> {
    let (start, end) = range_of(tx, at)?;
    Ok(nodes_in_range(
        tx.document(),
        &start.path,
        &end.path,
        |node| node.kind().is_some_and(|k| k.is_text_block() || k.is_void()),
        Mode::Lowest,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Insert `nodes` at the location (or the selection) and place the caret at
/// the end of the last one. Returns the paths the nodes were inserted at.
///
/// Inline content splits the text leaf under the caret. Block content is
/// placed after the caret's root block when the caret is at its end, and
/// otherwise splits the block at the caret.
pub fn insert_nodes(
    tx: &mut Transaction,
    nodes: Vec<Node>,
    at: Option<At>,
) -> Result<Vec<Path>, EditError> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }
    let point = match at {
        Some(At::Path(path)) => return insert_sequence(tx, path, nodes),
        Some(At::Point(point)) => point,
        Some(At::Range(range)) => {
            let start = range.start().clone();
            let r = tx.point_ref(start.clone());
            delete_range(tx, start, range.end().clone())?;
            tx.unref(r).ok_or(EditError::NoSelection)?
        }
        None => match tx.selection().cloned() {
            Some(sel) if sel.is_expanded() => {
                delete_range(tx, sel.start().clone(), sel.end().clone())?;
                tx.selection()
                    .map(|sel| sel.focus.clone())
                    .ok_or(EditError::NoSelection)?
            }
            Some(sel) => sel.focus,
            None => {
                let end = Path::new(vec![tx.document().children.len()]);
                return insert_sequence(tx, end, nodes);
            }
        },
    };

    let inline = nodes.iter().all(Node::is_inline_content);
    if inline && tx.document().void_above(&point.path).is_none() {
        let path = split_leaf_for_insert(tx, &point)?;
        return insert_sequence(tx, path, nodes);
    }
    let nodes = if inline {
        vec![Node::element(ElementKind::Paragraph, nodes)]
    } else {
        nodes
    };
    let index = split_to_root(tx, &point)?;
    insert_sequence(tx, Path::new(vec![index]), nodes)
}

fn insert_sequence(tx: &mut Transaction, first: Path, nodes: Vec<Node>) -> Result<Vec<Path>, EditError> {
    let mut inserted = Vec::with_capacity(nodes.len());
    let mut path = first;
    for node in nodes {
        tx.insert_node(path.clone(), node)?;
        inserted.push(path.clone());
        path = path.next();
    }
    if let Some(end) = inserted.last().and_then(|last| tx.document().end_of(last)) {
        tx.set_selection(Some(Selection::collapsed(end)));
    }
    Ok(inserted)
}

/// Split the leaf under `point` so inline nodes can go between the halves.
/// Returns the path the first inserted node should take.
fn split_leaf_for_insert(tx: &mut Transaction, point: &Point) -> Result<Path, EditError> {
    let len = tx
        .document()
        .text(&point.path)
        .map(Text::len)
        .ok_or_else(|| EditError::InvalidPath(point.path.clone()))?;
    if point.offset == 0 {
        return Ok(point.path.clone());
    }
    if point.offset < len {
        tx.split_node(point.path.clone(), point.offset)?;
    }
    Ok(point.path.next())
}

/// Split everything between `point` and its root block, returning the root
/// index where new blocks belong. Levels where the point already sits at an
/// edge are not split.
fn split_to_root(tx: &mut Transaction, point: &Point) -> Result<usize, EditError> {
    let root_index = *point
        .path
        .first()
        .ok_or_else(|| EditError::InvalidPath(point.path.clone()))?;
    let root = Path::new(vec![root_index]);
    let doc = tx.document();
    let opaque = doc
        .kind(&root)
        .is_some_and(|kind| kind.is_void() || *kind == ElementKind::Table);
    if opaque || doc.end_of(&root).as_ref() == Some(point) {
        return Ok(root_index + 1);
    }

    let leaf = &point.path;
    let len = doc
        .text(leaf)
        .map(Text::len)
        .ok_or_else(|| EditError::InvalidPath(leaf.clone()))?;
    let leaf_index = leaf.index().unwrap_or(0);
    let mut position = if point.offset == 0 {
        leaf_index
    } else if point.offset >= len {
        leaf_index + 1
    } else {
        tx.split_node(leaf.clone(), point.offset)?;
        leaf_index + 1
    };

    let mut current = leaf.parent();
    while let Some(path) = current {
        if path.is_root() {
            break;
        }
        let count = tx.document().node(&path).map(|n| n.children().len()).unwrap_or(0);
        let index = path.index().unwrap_or(0);
        position = if position == 0 {
            index
        } else if position >= count {
            index + 1
        } else {
            tx.split_node(path.clone(), position)?;
            index + 1
        };
        current = path.parent();
    }
    Ok(position)
}

/// Remove the node at a path, or the matching nodes in a range.
pub fn remove_nodes(
    tx: &mut Transaction,
    at: Option<At>,
    pred: impl Fn(&Node) -> bool,
    mode: Mode,
) -> Result<(), EditError> {
    if let Some(At::Path(path)) = at {
        return tx.remove_node(path);
    }
    let (start, end) = range_of(tx, at.as_ref())?;
    // Removing a node takes its descendants with it.
    let mode = match mode {
        Mode::All => Mode::Highest,
        other => other,
    };
    let paths = nodes_in_range(tx.document(), &start.path, &end.path, pred, mode);
    for path in paths.into_iter().rev() {
        tx.remove_node(path)?;
    }
    Ok(())
}

/// Shallow-merge `patch` onto the node at a path, or the matching nodes in a
/// range. Children are never touched.
pub fn set_nodes(
    tx: &mut Transaction,
    patch: NodePatch,
    at: Option<At>,
    pred: impl Fn(&Node) -> bool,
    mode: Mode,
) -> Result<(), EditError> {
    if let Some(At::Path(path)) = at {
        return tx.set_node(path, patch);
    }
    let (start, end) = range_of(tx, at.as_ref())?;
    let paths = nodes_in_range(tx.document(), &start.path, &end.path, pred, mode);
    for path in paths {
        tx.set_node(path, patch.clone())?;
    }
    Ok(())
}

/// Move the node at `path` out of its parent, splitting the parent around it.
/// Returns the node's new path.
pub fn lift_node(tx: &mut Transaction, path: &Path) -> Result<Path, EditError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.is_root())
        .ok_or_else(|| EditError::InvalidOperation("cannot lift a root block".to_string()))?;
    let index = path.index().unwrap_or(0);
    let count = tx
        .document()
        .node(&parent)
        .map(|n| n.children().len())
        .ok_or_else(|| EditError::InvalidPath(parent.clone()))?;
    if index + 1 < count {
        tx.split_node(parent.clone(), index + 1)?;
    }
    let target = if index > 0 {
        tx.split_node(parent.clone(), index)?;
        parent.next()
    } else {
        parent
    };
    tx.unwrap_node(target.clone())?;
    Ok(target)
}

// ─────────────────────────────────────────────────────────────────────────────
// Wrapping
// ─────────────────────────────────────────────────────────────────────────────

/// Put one level of `wrapper` around the nodes in the location.
///
/// A block wrapper goes around the blocks touched by the range, at the level
/// of their common ancestor. An inline wrapper goes around the inline content
/// of each line in the range; with `split` the text leaves at the range edges
/// are split so only the selected characters are wrapped.
pub fn wrap_nodes(
    tx: &mut Transaction,
    wrapper: Element,
    at: Option<At>,
    split: bool,
) -> Result<(), EditError> {
    let (start, end) = range_of(tx, at.as_ref())?;
    if wrapper.kind.is_inline() {
        return wrap_inline(tx, wrapper, start, end, split);
    }
    let lines = nodes_in_range(
        tx.document(),
        &start.path,
        &end.path,
        |node| node.kind().is_some_and(|k| k.is_text_block() || k.is_void()),
        Mode::Lowest,
    );
    let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
        return Ok(());
    };
    let shared = first
        .iter()
        .zip(last.iter())
        .take_while(|(a, b)| a == b)
        .count()
        .min(first.len().min(last.len()) - 1);
    let parent = first.truncated(shared);
    let from = first[shared];
    let to = last[shared];
    tx.wrap_nodes(parent, from, to - from + 1, wrapper)
}

fn wrap_inline(
    tx: &mut Transaction,
    wrapper: Element,
    start: Point,
    end: Point,
    split: bool,
) -> Result<(), EditError> {
    if start == end {
        return Ok(());
    }
    let Some((first_leaf, last_leaf)) = isolate_leaves(tx, start, end, split)? else {
        return Ok(());
    };

    let doc = tx.document();
    let mut groups: Vec<(Path, usize, usize)> = Vec::new();
    for leaf in doc
        .text_leaves()
        .into_iter()
        .filter(|leaf| *leaf >= first_leaf && *leaf <= last_leaf)
    {
        let Some(line) = doc.line_block(&leaf) else {
            continue;
        };
        if doc.kind(&line).is_some_and(ElementKind::is_void) {
            continue;
        }
        let child = leaf[line.len()];
        match groups.last_mut() {
            Some((path, _, to)) if *path == line => *to = child,
            _ => groups.push((line, child, child)),
        }
    }

    for (line, from, to) in groups.iter().rev() {
        tx.wrap_nodes(line.clone(), *from, to - from + 1, wrapper.clone())?;
    }
    if let (Some((first, from, _)), Some((last, last_from, _))) = (groups.first(), groups.last()) {
        let doc = tx.document();
        let anchor = doc.start_of(&first.child(*from));
        let focus = doc.end_of(&last.child(*last_from));
        if let (Some(anchor), Some(focus)) = (anchor, focus) {
            tx.set_selection(Some(Selection::new(anchor, focus)));
        }
    }
    Ok(())
}

/// Split text at the range edges so that whole leaves cover exactly the
/// range. Returns the first and last covered leaf, or `None` when the range
/// covers no characters.
pub(crate) fn isolate_leaves(
    tx: &mut Transaction,
    start: Point,
    end: Point,
    split: bool,
) -> Result<Option<(Path, Path)>, EditError> {
    let leaf_len = |tx: &Transaction, path: &Path| {
        tx.document()
            .text(path)
            .map(Text::len)
            .ok_or_else(|| EditError::InvalidPath(path.clone()))
    };

    // Last covered leaf, tracked by its end point.
    let end_len = leaf_len(tx, &end.path)?;
    let covered_end = if end.offset == 0 {
        match tx.document().leaf_before(&end.path) {
            Some(prev) if prev >= start.path => {
                let len = leaf_len(tx, &prev)?;
                Point::new(prev, len)
            }
            _ => return Ok(None),
        }
    } else {
        if split && end.offset < end_len {
            tx.split_node(end.path.clone(), end.offset)?;
        }
        let len = leaf_len(tx, &end.path)?;
        Point::new(end.path.clone(), len)
    };
    let end_ref = tx.point_ref(covered_end);

    let start_len = leaf_len(tx, &start.path)?;
    let mut first = start.path.clone();
    if start.offset >= start_len && start.offset > 0 {
        match tx.document().leaf_after(&start.path) {
            Some(next) => first = next,
            None => return Ok(None),
        }
    } else if split && start.offset > 0 {
        tx.split_node(start.path.clone(), start.offset)?;
        first = start.path.next();
    }

    let last = tx.unref(end_ref).map(|p| p.path).ok_or(EditError::NoSelection)?;
    if first > last {
        return Ok(None);
    }
    Ok(Some((first, last)))
}

/// Remove one level of container for the matching elements in the location.
/// With `split`, a matched element only partly inside the range is split so
/// that only the covered children are unwrapped.
pub fn unwrap_nodes(
    tx: &mut Transaction,
    pred: impl Fn(&Node) -> bool,
    at: Option<At>,
    split: bool,
) -> Result<(), EditError> {
    if let Some(At::Path(path)) = at {
        return tx.unwrap_node(path);
    }
    let (start, end) = range_of(tx, at.as_ref())?;
    let matches = nodes_in_range(
        tx.document(),
        &start.path,
        &end.path,
        |node| matches!(node, Node::Element(_)) && pred(node),
        Mode::Lowest,
    );
    for path in matches.into_iter().rev() {
        if !split {
            tx.unwrap_node(path)?;
            continue;
        }
        let count = tx
            .document()
            .node(&path)
            .map(|n| n.children().len())
            .unwrap_or(0);
        if count == 0 {
            tx.unwrap_node(path)?;
            continue;
        }
        let depth = path.len();
        let from = if path.contains(&start.path) { start.path[depth] } else { 0 };
        let to = if path.contains(&end.path) { end.path[depth] } else { count - 1 };
        if to + 1 < count {
            tx.split_node(path.clone(), to + 1)?;
        }
        let target = if from > 0 {
            tx.split_node(path.clone(), from)?;
            path.next()
        } else {
            path
        };
        tx.unwrap_node(target)?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Insert `text` at the caret, replacing an expanded selection first.
/// With `marks` differing from the leaf's, the text goes into its own leaf.
pub fn insert_text(tx: &mut Transaction, text: &str, marks: Option<Marks>) -> Result<(), EditError> {
    if text.is_empty() {
        return Ok(());
    }
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    if sel.is_expanded() {
        delete_range(tx, sel.start().clone(), sel.end().clone())?;
    }
    let point = tx
        .selection()
        .map(|sel| sel.focus.clone())
        .ok_or(EditError::NoSelection)?;

    if let Some(void) = tx.document().void_above(&point.path) {
        let at = void.next();
        let mut paragraph = Node::paragraph("");
        if let Some(children) = paragraph.children_mut() {
            children[0] = Node::Text(Text::with_marks(text, marks.unwrap_or_default()));
        }
        insert_sequence(tx, at, vec![paragraph])?;
        return Ok(());
    }

    let leaf_marks = tx
        .document()
        .text(&point.path)
        .map(Text::marks)
        .ok_or_else(|| EditError::InvalidPath(point.path.clone()))?;
    match marks {
        Some(marks) if marks != leaf_marks => {
            let at = split_leaf_for_insert(tx, &point)?;
            tx.insert_node(at.clone(), Node::Text(Text::with_marks(text, marks)))?;
            tx.set_selection(Some(Selection::collapsed(Point::new(at, char_len(text)))));
            Ok(())
        }
        _ => tx.insert_text(point.path, point.offset, text),
    }
}

/// Delete everything between `start` and `end` and merge the two edge blocks.
pub fn delete_range(tx: &mut Transaction, start: Point, end: Point) -> Result<(), EditError> {
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    if start == end {
        return Ok(());
    }
    if start.path == end.path {
        tx.remove_text(start.path.clone(), start.offset, end.offset - start.offset)?;
        tx.set_selection(Some(Selection::collapsed(start)));
        return Ok(());
    }

    let start_ref = tx.point_ref(start.clone());
    let end_ref = tx.point_ref(Point::new(end.path.clone(), 0));

    tx.remove_text(end.path.clone(), 0, end.offset)?;

    let between: Vec<Path> = nodes_in_range(
        tx.document(),
        &start.path,
        &end.path,
        |_| true,
        Mode::All,
    )
    .into_iter()
    .filter(|path| *path > start.path && !path.contains(&end.path))
    .collect();
    let highest: Vec<Path> = between
        .iter()
        .filter(|path| !between.iter().any(|other| other.is_ancestor_of(path)))
        .cloned()
        .collect();
    for path in highest.into_iter().rev() {
        tx.remove_node(path)?;
    }

    let start_len = tx.document().text(&start.path).map(Text::len).unwrap_or(0);
    if start.offset < start_len {
        tx.remove_text(start.path.clone(), start.offset, start_len - start.offset)?;
    }

    let end_point = tx.unref(end_ref);
    let doc = tx.document();
    let start_block = doc.line_block(&start.path);
    let end_block = end_point.and_then(|p| doc.line_block(&p.path));
    if let (Some(first), Some(second)) = (start_block, end_block) {
        if first != second {
            let first_void = doc.kind(&first).is_some_and(ElementKind::is_void);
            let second_void = doc.kind(&second).is_some_and(ElementKind::is_void);
            if second_void {
                tx.remove_node(second.clone())?;
            }
            if first_void {
                tx.remove_node(first.clone())?;
            }
            if !first_void && !second_void {
                merge_blocks(tx, first, second)?;
            }
        }
    }

    let caret = tx.unref(start_ref).or_else(|| tx.selection().map(|s| s.focus.clone()));
    tx.set_selection(caret.map(Selection::collapsed));
    Ok(())
}

/// Move the content of `source` to the end of `target` (which precedes it)
/// and remove `source` with any ancestors it leaves empty.
pub fn merge_blocks(tx: &mut Transaction, target: Path, source: Path) -> Result<(), EditError> {
    if source.parent() == target.parent() && target.next() == source {
        return tx.merge_node(source);
    }
    let doc = tx.document();
    let offset = doc
        .node(&target)
        .map(|n| n.children().len())
        .ok_or_else(|| EditError::InvalidPath(target.clone()))?;
    let count = doc
        .node(&source)
        .map(|n| n.children().len())
        .ok_or_else(|| EditError::InvalidPath(source.clone()))?;
    for k in 0..count {
        tx.move_node(source.child(0), target.child(offset + k))?;
    }

    let mut path = source;
    loop {
        let parent = path.parent();
        tx.remove_node(path)?;
        match parent {
            Some(parent)
                if !parent.is_root()
                    && tx.document().node(&parent).is_some_and(|n| n.children().is_empty()) =>
            {
                path = parent;
            }
            _ => break,
        }
    }
    Ok(())
}

/// Delete one character backward, or merge with the previous block at a
/// block start. A previous void block is removed instead of merged.
pub fn delete_backward(tx: &mut Transaction) -> Result<(), EditError> {
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    if sel.is_expanded() {
        return delete_range(tx, sel.start().clone(), sel.end().clone());
    }
    let point = sel.focus;
    let doc = tx.document();
    if let Some(void) = doc.void_above(&point.path) {
        return tx.remove_node(void);
    }
    if point.offset > 0 {
        return tx.remove_text(point.path, point.offset - 1, 1);
    }
    let Some(prev) = doc.leaf_before(&point.path) else {
        debug!("Backward delete at document start ignored");
        return Ok(());
    };
    let block = doc.line_block(&point.path);
    let prev_block = doc.line_block(&prev);
    if block == prev_block {
        let len = doc.text(&prev).map(Text::len).unwrap_or(0);
        return if len > 0 {
            tx.remove_text(prev, len - 1, 1)
        } else {
            Ok(())
        };
    }
    match (prev_block, block) {
        (Some(prev_block), _) if doc.kind(&prev_block).is_some_and(ElementKind::is_void) => {
            tx.remove_node(prev_block)
        }
        (Some(prev_block), Some(block)) => merge_blocks(tx, prev_block, block),
        _ => Ok(()),
    }
}

/// Delete one character forward, or pull the next block into this one at a
/// block end. A following void block is removed instead of merged.
pub fn delete_forward(tx: &mut Transaction) -> Result<(), EditError> {
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    if sel.is_expanded() {
        return delete_range(tx, sel.start().clone(), sel.end().clone());
    }
    let point = sel.focus;
    let doc = tx.document();
    if let Some(void) = doc.void_above(&point.path) {
        return tx.remove_node(void);
    }
    let len = doc
        .text(&point.path)
        .map(Text::len)
        .ok_or_else(|| EditError::InvalidPath(point.path.clone()))?;
    if point.offset < len {
        return tx.remove_text(point.path, point.offset, 1);
    }
    let Some(next) = doc.leaf_after(&point.path) else {
        debug!("Forward delete at document end ignored");
        return Ok(());
    };
    let block = doc.line_block(&point.path);
    let next_block = doc.line_block(&next);
    if block == next_block {
        let next_len = doc.text(&next).map(Text::len).unwrap_or(0);
        return if next_len > 0 {
            tx.remove_text(next, 0, 1)
        } else {
            Ok(())
        };
    }
    match (block, next_block) {
        (_, Some(next_block)) if doc.kind(&next_block).is_some_and(ElementKind::is_void) => {
            tx.remove_node(next_block)
        }
        (Some(block), Some(next_block)) => merge_blocks(tx, block, next_block),
        _ => Ok(()),
    }
}

/// Split the line under `point` in two, including any inline ancestors.
/// Returns the path of the new second block.
pub fn split_block(tx: &mut Transaction, point: &Point) -> Result<Path, EditError> {
    let line = tx
        .document()
        .line_block(&point.path)
        .ok_or_else(|| EditError::InvalidPath(point.path.clone()))?;
    tx.split_node(point.path.clone(), point.offset)?;
    let mut position = point.path.index().unwrap_or(0) + 1;
    let mut current = point
        .path
        .parent()
        .ok_or_else(|| EditError::InvalidPath(point.path.clone()))?;
    loop {
        tx.split_node(current.clone(), position)?;
        if current == line {
            break;
        }
        position = current.index().unwrap_or(0) + 1;
        current = current
            .parent()
            .ok_or_else(|| EditError::InvalidPath(line.clone()))?;
    }
    Ok(line.next())
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Replace the selection. Both points must address existing text leaves.
pub fn select(tx: &mut Transaction, selection: Selection) -> Result<(), EditError> {
    for point in [&selection.anchor, &selection.focus] {
        if !tx.document().is_valid_point(point) {
            return Err(EditError::InvalidPoint {
                path: point.path.clone(),
                offset: point.offset,
            });
        }
    }
    tx.set_selection(Some(selection));
    Ok(())
}

/// Collapse the selection onto one of its edges.
pub fn collapse(tx: &mut Transaction, edge: Edge) -> Result<(), EditError> {
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    tx.set_selection(Some(Selection::collapsed(sel.edge(edge).clone())));
    Ok(())
}

/// Move the selection by `distance` caret positions, clamped to the document.
/// Each line boundary counts as one position.
pub fn move_selection(tx: &mut Transaction, distance: isize) -> Result<(), EditError> {
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    let doc = tx.document();
    let positions = caret_positions(doc);
    if positions.is_empty() {
        return Err(EditError::NoSelection);
    }
    let last = positions.len() as isize - 1;
    let shift = |point: &Point| -> Result<Point, EditError> {
        let index = position_index(doc, &positions, point).ok_or_else(|| {
            EditError::InvalidPoint {
                path: point.path.clone(),
                offset: point.offset,
            }
        })?;
        let target = (index as isize + distance).clamp(0, last) as usize;
        Ok(positions[target].clone())
    };
    let focus = shift(&sel.focus)?;
    let anchor = if sel.is_collapsed() {
        focus.clone()
    } else {
        shift(&sel.anchor)?
    };
    tx.set_selection(Some(Selection::new(anchor, focus)));
    Ok(())
}

/// Every distinct caret position in document order. A leaf boundary inside a
/// line is a single position, reported as the end of the earlier leaf.
fn caret_positions(doc: &Document) -> Vec<Point> {
    let mut positions = Vec::new();
    for (path, node) in doc.descendants() {
        let is_line = node
            .kind()
            .is_some_and(|kind| kind.is_text_block() || kind.is_void());
        if !is_line {
            continue;
        }
        for (k, leaf) in doc.leaves_within(&path).into_iter().enumerate() {
            let len = doc.text(&leaf).map(Text::len).unwrap_or(0);
            let from = if k == 0 { 0 } else { 1 };
            for offset in from..=len {
                positions.push(Point::new(leaf.clone(), offset));
            }
        }
    }
    positions
}

fn position_index(doc: &Document, positions: &[Point], point: &Point) -> Option<usize> {
    if let Some(index) = positions.iter().position(|p| p == point) {
        return Some(index);
    }
    if point.offset == 0 {
        let prev = doc.leaf_before(&point.path)?;
        let len = doc.text(&prev).map(Text::len)?;
        let end = Point::new(prev, len);
        return positions.iter().position(|p| *p == end);
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadingLevel, ImageProps};

    fn p(indices: &[usize]) -> Path {
        Path::from(indices)
    }

    fn caret(path: &[usize], offset: usize) -> Option<Selection> {
        Some(Selection::collapsed(Point::new(path.to_vec(), offset)))
    }

    fn run<F>(doc: Document, selection: Option<Selection>, f: F) -> (Document, Option<Selection>)
    where
        F: FnOnce(&mut Transaction) -> Result<(), EditError>,
    {
        let mut tx = Transaction::new(doc, selection);
        f(&mut tx).unwrap();
        tx.commit()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Insert Nodes
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_block_at_end_goes_after() {
        let doc = Document::new(vec![Node::paragraph("Hello ")]);
        let (doc, sel) = run(doc, caret(&[0, 0], 6), |tx| {
            insert_nodes(tx, vec![Node::image(ImageProps::new("a.png", "A"))], None).map(|_| ())
        });
        assert_eq!(doc.children.len(), 2);
        assert!(doc.children[1].kind().is_some_and(ElementKind::is_void));
        assert_eq!(sel.unwrap().focus.path, p(&[1, 0]));
    }

    #[test]
    fn test_insert_block_mid_text_splits() {
        let doc = Document::new(vec![Node::paragraph("abcd")]);
        let (doc, _) = run(doc, caret(&[0, 0], 2), |tx| {
            insert_nodes(tx, vec![Node::heading(HeadingLevel::H2, "mid")], None).map(|_| ())
        });
        let texts: Vec<String> = doc.children.iter().map(Node::text_content).collect();
        assert_eq!(texts, vec!["ab", "mid", "cd"]);
    }

    #[test]
    fn test_insert_block_at_start_goes_before() {
        let doc = Document::new(vec![Node::paragraph("abcd")]);
        let (doc, _) = run(doc, caret(&[0, 0], 0), |tx| {
            insert_nodes(tx, vec![Node::paragraph("new")], None).map(|_| ())
        });
        assert_eq!(doc.children[0].text_content(), "new");
        assert_eq!(doc.children[1].text_content(), "abcd");
    }

    #[test]
    fn test_insert_inline_splits_leaf() {
        let doc = Document::new(vec![Node::paragraph("abcd")]);
        let (doc, sel) = run(doc, caret(&[0, 0], 2), |tx| {
            insert_nodes(tx, vec![Node::link("u", "L")], None).map(|_| ())
        });
        let children = doc.children[0].children();
        assert_eq!(children.len(), 3);
        assert!(children[1].kind().is_some_and(ElementKind::is_inline));
        assert_eq!(sel.unwrap().focus, Point::new(vec![0, 1, 0], 1));
    }

    #[test]
    fn test_insert_after_void_caret() {
        let doc = Document::new(vec![Node::image(ImageProps::new("a.png", ""))]);
        let (doc, _) = run(doc, caret(&[0, 0], 0), |tx| {
            insert_nodes(tx, vec![Node::paragraph("")], None).map(|_| ())
        });
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[1], Node::paragraph(""));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Removal, Properties, Wrapping
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_set_nodes_does_not_touch_children() {
        let doc = Document::new(vec![Node::paragraph("a"), Node::paragraph("b")]);
        let sel = Selection::new(Point::new(vec![0, 0], 0), Point::new(vec![1, 0], 1));
        let (doc, _) = run(doc, Some(sel), |tx| {
            set_nodes(
                tx,
                NodePatch::kind(ElementKind::BlockQuote),
                None,
                Node::is_text_block,
                Mode::Lowest,
            )
        });
        assert_eq!(doc.kind(&p(&[1])), Some(&ElementKind::BlockQuote));
        assert_eq!(doc.children[1].text_content(), "b");
    }

    #[test]
    fn test_remove_nodes_in_range() {
        let doc = Document::new(vec![
            Node::paragraph("a"),
            Node::image(ImageProps::new("x.png", "")),
            Node::paragraph("b"),
        ]);
        let (doc, _) = run(doc, caret(&[1, 0], 0), |tx| {
            remove_nodes(tx, None, crate::model::is_void, Mode::Highest)
        });
        assert_eq!(doc.children.len(), 2);
    }

    #[test]
    fn test_wrap_blocks_in_list() {
        let doc = Document::new(vec![
            Node::list_item("a"),
            Node::list_item("b"),
            Node::paragraph("c"),
        ]);
        let sel = Selection::new(Point::new(vec![0, 0], 0), Point::new(vec![1, 0], 0));
        let (doc, sel) = run(doc, Some(sel), |tx| {
            wrap_nodes(tx, Element::new(ElementKind::BulletedList, vec![]), None, false)
        });
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].children().len(), 2);
        assert_eq!(sel.unwrap().focus.path, p(&[0, 1, 0]));
    }

    #[test]
    fn test_wrap_inline_with_split() {
        let doc = Document::new(vec![Node::paragraph("hello world")]);
        let sel = Selection::new(Point::new(vec![0, 0], 6), Point::new(vec![0, 0], 11));
        let (doc, _) = run(doc, Some(sel), |tx| {
            wrap_nodes(
                tx,
                Element::new(ElementKind::Link { url: "u".into() }, vec![]),
                None,
                true,
            )
        });
        let children = doc.children[0].children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], Node::text("hello "));
        assert_eq!(children[1], Node::link("u", "world"));
    }

    #[test]
    fn test_unwrap_with_split_lifts_one_item() {
        let doc = Document::new(vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::list_item("a"), Node::list_item("b"), Node::list_item("c")],
        )]);
        let (doc, _) = run(doc, caret(&[0, 1, 0], 0), |tx| {
            unwrap_nodes(tx, |n| n.kind().is_some_and(ElementKind::is_list), None, true)
        });
        assert_eq!(doc.children.len(), 3);
        assert_eq!(doc.children[1], Node::paragraph("b"));
        assert_eq!(doc.children[2].kind(), Some(&ElementKind::BulletedList));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Text and Deletion
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_text_with_pending_marks() {
        let doc = Document::new(vec![Node::paragraph("ab")]);
        let bold = Marks {
            bold: true,
            ..Marks::default()
        };
        let (doc, sel) = run(doc, caret(&[0, 0], 1), |tx| insert_text(tx, "X", Some(bold)));
        let children = doc.children[0].children();
        assert_eq!(children.len(), 3);
        assert!(children[1].as_text().unwrap().bold);
        assert_eq!(sel.unwrap().focus, Point::new(vec![0, 1], 1));
    }

    #[test]
    fn test_delete_range_across_blocks() {
        let doc = Document::new(vec![
            Node::paragraph("hello"),
            Node::paragraph("middle"),
            Node::heading(HeadingLevel::H1, "world"),
        ]);
        let sel = Selection::new(Point::new(vec![0, 0], 2), Point::new(vec![2, 0], 3));
        let (doc, sel) = run(doc, Some(sel), |tx| {
            let sel = tx.selection().cloned().unwrap();
            delete_range(tx, sel.anchor, sel.focus)
        });
        assert_eq!(doc.children, vec![Node::paragraph("held")]);
        assert_eq!(sel.unwrap().focus, Point::new(vec![0, 0], 2));
    }

    #[test]
    fn test_backward_delete_merges_blocks() {
        let doc = Document::new(vec![Node::paragraph("ab"), Node::paragraph("cd")]);
        let (doc, sel) = run(doc, caret(&[1, 0], 0), delete_backward);
        assert_eq!(doc.children, vec![Node::paragraph("abcd")]);
        assert_eq!(sel.unwrap().focus, Point::new(vec![0, 0], 2));
    }

    #[test]
    fn test_backward_delete_merges_list_item_into_paragraph() {
        let doc = Document::new(vec![
            Node::paragraph("ab"),
            Node::element(ElementKind::BulletedList, vec![Node::list_item("cd")]),
        ]);
        let (doc, sel) = run(doc, caret(&[1, 0, 0], 0), delete_backward);
        assert_eq!(doc.children, vec![Node::paragraph("abcd")]);
        assert_eq!(sel.unwrap().focus, Point::new(vec![0, 0], 2));
    }

    #[test]
    fn test_forward_delete_at_end_merges_next() {
        let doc = Document::new(vec![Node::paragraph("ab"), Node::paragraph("cd")]);
        let (doc, _) = run(doc, caret(&[0, 0], 2), delete_forward);
        assert_eq!(doc.children, vec![Node::paragraph("abcd")]);
    }

    #[test]
    fn test_backward_delete_at_start_is_noop() {
        let doc = Document::new(vec![Node::paragraph("ab")]);
        let (after, _) = run(doc.clone(), caret(&[0, 0], 0), delete_backward);
        assert_eq!(after, doc);
    }

    #[test]
    fn test_split_block_at_end_creates_empty_block() {
        let doc = Document::new(vec![Node::paragraph("ab")]);
        let (doc, sel) = run(doc, caret(&[0, 0], 2), |tx| {
            split_block(tx, &Point::new(vec![0, 0], 2)).map(|_| ())
        });
        assert_eq!(doc.children, vec![Node::paragraph("ab"), Node::paragraph("")]);
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 0));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_select_rejects_invalid_point() {
        let mut tx = Transaction::new(Document::new(vec![Node::paragraph("ab")]), None);
        let bad = Selection::collapsed(Point::new(vec![0, 0], 9));
        assert!(select(&mut tx, bad).is_err());
    }

    #[test]
    fn test_move_selection_crosses_lines_and_clamps() {
        let doc = Document::new(vec![Node::paragraph("ab"), Node::paragraph("cd")]);
        let (_, sel) = run(doc.clone(), caret(&[0, 0], 1), |tx| move_selection(tx, 2));
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 0));

        let (_, sel) = run(doc, caret(&[0, 0], 1), |tx| move_selection(tx, 100));
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 2));
    }

    #[test]
    fn test_collapse_to_start() {
        let doc = Document::new(vec![Node::paragraph("abcd")]);
        let sel = Selection::new(Point::new(vec![0, 0], 3), Point::new(vec![0, 0], 1));
        let (_, sel) = run(doc, Some(sel), |tx| collapse(tx, Edge::Start));
        assert_eq!(sel.unwrap().focus, Point::new(vec![0, 0], 1));
    }
}
