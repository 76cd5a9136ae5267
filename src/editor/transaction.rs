//! Staged edits over a document snapshot
//!
//! A [`Transaction`] owns a private copy of the document and selection. Every
//! primitive op goes through [`Transaction::apply`], which rebases the
//! selection, any outstanding point refs and the set of dirty paths that the
//! normalizer must revisit. Nothing becomes visible until the owner publishes
//! the result of [`Transaction::commit`]; dropping a transaction discards it.

use std::collections::BTreeSet;

use crate::error::EditError;
use crate::model::{Document, Element, Node, NodePatch, Path, Point, Selection};

use super::normalize;
use super::ops::Op;

/// Handle to a point tracked across ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointRef(usize);

/// A staged edit session.
#[derive(Debug)]
pub struct Transaction {
    doc: Document,
    selection: Option<Selection>,
    /// Keyed by depth so the deepest path pops first
    dirty: BTreeSet<(usize, Path)>,
    refs: Vec<Option<Point>>,
    /// Whether the host had a caret; a caret lost to removals is restored on commit
    had_selection: bool,
    ops: usize,
}

impl Transaction {
    pub fn new(doc: Document, selection: Option<Selection>) -> Self {
        Self {
            had_selection: selection.is_some(),
            doc,
            selection,
            dirty: BTreeSet::new(),
            refs: Vec::new(),
            ops: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.had_selection = selection.is_some();
        self.selection = selection;
    }

    /// Number of ops applied so far.
    pub fn op_count(&self) -> usize {
        self.ops
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Op Application
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply one op to the staged document and rebase tracked state.
    pub fn apply(&mut self, op: Op) -> Result<(), EditError> {
        let selection = self.selection.as_ref().map(|sel| {
            (
                self.rebase_point(&op, &sel.anchor),
                self.rebase_point(&op, &sel.focus),
            )
        });
        let refs: Vec<Option<Point>> = self
            .refs
            .iter()
            .map(|r| r.as_ref().and_then(|point| self.rebase_point(&op, point)))
            .collect();

        op.apply(&mut self.doc)?;
        self.ops += 1;

        self.selection = match selection {
            Some((Some(anchor), Some(focus))) => Some(Selection::new(anchor, focus)),
            Some((anchor, focus)) => anchor.or(focus).map(Selection::collapsed),
            None => None,
        };
        self.refs = refs;

        let dirty = std::mem::take(&mut self.dirty);
        self.dirty = dirty
            .into_iter()
            .filter_map(|(_, path)| op.transform_path(&path))
            .map(|path| (path.len(), path))
            .collect();
        for path in dirty_paths(&op, &self.doc) {
            self.mark_dirty(path);
        }
        Ok(())
    }

    /// Rebase `point` across `op`. Points inside a removed subtree fall back to
    /// the end of the previous leaf, or the start of the next one.
    fn rebase_point(&self, op: &Op, point: &Point) -> Option<Point> {
        if let Some(point) = op.transform_point(point) {
            return Some(point);
        }
        let removed = match op {
            Op::RemoveNode { path } => path,
            _ => return None,
        };
        let fallback = match self.doc.leaf_before(removed) {
            Some(leaf) => {
                let len = self.doc.text(&leaf).map(|t| t.len()).unwrap_or(0);
                Point::new(leaf, len)
            }
            None => self.doc.leaf_after(removed).map(|leaf| Point::new(leaf, 0))?,
        };
        op.transform_point(&fallback)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Op Shorthands
    // ─────────────────────────────────────────────────────────────────────────

    pub fn insert_node(&mut self, path: Path, node: Node) -> Result<(), EditError> {
        self.apply(Op::InsertNode { path, node })
    }

    pub fn remove_node(&mut self, path: Path) -> Result<(), EditError> {
        self.apply(Op::RemoveNode { path })
    }

    pub fn insert_text(&mut self, path: Path, offset: usize, text: &str) -> Result<(), EditError> {
        if text.is_empty() {
            return Ok(());
        }
        self.apply(Op::InsertText {
            path,
            offset,
            text: text.to_string(),
        })
    }

    pub fn remove_text(&mut self, path: Path, offset: usize, len: usize) -> Result<(), EditError> {
        if len == 0 {
            return Ok(());
        }
        self.apply(Op::RemoveText { path, offset, len })
    }

    pub fn split_node(&mut self, path: Path, position: usize) -> Result<(), EditError> {
        self.apply(Op::SplitNode { path, position })
    }

    /// Merge the node at `path` into its previous sibling.
    pub fn merge_node(&mut self, path: Path) -> Result<(), EditError> {
        let previous = path
            .previous()
            .ok_or_else(|| EditError::InvalidPath(path.clone()))?;
        let position = match self.doc.node(&previous) {
            Some(Node::Text(text)) => text.len(),
            Some(Node::Element(element)) => element.children.len(),
            None => return Err(EditError::InvalidPath(previous)),
        };
        self.apply(Op::MergeNode { path, position })
    }

    pub fn move_node(&mut self, path: Path, to: Path) -> Result<(), EditError> {
        self.apply(Op::MoveNode { path, to })
    }

    pub fn set_node(&mut self, path: Path, patch: NodePatch) -> Result<(), EditError> {
        let unchanged = match self.doc.node(&path) {
            Some(node) => {
                let mut probe = node.clone();
                !patch.apply(&mut probe)
            }
            None => return Err(EditError::InvalidPath(path)),
        };
        if unchanged {
            return Ok(());
        }
        self.apply(Op::SetNode { path, patch })
    }

    pub fn wrap_nodes(
        &mut self,
        parent: Path,
        start: usize,
        count: usize,
        wrapper: Element,
    ) -> Result<(), EditError> {
        self.apply(Op::WrapNodes {
            parent,
            start,
            count,
            wrapper,
        })
    }

    /// Replace the element at `path` with its children.
    pub fn unwrap_node(&mut self, path: Path) -> Result<(), EditError> {
        let count = match self.doc.node(&path) {
            Some(Node::Element(element)) => element.children.len(),
            _ => return Err(EditError::InvalidPath(path)),
        };
        self.apply(Op::UnwrapNode { path, count })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Point Refs
    // ─────────────────────────────────────────────────────────────────────────

    /// Track `point` across subsequent ops.
    pub fn point_ref(&mut self, point: Point) -> PointRef {
        self.refs.push(Some(point));
        PointRef(self.refs.len() - 1)
    }

    /// Current position of a tracked point, `None` if its leaf is gone.
    pub fn resolve(&self, r: PointRef) -> Option<Point> {
        self.refs.get(r.0).cloned().flatten()
    }

    /// Stop tracking and return the final position.
    pub fn unref(&mut self, r: PointRef) -> Option<Point> {
        self.refs.get_mut(r.0).and_then(Option::take)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dirty Paths and Commit
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn mark_dirty(&mut self, path: Path) {
        self.dirty.insert((path.len(), path));
    }

    /// Mark every node of the document (and the root) for normalization.
    pub(crate) fn mark_all_dirty(&mut self) {
        let paths: Vec<Path> = self
            .doc
            .descendants()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        self.mark_dirty(Path::root());
        for path in paths {
            self.mark_dirty(path);
        }
    }

    /// Deepest outstanding dirty path.
    pub(crate) fn pop_dirty(&mut self) -> Option<Path> {
        self.dirty.pop_last().map(|(_, path)| path)
    }

    pub(crate) fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Normalize every dirty path and clamp the selection onto valid points.
    pub fn commit(mut self) -> (Document, Option<Selection>) {
        normalize::normalize(&mut self);
        let selection = match self.selection.take() {
            Some(sel) => self.doc.clamp_point(&sel.anchor).and_then(|anchor| {
                let focus = self.doc.clamp_point(&sel.focus)?;
                Some(Selection::new(anchor, focus))
            }),
            None => None,
        };
        let selection = match selection {
            None if self.had_selection => self.doc.start().map(Selection::collapsed),
            other => other,
        };
        (self.doc, selection)
    }
}

/// Paths whose validity may have changed after `op` ran (post-op coordinates).
fn dirty_paths(op: &Op, doc: &Document) -> Vec<Path> {
    let mut paths = Vec::new();
    match op {
        Op::InsertNode { path, .. } => {
            paths.extend(path.ancestors());
            paths.extend(doc.subtree(path).into_iter().map(|(p, _)| p));
        }
        Op::RemoveNode { path } => {
            paths.extend(path.ancestors());
        }
        Op::InsertText { path, .. } | Op::RemoveText { path, .. } | Op::SetNode { path, .. } => {
            paths.extend(path.ancestors());
            paths.push(path.clone());
        }
        Op::SplitNode { path, .. } => {
            paths.extend(path.ancestors());
            paths.push(path.clone());
            paths.push(path.next());
        }
        Op::MergeNode { path, .. } => {
            paths.extend(path.ancestors());
            if let Some(previous) = path.previous() {
                paths.push(previous);
            }
        }
        Op::MoveNode { path, .. } => {
            paths.extend(path.ancestors());
            if let Some(target) = op.transform_path(path) {
                paths.extend(target.ancestors());
                paths.push(target);
            }
        }
        Op::WrapNodes { parent, start, .. } => {
            paths.extend(parent.ancestors());
            paths.push(parent.clone());
            paths.push(parent.child(*start));
        }
        Op::UnwrapNode { path, count } => {
            paths.extend(path.ancestors());
            let first = path.index().unwrap_or(0);
            for i in 0..*count {
                paths.push(path.sibling(first + i));
            }
        }
    }
    // The removal ancestors may now refer to shifted siblings; keep only
    // paths that still exist, plus the root.
    paths
        .into_iter()
        .filter(|p| p.is_root() || doc.node(p).is_some())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageProps;

    fn p(indices: &[usize]) -> Path {
        Path::from(indices)
    }

    #[test]
    fn test_selection_follows_text_insert() {
        let doc = Document::new(vec![Node::paragraph("abc")]);
        let mut tx = Transaction::new(doc, Some(Selection::collapsed(Point::new(vec![0, 0], 1))));
        tx.insert_text(p(&[0, 0]), 0, "xy").unwrap();
        assert_eq!(tx.selection().unwrap().focus, Point::new(vec![0, 0], 3));
    }

    #[test]
    fn test_removed_leaf_falls_back_to_previous_end() {
        let doc = Document::new(vec![
            Node::paragraph("one"),
            Node::image(ImageProps::new("a.png", "")),
        ]);
        let mut tx = Transaction::new(doc, Some(Selection::collapsed(Point::new(vec![1, 0], 0))));
        tx.remove_node(p(&[1])).unwrap();
        assert_eq!(tx.selection().unwrap().focus, Point::new(vec![0, 0], 3));
    }

    #[test]
    fn test_point_ref_tracks_split() {
        let doc = Document::new(vec![Node::paragraph("hello")]);
        let mut tx = Transaction::new(doc, None);
        let r = tx.point_ref(Point::new(vec![0, 0], 4));
        tx.split_node(p(&[0, 0]), 2).unwrap();
        tx.split_node(p(&[0]), 1).unwrap();
        assert_eq!(tx.unref(r), Some(Point::new(vec![1, 0], 2)));
        assert_eq!(tx.resolve(r), None);
    }

    #[test]
    fn test_failed_op_keeps_state() {
        let doc = Document::new(vec![Node::paragraph("abc")]);
        let mut tx = Transaction::new(doc.clone(), None);
        assert!(tx.remove_node(p(&[5])).is_err());
        assert_eq!(tx.document(), &doc);
        assert_eq!(tx.op_count(), 0);
    }

    #[test]
    fn test_commit_normalizes_and_clamps() {
        let doc = Document::new(vec![Node::paragraph("abc")]);
        let mut tx = Transaction::new(doc, Some(Selection::collapsed(Point::new(vec![0, 0], 3))));
        tx.remove_node(p(&[0])).unwrap();
        let (doc, selection) = tx.commit();
        assert_eq!(doc.children, vec![Node::paragraph("")]);
        assert_eq!(selection.unwrap().focus, Point::new(vec![0, 0], 0));
    }
}
