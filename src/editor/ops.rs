//! Primitive document operations
//!
//! Every structural or textual change to a document is expressed as one of
//! the [`Op`] variants below. An op knows how to apply itself to a document and
//! how to rebase a path or caret point recorded before it ran, which is what
//! keeps selections and point refs valid across edits.
//!
//! Higher-level transforms never touch the tree directly; they compose ops
//! through a `Transaction`.

use crate::error::EditError;
use crate::model::{Document, Element, Node, NodePatch, Path, Point, Text};
use crate::string_utils::{char_len, insert_at_char, remove_chars, split_off_at_char};

/// A single primitive edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Insert `node` so that it ends up at `path`
    InsertNode { path: Path, node: Node },
    /// Remove the node at `path` with its subtree
    RemoveNode { path: Path },
    /// Insert characters into a text leaf
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    /// Remove `len` characters from a text leaf
    RemoveText {
        path: Path,
        offset: usize,
        len: usize,
    },
    /// Split the node at `path` in two. For a text leaf `position` is a
    /// character offset, for an element it is a child index. The second half
    /// lands at `path.next()`.
    SplitNode { path: Path, position: usize },
    /// Merge the node at `path` into its previous sibling. `position` is the
    /// length of that sibling before the merge (chars or children).
    MergeNode { path: Path, position: usize },
    /// Move the node at `path` so that it ends up at `to`
    MoveNode { path: Path, to: Path },
    /// Shallow property merge, children untouched
    SetNode { path: Path, patch: NodePatch },
    /// Replace `count` children of `parent` starting at `start` with
    /// `wrapper` holding them
    WrapNodes {
        parent: Path,
        start: usize,
        count: usize,
        wrapper: Element,
    },
    /// Replace the element at `path` with its `count` children
    UnwrapNode { path: Path, count: usize },
}

impl Op {
    /// Short label for log output.
    pub fn name(&self) -> &'static str {
        match self {
            Op::InsertNode { .. } => "insert_node",
            Op::RemoveNode { .. } => "remove_node",
            Op::InsertText { .. } => "insert_text",
            Op::RemoveText { .. } => "remove_text",
            Op::SplitNode { .. } => "split_node",
            Op::MergeNode { .. } => "merge_node",
            Op::MoveNode { .. } => "move_node",
            Op::SetNode { .. } => "set_node",
            Op::WrapNodes { .. } => "wrap_nodes",
            Op::UnwrapNode { .. } => "unwrap_node",
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Application
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply the op to `doc`. On error `doc` is left unchanged.
    pub fn apply(&self, doc: &mut Document) -> Result<(), EditError> {
        match self {
            Op::InsertNode { path, node } => {
                let (parent, index) = split_path(path)?;
                let children = children_mut(doc, &parent)?;
                if index > children.len() {
                    return Err(EditError::InvalidPath(path.clone()));
                }
                children.insert(index, node.clone());
            }

            Op::RemoveNode { path } => {
                let (parent, index) = split_path(path)?;
                let children = children_mut(doc, &parent)?;
                if index >= children.len() {
                    return Err(EditError::InvalidPath(path.clone()));
                }
                children.remove(index);
            }

            Op::InsertText { path, offset, text } => {
                let leaf = text_mut(doc, path)?;
                if *offset > leaf.len() {
                    return Err(EditError::InvalidPoint {
                        path: path.clone(),
                        offset: *offset,
                    });
                }
                insert_at_char(&mut leaf.text, *offset, text);
            }

            Op::RemoveText { path, offset, len } => {
                let leaf = text_mut(doc, path)?;
                if offset + len > leaf.len() {
                    return Err(EditError::InvalidPoint {
                        path: path.clone(),
                        offset: offset + len,
                    });
                }
                remove_chars(&mut leaf.text, *offset, *len);
            }

            Op::SplitNode { path, position } => {
                let (parent, index) = split_path(path)?;
                let node = doc
                    .node_mut(path)
                    .ok_or_else(|| EditError::InvalidPath(path.clone()))?;
                let second = match node {
                    Node::Text(leaf) => {
                        if *position > leaf.len() {
                            return Err(EditError::InvalidPoint {
                                path: path.clone(),
                                offset: *position,
                            });
                        }
                        let rest = split_off_at_char(&mut leaf.text, *position);
                        Node::Text(Text::with_marks(rest, leaf.marks()))
                    }
                    Node::Element(element) => {
                        if *position > element.children.len() {
                            return Err(EditError::InvalidOperation(format!(
                                "split position {} past {} children",
                                position,
                                element.children.len()
                            )));
                        }
                        let mut copy = element.shallow_clone();
                        copy.children = element.children.split_off(*position);
                        Node::Element(copy)
                    }
                };
                children_mut(doc, &parent)?.insert(index + 1, second);
            }

            Op::MergeNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                if index == 0 {
                    return Err(EditError::InvalidOperation(
                        "merge needs a previous sibling".to_string(),
                    ));
                }
                let children = children_mut(doc, &parent)?;
                if index >= children.len() {
                    return Err(EditError::InvalidPath(path.clone()));
                }
                let compatible = matches!(
                    (&children[index - 1], &children[index]),
                    (Node::Text(_), Node::Text(_)) | (Node::Element(_), Node::Element(_))
                );
                if !compatible {
                    return Err(EditError::InvalidOperation(
                        "cannot merge a text leaf with an element".to_string(),
                    ));
                }
                let node = children.remove(index);
                match (&mut children[index - 1], node) {
                    (Node::Text(prev), Node::Text(leaf)) => prev.text.push_str(&leaf.text),
                    (Node::Element(prev), Node::Element(element)) => {
                        prev.children.extend(element.children)
                    }
                    _ => {}
                }
            }

            Op::MoveNode { path, to } => {
                if path == to {
                    return Ok(());
                }
                if path.is_ancestor_of(to) {
                    return Err(EditError::InvalidOperation(
                        "cannot move a node into itself".to_string(),
                    ));
                }
                let target = transform_path(self, path)
                    .ok_or_else(|| EditError::InvalidPath(to.clone()))?;
                let (target_parent, target_index) = split_path(&target)?;

                // Validate against a scratch copy so a bad target leaves `doc` intact.
                let mut staged = doc.clone();
                let (parent, index) = split_path(path)?;
                let children = children_mut(&mut staged, &parent)?;
                if index >= children.len() {
                    return Err(EditError::InvalidPath(path.clone()));
                }
                let node = children.remove(index);
                let dest = children_mut(&mut staged, &target_parent)?;
                if target_index > dest.len() {
                    return Err(EditError::InvalidPath(to.clone()));
                }
                dest.insert(target_index, node);
                *doc = staged;
            }

            Op::SetNode { path, patch } => {
                let node = doc
                    .node_mut(path)
                    .ok_or_else(|| EditError::InvalidPath(path.clone()))?;
                patch.apply(node);
            }

            Op::WrapNodes {
                parent,
                start,
                count,
                wrapper,
            } => {
                let children = children_mut(doc, parent)?;
                if *count == 0 || start + count > children.len() {
                    return Err(EditError::InvalidOperation(format!(
                        "cannot wrap {} children from {} of {}",
                        count,
                        start,
                        children.len()
                    )));
                }
                let mut element = wrapper.shallow_clone();
                element.children = children.drain(*start..start + count).collect();
                children.insert(*start, Node::Element(element));
            }

            Op::UnwrapNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                let children = children_mut(doc, &parent)?;
                if !matches!(children.get(index), Some(Node::Element(_))) {
                    return Err(EditError::InvalidPath(path.clone()));
                }
                if let Node::Element(element) = children.remove(index) {
                    for (i, child) in element.children.into_iter().enumerate() {
                        children.insert(index + i, child);
                    }
                }
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rebasing
    // ─────────────────────────────────────────────────────────────────────────

    /// Where the node previously at `path` lives after this op, or `None` if
    /// the op removed it.
    pub fn transform_path(&self, path: &Path) -> Option<Path> {
        transform_path(self, path)
    }

    /// Where a caret point recorded before this op lives after it.
    pub fn transform_point(&self, point: &Point) -> Option<Point> {
        let mut offset = point.offset;
        match self {
            Op::InsertText {
                path,
                offset: at,
                text,
            } if *path == point.path && offset >= *at => {
                offset += char_len(text);
            }
            Op::RemoveText {
                path,
                offset: at,
                len,
            } if *path == point.path && offset > *at => {
                offset -= (*len).min(offset - at);
            }
            Op::SplitNode { path, position } if *path == point.path => {
                // Only text leaves hold points.
                if offset >= *position {
                    return Some(Point::new(path.next(), offset - position));
                }
                return Some(Point::new(path.clone(), offset));
            }
            Op::MergeNode { path, position } if *path == point.path => {
                offset += position;
            }
            _ => {}
        }
        let path = transform_path(self, &point.path)?;
        Some(Point { path, offset })
    }
}

fn transform_path(op: &Op, path: &Path) -> Option<Path> {
    let mut p = path.clone();
    match op {
        Op::InsertNode { path: at, .. } => {
            if at == &p || at.ends_before(&p) || at.is_ancestor_of(&p) {
                let depth = at.len() - 1;
                p.indices_mut()[depth] += 1;
            }
        }

        Op::RemoveNode { path: at } => {
            if at.contains(&p) {
                return None;
            }
            if at.ends_before(&p) {
                let depth = at.len() - 1;
                p.indices_mut()[depth] -= 1;
            }
        }

        Op::InsertText { .. } | Op::RemoveText { .. } | Op::SetNode { .. } => {}

        Op::SplitNode { path: at, position } => {
            if at.ends_before(&p) {
                let depth = at.len() - 1;
                p.indices_mut()[depth] += 1;
            } else if at.is_ancestor_of(&p) && p[at.len()] >= *position {
                let depth = at.len();
                let indices = p.indices_mut();
                indices[depth - 1] += 1;
                indices[depth] -= position;
            }
        }

        Op::MergeNode { path: at, position } => {
            if at == &p || at.ends_before(&p) {
                let depth = at.len() - 1;
                p.indices_mut()[depth] -= 1;
            } else if at.is_ancestor_of(&p) {
                let depth = at.len();
                let indices = p.indices_mut();
                indices[depth - 1] -= 1;
                indices[depth] += position;
            }
        }

        Op::MoveNode { path: at, to } => {
            if at == to {
                return Some(p);
            }
            if at.contains(&p) {
                let mut moved = to.clone().into_vec();
                if at.ends_before(to) && at.len() < to.len() {
                    moved[at.len() - 1] -= 1;
                }
                moved.extend_from_slice(&p[at.len()..]);
                return Some(Path::new(moved));
            }
            let same_parent = at.parent() == to.parent();
            if same_parent && to.contains(&p) {
                let depth = at.len() - 1;
                if at.ends_before(&p) {
                    p.indices_mut()[depth] -= 1;
                } else {
                    p.indices_mut()[depth] += 1;
                }
            } else if to.ends_before(&p) || to.contains(&p) {
                if at.ends_before(&p) {
                    let depth = at.len() - 1;
                    p.indices_mut()[depth] -= 1;
                }
                let depth = to.len() - 1;
                p.indices_mut()[depth] += 1;
            } else if at.ends_before(&p) {
                let depth = at.len() - 1;
                p.indices_mut()[depth] -= 1;
            }
        }

        Op::WrapNodes {
            parent,
            start,
            count,
            ..
        } => {
            if parent.is_ancestor_of(&p) {
                let depth = parent.len();
                let index = p[depth];
                if index >= *start && index < start + count {
                    let mut wrapped = parent.child(*start).child(index - start).into_vec();
                    wrapped.extend_from_slice(&p[depth + 1..]);
                    return Some(Path::new(wrapped));
                }
                if index >= start + count {
                    p.indices_mut()[depth] = index + 1 - count;
                }
            }
        }

        Op::UnwrapNode { path: at, count } => {
            if at == &p {
                return None;
            }
            let depth = at.len() - 1;
            if at.is_ancestor_of(&p) {
                let child = p[at.len()];
                let mut lifted = at.sibling(at[depth] + child).into_vec();
                lifted.extend_from_slice(&p[at.len() + 1..]);
                return Some(Path::new(lifted));
            }
            if at.ends_before(&p) {
                let indices = p.indices_mut();
                indices[depth] = indices[depth] + count - 1;
            }
        }
    }
    Some(p)
}

fn split_path(path: &Path) -> Result<(Path, usize), EditError> {
    match (path.parent(), path.index()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(EditError::InvalidPath(path.clone())),
    }
}

fn children_mut<'a>(doc: &'a mut Document, parent: &Path) -> Result<&'a mut Vec<Node>, EditError> {
    doc.children_at_mut(parent)
        .ok_or_else(|| EditError::InvalidPath(parent.clone()))
}

fn text_mut<'a>(doc: &'a mut Document, path: &Path) -> Result<&'a mut Text, EditError> {
    match doc.node_mut(path) {
        Some(Node::Text(leaf)) => Ok(leaf),
        _ => Err(EditError::InvalidPath(path.clone())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
