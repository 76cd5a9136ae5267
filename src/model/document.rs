//! The document root and tree queries
//!
//! [`Document`] is a flat ordered sequence of block nodes. Everything here is a
//! read-only query; mutation goes through `editor::ops`.

use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, Node, Path, Point, Text};

/// The root of a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────────

    /// Node at `path`. The root has no node representation and yields `None`.
    pub fn node(&self, path: &Path) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for index in rest {
            node = node.children().get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for index in rest {
            node = node.children_mut()?.get_mut(*index)?;
        }
        Some(node)
    }

    /// Children of the node at `parent` (the root's blocks for the empty path).
    pub fn children_at(&self, parent: &Path) -> Option<&[Node]> {
        if parent.is_root() {
            return Some(&self.children);
        }
        match self.node(parent)? {
            Node::Element(element) => Some(&element.children),
            Node::Text(_) => None,
        }
    }

    pub fn children_at_mut(&mut self, parent: &Path) -> Option<&mut Vec<Node>> {
        if parent.is_root() {
            return Some(&mut self.children);
        }
        self.node_mut(parent)?.children_mut()
    }

    pub fn text(&self, path: &Path) -> Option<&Text> {
        self.node(path).and_then(Node::as_text)
    }

    pub fn element(&self, path: &Path) -> Option<&Element> {
        self.node(path).and_then(Node::as_element)
    }

    pub fn kind(&self, path: &Path) -> Option<&ElementKind> {
        self.element(path).map(|e| &e.kind)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────────────────

    /// Every node with its path, in document order.
    pub fn descendants(&self) -> Vec<(Path, &Node)> {
        let mut out = Vec::new();
        for (i, child) in self.children.iter().enumerate() {
            collect_descendants(child, Path::new(vec![i]), &mut out);
        }
        out
    }

    /// The node at `path` and everything below it, in document order.
    pub fn subtree(&self, path: &Path) -> Vec<(Path, &Node)> {
        if path.is_root() {
            return self.descendants();
        }
        let mut out = Vec::new();
        if let Some(node) = self.node(path) {
            collect_descendants(node, path.clone(), &mut out);
        }
        out
    }

    /// Paths of all text leaves, in document order.
    pub fn text_leaves(&self) -> Vec<Path> {
        self.leaves_within(&Path::root())
    }

    /// Paths of the text leaves inside the node at `path`.
    pub fn leaves_within(&self, path: &Path) -> Vec<Path> {
        self.subtree(path)
            .into_iter()
            .filter(|(_, node)| node.is_text())
            .map(|(path, _)| path)
            .collect()
    }

    /// Last text leaf that precedes the node at `path` (outside its subtree).
    pub fn leaf_before(&self, path: &Path) -> Option<Path> {
        self.text_leaves().into_iter().rev().find(|leaf| leaf < path)
    }

    /// First text leaf that follows the node at `path` (outside its subtree).
    pub fn leaf_after(&self, path: &Path) -> Option<Path> {
        self.text_leaves()
            .into_iter()
            .find(|leaf| leaf > path && !path.contains(leaf))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Points
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start_of(&self, path: &Path) -> Option<Point> {
        let leaf = self.leaves_within(path).into_iter().next()?;
        Some(Point::new(leaf, 0))
    }

    pub fn end_of(&self, path: &Path) -> Option<Point> {
        let leaf = self.leaves_within(path).into_iter().last()?;
        let len = self.text(&leaf).map(Text::len).unwrap_or(0);
        Some(Point::new(leaf, len))
    }

    pub fn start(&self) -> Option<Point> {
        self.start_of(&Path::root())
    }

    pub fn end(&self) -> Option<Point> {
        self.end_of(&Path::root())
    }

    /// A point is valid when it addresses a text leaf and lies within it.
    pub fn is_valid_point(&self, point: &Point) -> bool {
        self.text(&point.path)
            .is_some_and(|text| point.offset <= text.len())
    }

    /// Nearest valid point to `point`, or `None` for a document without leaves.
    pub fn clamp_point(&self, point: &Point) -> Option<Point> {
        if let Some(text) = self.text(&point.path) {
            return Some(Point::new(point.path.clone(), point.offset.min(text.len())));
        }
        let leaves = self.text_leaves();
        if let Some(leaf) = leaves.iter().find(|leaf| **leaf >= point.path) {
            return Some(Point::new(leaf.clone(), 0));
        }
        let last = leaves.last()?;
        let len = self.text(last).map(Text::len).unwrap_or(0);
        Some(Point::new(last.clone(), len))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ancestor Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Lowest ancestor-or-self element of `path` whose kind satisfies `pred`.
    pub fn closest(&self, path: &Path, pred: impl Fn(&ElementKind) -> bool) -> Option<Path> {
        let mut current = Some(path.clone());
        while let Some(candidate) = current {
            if candidate.is_root() {
                return None;
            }
            if self.kind(&candidate).is_some_and(&pred) {
                return Some(candidate);
            }
            current = candidate.parent();
        }
        None
    }

    /// The "line" containing `path`: its text block or void block.
    pub fn line_block(&self, path: &Path) -> Option<Path> {
        self.closest(path, |kind| kind.is_text_block() || kind.is_void())
    }

    /// The void element enclosing `path`, if any.
    pub fn void_above(&self, path: &Path) -> Option<Path> {
        self.closest(path, ElementKind::is_void)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Text
    // ─────────────────────────────────────────────────────────────────────────

    /// Text of every line, one per line, marks ignored.
    pub fn plain_text(&self) -> String {
        self.descendants()
            .into_iter()
            .filter(|(_, node)| node.is_text_block())
            .map(|(_, node)| node.text_content())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of a line from its start up to `point`.
    pub fn line_text_before(&self, block: &Path, point: &Point) -> String {
        let mut out = String::new();
        for leaf in self.leaves_within(block) {
            let Some(text) = self.text(&leaf) else {
                continue;
            };
            if leaf == point.path {
                out.push_str(crate::string_utils::slice_chars(&text.text, 0, point.offset));
                break;
            }
            out.push_str(&text.text);
        }
        out
    }
}

fn collect_descendants<'a>(node: &'a Node, path: Path, out: &mut Vec<(Path, &'a Node)>) {
    out.push((path.clone(), node));
    for (i, child) in node.children().iter().enumerate() {
        collect_descendants(child, path.child(i), out);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
