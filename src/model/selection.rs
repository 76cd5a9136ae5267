//! Caret and selection addressing
//!
//! A [`Point`] is a text leaf path plus a character offset into that leaf. A
//! [`Selection`] is an anchor/focus pair of points; it is collapsed when both
//! are equal.

use serde::{Deserialize, Serialize};

use super::Path;

/// A caret position inside a text leaf.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    /// Character offset within the leaf
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// Which end of a selection to collapse onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
    Anchor,
    Focus,
}

/// An anchor/focus range. The focus is where the caret is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    /// Focus sorts before anchor.
    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    pub fn start(&self) -> &Point {
        if self.is_backward() {
            &self.focus
        } else {
            &self.anchor
        }
    }

    pub fn end(&self) -> &Point {
        if self.is_backward() {
            &self.anchor
        } else {
            &self.focus
        }
    }

    pub fn edge(&self, edge: Edge) -> &Point {
        match edge {
            Edge::Start => self.start(),
            Edge::End => self.end(),
            Edge::Anchor => &self.anchor,
            Edge::Focus => &self.focus,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_selection() {
        let sel = Selection::collapsed(Point::new(vec![0, 0], 3));
        assert!(sel.is_collapsed());
        assert_eq!(sel.start(), sel.end());
    }

    #[test]
    fn test_backward_selection_edges() {
        let sel = Selection::new(Point::new(vec![1, 0], 2), Point::new(vec![0, 0], 5));
        assert!(sel.is_backward());
        assert_eq!(sel.start().path.as_slice(), &[0, 0]);
        assert_eq!(sel.end().path.as_slice(), &[1, 0]);
        assert_eq!(sel.edge(Edge::Anchor).offset, 2);
    }

    #[test]
    fn test_point_order_within_leaf() {
        assert!(Point::new(vec![0, 0], 1) < Point::new(vec![0, 0], 2));
        assert!(Point::new(vec![0, 0], 9) < Point::new(vec![0, 1], 0));
    }
}
