//! Index paths into the document tree
//!
//! A [`Path`] lists child indices from the root down to a node. The empty path
//! addresses the root itself. Paths order lexicographically, which is document
//! (pre-)order: an ancestor sorts before its descendants.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Address of a node as a sequence of child indices.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Path(indices)
    }

    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// Path of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Index of this node within its parent.
    pub fn index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    /// Same parent, different index.
    pub fn sibling(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = index;
        }
        Path(indices)
    }

    pub fn next(&self) -> Path {
        match self.index() {
            Some(i) => self.sibling(i + 1),
            None => self.clone(),
        }
    }

    pub fn previous(&self) -> Option<Path> {
        match self.index() {
            Some(i) if i > 0 => Some(self.sibling(i - 1)),
            _ => None,
        }
    }

    /// Truncate to the first `depth` indices.
    pub fn truncated(&self, depth: usize) -> Path {
        Path(self.0[..depth.min(self.0.len())].to_vec())
    }

    /// Strict ancestor test (a path is not its own ancestor).
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Ancestor-or-self test.
    pub fn contains(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// True when this path is an earlier sibling of `other` or of one of
    /// `other`'s ancestors.
    pub fn ends_before(&self, other: &Path) -> bool {
        let Some(last) = self.index() else {
            return false;
        };
        let depth = self.0.len() - 1;
        other.0.len() > depth && self.0[..depth] == other.0[..depth] && last < other.0[depth]
    }

    /// All strict ancestors, root first.
    pub fn ancestors(&self) -> Vec<Path> {
        (0..self.0.len()).map(|depth| self.truncated(depth)).collect()
    }

    pub(crate) fn indices_mut(&mut self) -> &mut Vec<usize> {
        &mut self.0
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Path(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Path(indices.to_vec())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn p(indices: &[usize]) -> Path {
        Path::from(indices)
    }

    #[test]
    fn test_document_order() {
        assert!(p(&[0]) < p(&[0, 0]));
        assert!(p(&[0, 3]) < p(&[1]));
        assert!(p(&[1, 0, 2]) < p(&[1, 1]));
    }

    #[test]
    fn test_ancestors_root_first() {
        assert_eq!(p(&[2, 1, 0]).ancestors(), vec![p(&[]), p(&[2]), p(&[2, 1])]);
        assert!(p(&[]).ancestors().is_empty());
    }

    #[test]
    fn test_is_ancestor_of_is_strict() {
        assert!(p(&[1]).is_ancestor_of(&p(&[1, 0])));
        assert!(!p(&[1]).is_ancestor_of(&p(&[1])));
        assert!(p(&[]).is_ancestor_of(&p(&[0])));
        assert!(p(&[1]).contains(&p(&[1])));
    }

    #[test]
    fn test_ends_before() {
        assert!(p(&[0]).ends_before(&p(&[1, 2])));
        assert!(p(&[1, 0]).ends_before(&p(&[1, 1])));
        assert!(!p(&[1, 0]).ends_before(&p(&[1, 0, 4])));
        assert!(!p(&[1]).ends_before(&p(&[0, 5])));
        assert!(!p(&[2, 1]).ends_before(&p(&[3])));
    }

    #[test]
    fn test_sibling_navigation() {
        assert_eq!(p(&[0, 2]).next(), p(&[0, 3]));
        assert_eq!(p(&[0, 2]).previous(), Some(p(&[0, 1])));
        assert_eq!(p(&[0, 0]).previous(), None);
        assert_eq!(p(&[0, 2]).parent(), Some(p(&[0])));
        assert_eq!(p(&[]).parent(), None);
    }
}
