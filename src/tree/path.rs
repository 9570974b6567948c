use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a node: the child indices walked from the root.
///
/// Paths order lexicographically, which is document (pre-)order: an
/// ancestor sorts before its descendants and left siblings before right ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    /// The path of the root node.
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of steps below the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Index of the node within its parent, `None` for the root.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Path of the `index`th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Path of the sibling at `index`. The root is its own (only) sibling.
    pub fn sibling(&self, index: usize) -> Self {
        match self.parent() {
            Some(parent) => parent.child(index),
            None => Self::root(),
        }
    }

    /// Whether `self` lies on the way from the root to `other` (inclusive).
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_has_no_parent() {
        let root = Path::root();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.last(), None);
        assert_eq!(root.to_string(), "/");
    }

    #[test]
    fn test_child_and_parent_are_inverse() {
        let path = Path::from(vec![0, 2]);
        let child = path.child(5);
        assert_eq!(child.indices(), &[0, 2, 5]);
        assert_eq!(child.parent(), Some(path));
        assert_eq!(child.to_string(), "/0/2/5");
    }

    #[test]
    fn test_sibling_replaces_last_index() {
        let path = Path::from(vec![1, 3]);
        assert_eq!(path.sibling(0), Path::from(vec![1, 0]));
        assert_eq!(Path::root().sibling(4), Path::root());
    }

    #[test]
    fn test_ordering_is_document_order() {
        let mut paths = vec![
            Path::from(vec![1]),
            Path::from(vec![0, 1]),
            Path::root(),
            Path::from(vec![0]),
        ];
        paths.sort();
        assert_eq!(
            paths,
            vec![
                Path::root(),
                Path::from(vec![0]),
                Path::from(vec![0, 1]),
                Path::from(vec![1]),
            ]
        );
    }

    #[test]
    fn test_prefix() {
        let parent = Path::from(vec![2]);
        assert!(parent.is_prefix_of(&Path::from(vec![2, 0])));
        assert!(parent.is_prefix_of(&parent));
        assert!(!parent.is_prefix_of(&Path::from(vec![3, 0])));
    }
}
