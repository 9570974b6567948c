use std::collections::BTreeSet;

use crate::error::{EditError, Result};
use crate::tree::{Path, Tree};

/// A set of marked paths with one designated anchor.
///
/// The anchor is the first path selected since the selection was last
/// cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    marks: BTreeSet<Path>,
    anchor: Option<Path>,
}

impl Selection {
    /// Build a selection whose anchor is the first path in document order.
    pub fn from_paths(paths: impl IntoIterator<Item = Path>) -> Self {
        let marks: BTreeSet<Path> = paths.into_iter().collect();
        let anchor = marks.first().cloned();
        Self { marks, anchor }
    }

    pub fn add(&mut self, path: Path) {
        if self.anchor.is_none() {
            self.anchor = Some(path.clone());
        }
        self.marks.insert(path);
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.anchor = None;
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.marks.contains(path)
    }

    pub const fn anchor(&self) -> Option<&Path> {
        self.anchor.as_ref()
    }

    /// Selected paths in document order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.marks.iter()
    }

    /// First selected path strictly after `path` in document order.
    pub fn next_after(&self, path: &Path) -> Option<&Path> {
        self.marks.iter().find(|p| *p > path)
    }

    /// Last selected path strictly before `path` in document order.
    pub fn prev_before(&self, path: &Path) -> Option<&Path> {
        self.marks.iter().rev().find(|p| *p < path)
    }
}

/// The cursor: a path to the current node plus navigation memory.
///
/// `descent` holds the child indices the cursor climbed out of with
/// [`Cursor::parent`], nearest first, so that [`Cursor::child`] goes back
/// down the same way. Sideways moves forget it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    path: Path,
    descent: Vec<usize>,
    selection: Selection,
}

impl Cursor {
    /// A cursor on the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor on `path`. The caller is responsible for it resolving.
    pub fn at(path: Path) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    pub const fn path(&self) -> &Path {
        &self.path
    }

    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    pub const fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Remembered child index for the next [`Cursor::child`], if any.
    pub fn remembered_child(&self) -> Option<usize> {
        self.descent.first().copied()
    }

    /// Move to the previous sibling.
    pub fn left(&mut self) -> Result<()> {
        let index = self.path.last().ok_or(EditError::NoSibling)?;
        if index == 0 {
            return Err(EditError::NoSibling);
        }
        self.path = self.path.sibling(index - 1);
        self.descent.clear();
        Ok(())
    }

    /// Move to the next sibling.
    pub fn right(&mut self, tree: &Tree) -> Result<()> {
        let index = self.path.last().ok_or(EditError::NoSibling)?;
        let parent = self.path.parent().ok_or(EditError::NoSibling)?;
        let count = tree.children(tree.resolve(&parent)?).len();
        if index + 1 >= count {
            return Err(EditError::NoSibling);
        }
        self.path = self.path.sibling(index + 1);
        self.descent.clear();
        Ok(())
    }

    /// Descend to the remembered child (the first child when nothing is
    /// remembered, the last one when the memory is out of range).
    pub fn child(&mut self, tree: &Tree) -> Result<()> {
        let count = tree.children(tree.resolve(&self.path)?).len();
        if count == 0 {
            return Err(EditError::NoChildren);
        }
        let index = if self.descent.is_empty() {
            0
        } else {
            let remembered = self.descent.remove(0);
            if remembered >= count {
                self.descent.clear();
            }
            remembered.min(count - 1)
        };
        self.path = self.path.child(index);
        Ok(())
    }

    /// Ascend one level, remembering which child we came from.
    pub fn parent(&mut self) -> Result<()> {
        let index = self.path.last().ok_or(EditError::AtRoot)?;
        self.path = self.path.parent().ok_or(EditError::AtRoot)?;
        self.descent.insert(0, index);
        Ok(())
    }

    /// Jump to an arbitrary path, forgetting the descent memory.
    pub fn jump(&mut self, path: Path) {
        self.path = path;
        self.descent.clear();
    }

    /// Jump to `parent`, remembering `index` as the child to return to.
    pub fn ascend_to(&mut self, parent: Path, index: usize) {
        self.path = parent;
        self.descent = vec![index];
    }

    /// Add the current path to the selection.
    pub fn select(&mut self) {
        self.selection.add(self.path.clone());
    }
}
