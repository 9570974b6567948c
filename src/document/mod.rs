//! Documents: a tree plus the live cursor, and their persistence.
//!
//! A [`Document`] is the unit that undo records and snapshots copy. The
//! [`Persistence`] trait is how documents get to and from bytes;
//! [`JsonStore`] is the file-backed implementation.

mod store;

use std::sync::Arc;

pub use store::{DocumentError, DocumentFile, Format, JsonStore, Persistence};

use crate::editor::Cursor;
use crate::error::Result;
use crate::tree::{Language, Path, Subtree, Tree};

/// A tree with the cursor into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) tree: Tree,
    pub(crate) cursor: Cursor,
}

impl Document {
    /// A document with the cursor on the root.
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            cursor: Cursor::new(),
        }
    }

    /// Build a document from a value, checking it against `lang`.
    pub fn from_subtree(lang: Arc<Language>, root: &Subtree) -> Result<Self> {
        Ok(Self::new(Tree::new(lang, root)?))
    }

    /// A document holding only an empty root construct.
    pub fn empty(lang: Arc<Language>) -> Result<Self> {
        Ok(Self::new(Tree::empty(lang)?))
    }

    /// Put the cursor on `path`, falling back to the root when `path` does
    /// not resolve.
    #[must_use]
    pub fn with_cursor(mut self, path: Path) -> Self {
        let path = if self.tree.resolve(&path).is_ok() {
            path
        } else {
            Path::root()
        };
        self.cursor = Cursor::at(path);
        self
    }

    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn language(&self) -> &Arc<Language> {
        self.tree.language()
    }

    /// The whole document as a value.
    pub fn to_subtree(&self) -> Subtree {
        self.tree.to_subtree()
    }

    /// The subtree under the cursor.
    pub fn current(&self) -> Result<Subtree> {
        Ok(self.tree.subtree(self.tree.resolve(self.cursor.path())?))
    }

    /// Check the tree and that the cursor and every selection mark resolve.
    pub fn validate(&self) -> Result<()> {
        self.tree.validate()?;
        self.tree.resolve(self.cursor.path())?;
        for path in self.cursor.selection().paths() {
            self.tree.resolve(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;

    fn lang() -> Arc<Language> {
        Arc::new(Language::example())
    }

    #[test]
    fn test_empty_document_is_valid() {
        let doc = Document::empty(lang()).unwrap();
        assert_eq!(doc.to_subtree(), Subtree::branch("program", vec![]));
        assert!(doc.cursor().path().is_root());
        doc.validate().unwrap();
    }

    #[test]
    fn test_with_cursor_falls_back_to_root() {
        let root = Subtree::branch("program", vec![Subtree::text("sym", "a")]);
        let doc = Document::from_subtree(lang(), &root).unwrap();
        let doc = doc.with_cursor(Path::from(&[0][..]));
        assert_eq!(doc.current().unwrap(), Subtree::text("sym", "a"));
        let doc = doc.with_cursor(Path::from(&[4][..]));
        assert!(doc.cursor().path().is_root());
    }

    #[test]
    fn test_from_subtree_checks_schema() {
        let root = Subtree::branch("program", vec![Subtree::branch("neg", vec![])]);
        assert!(matches!(
            Document::from_subtree(lang(), &root),
            Err(EditError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_equality_ignores_arena_layout() {
        let root = Subtree::branch("program", vec![Subtree::text("sym", "a")]);
        let a = Document::from_subtree(lang(), &root).unwrap();
        let mut b = a.clone();
        let node = b.tree.adopt(&Subtree::text("sym", "a")).unwrap();
        let old = b.tree.replace(&Path::from(&[0][..]), node).unwrap();
        b.tree.discard(old).unwrap();
        assert_ne!(a.tree().revision(), b.tree().revision());
        assert_eq!(a, b);
    }
}
