//! Search.
//!
//! The engine only needs "produce a selection": a [`Searcher`] turns a
//! query into the set of matching paths. [`RegexSearch`] matches a regular
//! expression against construct names and leaf text.

use std::fmt;

use regex::Regex;

use crate::document::Document;
use crate::editor::Selection;
use crate::error::{EditError, Result};
use crate::tree::{NodeId, Path, Tree};

/// Something that can find nodes in a document.
pub trait Searcher: fmt::Debug {
    /// Every match in document order, or [`EditError::NotFound`].
    fn search(&self, query: &str, doc: &Document) -> Result<Selection>;
}

/// Regular-expression search over construct names and text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSearch;

impl Searcher for RegexSearch {
    fn search(&self, query: &str, doc: &Document) -> Result<Selection> {
        let pattern =
            Regex::new(query).map_err(|err| EditError::Parse(format!("bad search: {err}")))?;
        let mut found = Vec::new();
        collect(doc.tree(), doc.tree().root(), Path::root(), &pattern, &mut found);
        if found.is_empty() {
            return Err(EditError::NotFound(query.to_string()));
        }
        Ok(Selection::from_paths(found))
    }
}

fn collect(tree: &Tree, id: NodeId, path: Path, pattern: &Regex, found: &mut Vec<Path>) {
    let hit = pattern.is_match(tree.construct(id))
        || tree.text(id).is_some_and(|text| pattern.is_match(text));
    for (index, &child) in tree.children(id).iter().enumerate() {
        collect(tree, child, path.child(index), pattern, found);
    }
    if hit {
        found.push(path);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tree::{Language, Subtree};

    fn doc() -> Document {
        let root = Subtree::branch(
            "program",
            vec![
                Subtree::text("sym", "alpha"),
                Subtree::branch(
                    "plus",
                    vec![Subtree::text("num", "1"), Subtree::text("sym", "beta")],
                ),
            ],
        );
        Document::from_subtree(Arc::new(Language::example()), &root).unwrap()
    }

    #[test]
    fn test_matches_text_in_document_order() {
        let selection = RegexSearch.search("a$", &doc()).unwrap();
        let paths: Vec<_> = selection.paths().cloned().collect();
        assert_eq!(paths, vec![Path::from(&[0][..]), Path::from(&[1, 1][..])]);
        assert_eq!(selection.anchor(), Some(&Path::from(&[0][..])));
    }

    #[test]
    fn test_matches_construct_names() {
        let selection = RegexSearch.search("^plus$", &doc()).unwrap();
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&Path::from(&[1][..])));
    }

    #[test]
    fn test_no_match_and_bad_pattern() {
        assert_eq!(
            RegexSearch.search("gamma", &doc()).unwrap_err(),
            EditError::NotFound("gamma".into())
        );
        assert!(matches!(
            RegexSearch.search("(", &doc()),
            Err(EditError::Parse(_))
        ));
    }
}
