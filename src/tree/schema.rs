use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::subtree::Subtree;
use crate::error::{EditError, Result};

/// Construct name of the placeholder node produced by `delete`.
pub const HOLE: &str = "?";

/// Sort accepted by slots that take any construct.
pub const ANY_SORT: &str = "Any";

/// How many children a construct has, and of which sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly one child per listed sort.
    Fixed(Vec<String>),
    /// Any number of children of one sort ("stretchy").
    Flexible(String),
    /// A leaf holding a text string.
    Text,
}

/// A node type of a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construct {
    pub name: String,
    pub sort: String,
    pub arity: Arity,
}

impl Construct {
    pub fn fixed(name: &str, sort: &str, slots: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            sort: sort.to_string(),
            arity: Arity::Fixed(slots.iter().map(ToString::to_string).collect()),
        }
    }

    pub fn flexible(name: &str, sort: &str, child_sort: &str) -> Self {
        Self {
            name: name.to_string(),
            sort: sort.to_string(),
            arity: Arity::Flexible(child_sort.to_string()),
        }
    }

    pub fn text(name: &str, sort: &str) -> Self {
        Self {
            name: name.to_string(),
            sort: sort.to_string(),
            arity: Arity::Text,
        }
    }
}

/// On-disk form of a [`Language`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LanguageFile {
    name: String,
    root: String,
    constructs: Vec<Construct>,
}

/// The structural schema documents are checked against.
///
/// Every tree mutation consults the language before it touches the arena,
/// so a failed check never leaves a half-applied edit behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LanguageFile", into = "LanguageFile")]
pub struct Language {
    name: String,
    root: String,
    constructs: HashMap<String, Construct>,
    order: Vec<String>,
}

impl TryFrom<LanguageFile> for Language {
    type Error = EditError;

    fn try_from(file: LanguageFile) -> Result<Self> {
        let mut language = Self::new(&file.name, &file.root);
        for construct in file.constructs {
            language.add(construct);
        }
        if !language.constructs.contains_key(&language.root) {
            return Err(EditError::SchemaViolation(format!(
                "root construct '{}' is not defined",
                language.root
            )));
        }
        Ok(language)
    }
}

impl From<Language> for LanguageFile {
    fn from(language: Language) -> Self {
        let constructs = language
            .order
            .iter()
            .filter_map(|name| language.constructs.get(name).cloned())
            .collect();
        Self {
            name: language.name,
            root: language.root,
            constructs,
        }
    }
}

impl Language {
    /// Create a language whose documents are rooted at `root`.
    ///
    /// The root construct itself still has to be added.
    pub fn new(name: &str, root: &str) -> Self {
        Self {
            name: name.to_string(),
            root: root.to_string(),
            constructs: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Add (or redefine) a construct.
    pub fn add(&mut self, construct: Construct) {
        if !self.constructs.contains_key(&construct.name) {
            self.order.push(construct.name.clone());
        }
        self.constructs.insert(construct.name.clone(), construct);
    }

    /// Builder form of [`Language::add`].
    #[must_use]
    pub fn with(mut self, construct: Construct) -> Self {
        self.add(construct);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the construct documents are rooted at.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Constructs in definition order.
    pub fn constructs(&self) -> impl Iterator<Item = &Construct> {
        self.order.iter().filter_map(|name| self.constructs.get(name))
    }

    /// Look up a construct. The hole is not a construct of any language.
    pub fn construct(&self, name: &str) -> Result<&Construct> {
        self.constructs
            .get(name)
            .ok_or_else(|| EditError::SchemaViolation(format!("unknown construct '{name}'")))
    }

    /// Arity of a construct; the hole behaves as a zero-arity construct.
    pub fn arity(&self, name: &str) -> Result<Arity> {
        if name == HOLE {
            return Ok(Arity::Fixed(Vec::new()));
        }
        Ok(self.construct(name)?.arity.clone())
    }

    pub fn is_flexible(&self, name: &str) -> bool {
        matches!(self.arity(name), Ok(Arity::Flexible(_)))
    }

    /// Whether a node of construct `child` may stand in a slot of `sort`.
    pub fn fits(&self, child: &str, sort: &str) -> bool {
        if child == HOLE || sort == ANY_SORT {
            return true;
        }
        self.constructs.get(child).is_some_and(|c| c.sort == sort)
    }

    /// Whether a node of construct `child` may be the document root.
    pub fn fits_root(&self, child: &str) -> bool {
        child == HOLE || child == self.root
    }

    /// Sort required of child `index` of a `parent` node, if the slot exists.
    ///
    /// For flexible constructs every index has the same sort.
    pub fn slot_sort(&self, parent: &str, index: usize) -> Option<String> {
        match self.arity(parent).ok()? {
            Arity::Fixed(sorts) => sorts.get(index).cloned(),
            Arity::Flexible(sort) => Some(sort),
            Arity::Text => None,
        }
    }

    /// Check that `children` form a valid child list for `parent`.
    pub fn check_children(&self, parent: &str, children: &[&str]) -> Result<()> {
        match self.arity(parent)? {
            Arity::Fixed(sorts) => {
                if sorts.len() != children.len() {
                    return Err(EditError::SchemaViolation(format!(
                        "'{parent}' takes {} children, not {}",
                        sorts.len(),
                        children.len()
                    )));
                }
                for (child, sort) in children.iter().zip(&sorts) {
                    self.check_fit(parent, child, sort)?;
                }
            }
            Arity::Flexible(sort) => {
                for child in children {
                    self.check_fit(parent, child, &sort)?;
                }
            }
            Arity::Text => {
                if !children.is_empty() {
                    return Err(EditError::SchemaViolation(format!(
                        "'{parent}' is a text construct and has no children"
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_fit(&self, parent: &str, child: &str, sort: &str) -> Result<()> {
        if child != HOLE {
            self.construct(child)?;
        }
        if self.fits(child, sort) {
            Ok(())
        } else {
            Err(EditError::SchemaViolation(format!(
                "'{child}' cannot be placed under '{parent}' (expects {sort})"
            )))
        }
    }

    /// Recursively check a detached subtree against this language.
    pub fn check_subtree(&self, tree: &Subtree) -> Result<()> {
        let arity = self.arity(&tree.construct)?;
        match (&arity, &tree.text) {
            (Arity::Text, None) => {
                return Err(EditError::SchemaViolation(format!(
                    "'{}' needs text",
                    tree.construct
                )));
            }
            (Arity::Fixed(_) | Arity::Flexible(_), Some(_)) => {
                return Err(EditError::SchemaViolation(format!(
                    "'{}' cannot hold text",
                    tree.construct
                )));
            }
            _ => {}
        }
        let names: Vec<&str> = tree.children.iter().map(|c| c.construct.as_str()).collect();
        self.check_children(&tree.construct, &names)?;
        tree.children.iter().try_for_each(|child| self.check_subtree(child))
    }

    /// An empty instance of `construct`: no children for flexible
    /// constructs, holes in every fixed slot, empty text for text leaves.
    pub fn empty_node(&self, construct: &str) -> Result<Subtree> {
        Ok(match self.arity(construct)? {
            Arity::Fixed(sorts) => Subtree::branch(
                construct,
                sorts.iter().map(|_| Subtree::hole()).collect(),
            ),
            Arity::Flexible(_) => Subtree::branch(construct, Vec::new()),
            Arity::Text => Subtree::text(construct, ""),
        })
    }

    /// A small expression language used by the CLI and the tests.
    ///
    /// ```text
    /// program : Expr*         (root)
    /// list    : Expr*         -> Expr
    /// plus    : Expr Expr     -> Expr
    /// neg     : Expr          -> Expr
    /// num     : text          -> Expr
    /// sym     : text          -> Expr
    /// ```
    pub fn example() -> Self {
        Self::new("example", "program")
            .with(Construct::flexible("program", "Program", "Expr"))
            .with(Construct::flexible("list", "Expr", "Expr"))
            .with(Construct::fixed("plus", "Expr", &["Expr", "Expr"]))
            .with(Construct::fixed("neg", "Expr", &["Expr"]))
            .with(Construct::text("num", "Expr"))
            .with(Construct::text("sym", "Expr"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hole_fits_every_slot() {
        let lang = Language::example();
        assert!(lang.fits(HOLE, "Expr"));
        assert!(lang.fits(HOLE, "Program"));
        assert!(lang.fits_root(HOLE));
    }

    #[test]
    fn test_sorts_must_match() {
        let lang = Language::example();
        assert!(lang.fits("plus", "Expr"));
        assert!(!lang.fits("program", "Expr"));
        assert!(lang.fits("program", ANY_SORT));
    }

    #[test]
    fn test_check_children_enforces_fixed_arity() {
        let lang = Language::example();
        assert!(lang.check_children("plus", &["num", "?"]).is_ok());
        assert!(matches!(
            lang.check_children("plus", &["num"]),
            Err(EditError::SchemaViolation(_))
        ));
        assert!(lang.check_children("list", &[]).is_ok());
        assert!(lang.check_children("num", &["num"]).is_err());
    }

    #[test]
    fn test_check_subtree_rejects_unknown_and_misplaced_text() {
        let lang = Language::example();
        assert!(lang.check_subtree(&Subtree::branch("frob", vec![])).is_err());
        assert!(lang.check_subtree(&Subtree::branch("num", vec![])).is_err());
        assert!(lang.check_subtree(&Subtree::text("list", "x")).is_err());
        let ok = Subtree::branch(
            "plus",
            vec![Subtree::text("num", "1"), Subtree::hole()],
        );
        assert!(lang.check_subtree(&ok).is_ok());
    }

    #[test]
    fn test_empty_node_fills_fixed_slots_with_holes() {
        let lang = Language::example();
        assert_eq!(
            lang.empty_node("plus").unwrap(),
            Subtree::branch("plus", vec![Subtree::hole(), Subtree::hole()])
        );
        assert_eq!(lang.empty_node("num").unwrap(), Subtree::text("num", ""));
    }

    #[test]
    fn test_language_json_round_trip_keeps_order() {
        let lang = Language::example();
        let json = serde_json::to_string(&lang).unwrap();
        let back: Language = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lang);
        let names: Vec<&str> = back.constructs().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["program", "list", "plus", "neg", "num", "sym"]);
    }

    #[test]
    fn test_language_json_requires_root_construct() {
        let json = r#"{"name":"x","root":"missing","constructs":[]}"#;
        assert!(serde_json::from_str::<Language>(json).is_err());
    }
}
