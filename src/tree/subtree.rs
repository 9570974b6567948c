use std::fmt;

use serde::{Deserialize, Serialize};

use super::schema::HOLE;

/// An owned, parent-less tree value.
///
/// This is the form nodes take outside the arena: in clipboard slots, on the
/// interpreter's data stack, and on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtree {
    pub construct: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Subtree>,
}

impl Subtree {
    /// A node with children (or none, for zero-arity constructs).
    pub fn branch(construct: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            construct: construct.into(),
            text: None,
            children,
        }
    }

    /// A text-bearing leaf.
    pub fn text(construct: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            construct: construct.into(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// The `?` placeholder.
    pub fn hole() -> Self {
        Self::branch(HOLE, Vec::new())
    }

    pub fn is_hole(&self) -> bool {
        self.construct == HOLE
    }

    /// Total number of nodes, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

fn is_bare_word(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| !ch.is_whitespace() && !matches!(ch, '(' | ')' | '"' | '?'))
}

/// S-expression rendering: `(plus 1 ?)`. Text leaves print as their text.
impl fmt::Display for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.text {
            return if is_bare_word(text) {
                write!(f, "{text}")
            } else {
                write!(f, "{text:?}")
            };
        }
        if self.is_hole() {
            return write!(f, "{HOLE}");
        }
        write!(f, "({}", self.construct)?;
        for child in &self.children {
            write!(f, " {child}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_renders_sexpr() {
        let tree = Subtree::branch(
            "plus",
            vec![Subtree::text("num", "1"), Subtree::hole()],
        );
        assert_eq!(tree.to_string(), "(plus 1 ?)");
    }

    #[test]
    fn test_display_quotes_awkward_text() {
        assert_eq!(Subtree::text("sym", "a b").to_string(), "\"a b\"");
        assert_eq!(Subtree::text("sym", "").to_string(), "\"\"");
    }

    #[test]
    fn test_node_count() {
        let tree = Subtree::branch(
            "list",
            vec![Subtree::hole(), Subtree::branch("list", vec![Subtree::hole()])],
        );
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let json = serde_json::to_string(&Subtree::hole()).unwrap();
        assert_eq!(json, r#"{"construct":"?"}"#);
    }
}
