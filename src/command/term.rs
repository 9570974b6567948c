use std::fmt;

use crate::keymap::Key;
use crate::tree::Subtree;

/// A combinator consumes the quotation on top of the data stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Repeat until a run fails, undo that run, succeed.
    Loop,
    /// Run once; on failure restore everything and fail.
    Atomic,
    /// Run once in place.
    Eval,
}

impl Combinator {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Atomic => "atomic",
            Self::Eval => "eval",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "loop" => Some(Self::Loop),
            "atomic" => Some(Self::Atomic),
            "eval" => Some(Self::Eval),
            _ => None,
        }
    }
}

/// Literal data pushed onto the stack as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datum {
    /// A slot name: a digit or a single letter.
    Slot(char),
    Str(String),
}

/// One term of the command language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A primitive or built-in command, looked up by name.
    Primitive(String),
    /// `{key}`: a simulated key press.
    Literal(Key),
    /// `[ ... ]`: an unevaluated sequence.
    Quotation(Vec<Term>),
    Combinator(Combinator),
    Datum(Datum),
}

impl Term {
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::Primitive(name.into())
    }

    /// Whether running this term only pushes data.
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Quotation(_) | Self::Datum(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(name) => write!(f, "{name}"),
            Self::Literal(key) => write!(f, "{{{key}}}"),
            Self::Quotation(body) => write!(f, "[{}]", Sequence(body)),
            Self::Combinator(combinator) => write!(f, "{}", combinator.name()),
            Self::Datum(Datum::Slot(slot)) => write!(f, "{slot}"),
            Self::Datum(Datum::Str(text)) => write_quoted(f, text),
        }
    }
}

/// Display adapter printing terms separated by spaces, in parseable form.
pub struct Sequence<'a>(pub &'a [Term]);

impl fmt::Display for Sequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, term) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in text.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            other => write!(f, "{other}")?,
        }
    }
    write!(f, "\"")
}

/// A value on the interpreter's data stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Slot(char),
    Str(String),
    Quote(Vec<Term>),
    /// A detached subtree, produced by `take` and `shell`.
    Tree(Subtree),
}

impl Value {
    /// Short name of the value's kind, for error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Slot(_) => "slot",
            Self::Str(_) => "string",
            Self::Quote(_) => "quotation",
            Self::Tree(_) => "subtree",
        }
    }
}

impl From<Datum> for Value {
    fn from(datum: Datum) -> Self {
        match datum {
            Datum::Slot(slot) => Self::Slot(slot),
            Datum::Str(text) => Self::Str(text),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(slot) => write!(f, "{slot}"),
            Self::Str(text) => write_quoted(f, text),
            Self::Quote(body) => write!(f, "[{}]", Sequence(body)),
            Self::Tree(tree) => write!(f, "{tree}"),
        }
    }
}
