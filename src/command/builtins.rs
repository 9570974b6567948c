//! Compound commands defined in the command language itself.
//!
//! Reshaping commands are ordinary sequences over the primitives, wrapped
//! in `atomic` so that a failure half way leaves the document untouched.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::parse::parse;
use super::term::Term;

const SOURCES: &[(&str, &str)] = &[
    // Navigation
    ("leftmost", "[left] loop"),
    ("rightmost", "[right] loop"),
    ("bottommost", "[child] loop"),
    ("topmost", "[parent] loop"),
    ("first", "child leftmost"),
    ("last", "child rightmost"),
    ("select-all", "topmost select"),
    // Clipboard
    ("cut", "copy delete"),
    // Pull the right sibling in as the last child.
    (
        "slurp",
        "[mark right take goto-mark put-last goto-mark unmark] atomic",
    ),
    // Push the last child out as the right sibling.
    (
        "barf",
        "[mark last take goto-mark put-right goto-mark unmark] atomic",
    ),
    ("swap-left", "[left take child put-right left] atomic"),
    (
        "swap-right",
        "[mark right take goto-mark put-left right unmark] atomic",
    ),
    // Move the cursor node and its right siblings into a new copy of the
    // parent, placed right after it.
    (
        "split",
        "[mark parent shell put-right [goto-mark take right put-last] loop parent first unmark] atomic",
    ),
    // Move the children of the right sibling to the end of this node and
    // drop the emptied sibling. Both nodes must be flexible; `insert-child
    // remove` fails on anything else and leaves the tree as it was.
    (
        "merge",
        "[mark insert-child remove right [first take goto-mark put-last goto-mark right] loop dissolve goto-mark unmark] atomic",
    ),
];

static BUILTINS: LazyLock<HashMap<&'static str, Vec<Term>>> = LazyLock::new(|| {
    SOURCES
        .iter()
        .map(|(name, source)| {
            let body = parse(source).unwrap_or_else(|err| panic!("builtin '{name}': {err}"));
            (*name, body)
        })
        .collect()
});

/// Body of the built-in command `name`.
pub fn lookup(name: &str) -> Option<&'static [Term]> {
    BUILTINS.get(name).map(Vec::as_slice)
}

/// Names of every built-in command.
pub fn names() -> impl Iterator<Item = &'static str> {
    SOURCES.iter().map(|(name, _)| *name)
}
