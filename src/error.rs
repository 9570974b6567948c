//! Error types for the editing engine.

use thiserror::Error;

use crate::tree::Path;

/// All errors a command, a tree mutation or a key lookup can report.
///
/// A failing primitive never leaves the tree in an invalid state; it is up
/// to the enclosing sequence (or `atomic`) to decide what happens next.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The path does not resolve to a node in the current tree.
    #[error("invalid path {0}")]
    InvalidPath(Path),

    /// There is no sibling in the requested direction.
    #[error("no sibling in that direction")]
    NoSibling,

    /// The node has no children to descend into.
    #[error("node has no children")]
    NoChildren,

    /// The operation needs a parent, but the cursor is at the root.
    #[error("already at the root")]
    AtRoot,

    /// The resulting tree would break the language's arity or sort rules.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The node to insert already has a parent (or is an ancestor of the
    /// insertion point).
    #[error("node is already owned by another parent")]
    AlreadyOwned,

    /// The clipboard slot has nothing to paste.
    #[error("clipboard slot {0} is empty")]
    ClipboardEmpty(u8),

    /// The undo history is exhausted.
    #[error("nothing to undo")]
    NothingToUndo,

    /// There is no undone command to re-apply.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Nested key, `eval` or macro invocations went deeper than allowed.
    #[error("macro recursion limit ({0}) exceeded")]
    MacroRecursionLimit(usize),

    /// The key is not bound in the active keymap.
    #[error("key {0} is unbound")]
    Unbound(String),

    /// The word is neither a primitive nor a built-in command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A command needed an argument but the data stack was empty.
    #[error("'{0}' expects an argument on the stack")]
    StackUnderflow(String),

    /// A command found an argument of the wrong kind on the data stack.
    #[error("'{command}' expects {expected}")]
    TypeMismatch {
        /// The command that popped the argument.
        command: String,
        /// Description of the accepted argument kind.
        expected: &'static str,
    },

    /// The mark register is empty or its mark no longer resolves.
    #[error("no mark set")]
    NoMark,

    /// No macro has been stored in the slot.
    #[error("no macro in slot '{0}'")]
    NoMacro(char),

    /// A search produced no matches.
    #[error("no match for '{0}'")]
    NotFound(String),

    /// Command-language source could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EditError>;
