// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. document::DocumentError)
    clippy::module_name_repetitions
)]

//! # Sylvan
//!
//! A structural tree editor engine.
//!
//! Documents are trees of typed nodes checked against a [`tree::Language`].
//! Every edit goes through a small postfix command language:
//! - Primitive commands move the cursor, reshape the tree and use the
//!   clipboard
//! - Quotations with `loop` and `atomic` build the larger commands
//! - Keys resolve to command sequences through a [`keymap::Keymap`]
//! - Each top-level command is one undo step
//!
//! ## Architecture
//!
//! Everything a command touches lives in one explicit
//! [`command::Context`]; a [`session::Session`] wraps it with the
//! per-keypress bookkeeping (undo records, macro recording, pending keys).
//!
//! ## Modules
//!
//! - [`tree`]: Arena store, paths and language schemas
//! - [`editor`]: Cursor, clipboard, history and macros
//! - [`command`]: Command terms, parser and interpreter
//! - [`keymap`]: Keys and key bindings
//! - [`session`]: Top-level command loop
//! - [`document`]: Documents and persistence
//! - [`search`]: Search producing selections
//! - [`config`]: Flag files and limits

pub mod command;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod keymap;
pub mod search;
pub mod session;
pub mod tree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::command::{Limits, parse};
    pub use crate::document::{Document, JsonStore, Persistence};
    pub use crate::error::EditError;
    pub use crate::keymap::{Key, Keymap};
    pub use crate::session::{Outcome, Session};
    pub use crate::tree::{Language, Path, Subtree};
}
