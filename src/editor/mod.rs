//! Editing state that lives next to the document: cursor and selection,
//! clipboard, undo history and macros.

mod clipboard;
mod cursor;
mod history;
mod macros;

pub use clipboard::{ClipValue, Clipboard, SLOT_COUNT};
pub use cursor::{Cursor, Selection};
pub use history::{DEFAULT_HISTORY_LIMIT, History, Record};
pub use macros::{MacroTable, Recorder};
