use std::fmt;

use super::term::{Term, Value};
use crate::document::Document;
use crate::editor::{ClipValue, Clipboard, DEFAULT_HISTORY_LIMIT, History, MacroTable, Recorder};
use crate::error::{EditError, Result};
use crate::keymap::Keymap;
use crate::search::{RegexSearch, Searcher};
use crate::tree::{NodeId, Path};

/// Default cap on nested `{key}`/`eval`/`run-macro` calls.
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Default cap on iterations of a single `loop`.
pub const DEFAULT_LOOP_LIMIT: usize = 1000;

/// Resource limits of one interpreter context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: usize,
    pub loop_limit: usize,
    pub history_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            loop_limit: DEFAULT_LOOP_LIMIT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// State kept between successive `paste` commands so a repeated paste can
/// swap in the next-older entry of the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PasteCycle {
    pub slot: u8,
    /// Entries below the top the current paste came from.
    pub depth: usize,
    /// Document as it was before the first paste of the cycle.
    pub before: Document,
    /// The slot stack as it was before the first paste of the cycle.
    pub stack: Vec<ClipValue>,
    /// Top-level command that performed the latest paste.
    pub serial: u64,
}

/// Everything `atomic` and `loop` restore on rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot {
    doc: Document,
    clipboard: Clipboard,
    marks: Vec<Path>,
    stack: Vec<Value>,
    history_position: usize,
    paste: Option<PasteCycle>,
}

/// The interpreter context: every piece of mutable editing state, passed
/// explicitly to each command.
pub struct Context {
    pub(crate) doc: Document,
    pub(crate) clipboard: Clipboard,
    /// Mark register used by `mark`/`goto-mark`/`unmark`.
    pub(crate) marks: Vec<Path>,
    /// Data stack.
    pub(crate) stack: Vec<Value>,
    pub(crate) macros: MacroTable,
    pub(crate) recorder: Recorder,
    pub(crate) keymap: Keymap,
    pub(crate) history: History,
    pub(crate) searcher: Box<dyn Searcher>,
    pub(crate) last_command: Option<String>,
    pub(crate) paste: Option<PasteCycle>,
    /// Current nesting of `{key}`/`eval`/`run-macro` calls.
    pub(crate) depth: usize,
    /// Number of top-level commands started so far.
    pub(crate) serial: u64,
    /// Set when `undo`/`redo` ran during the current top-level command.
    pub(crate) touched_history: bool,
    pub(crate) limits: Limits,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("doc", &self.doc)
            .field("clipboard", &self.clipboard)
            .field("marks", &self.marks)
            .field("stack", &self.stack)
            .field("macros", &self.macros)
            .field("recorder", &self.recorder)
            .field("history", &self.history.len())
            .field("last_command", &self.last_command)
            .field("depth", &self.depth)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// A fresh context with the default keymap and regex search.
    pub fn new(doc: Document) -> Self {
        Self::with_limits(doc, Limits::default())
    }

    pub fn with_limits(doc: Document, limits: Limits) -> Self {
        Self {
            doc,
            clipboard: Clipboard::new(),
            marks: Vec::new(),
            stack: Vec::new(),
            macros: MacroTable::new(),
            recorder: Recorder::new(),
            keymap: Keymap::default(),
            history: History::new(limits.history_limit),
            searcher: Box::new(RegexSearch),
            last_command: None,
            paste: None,
            depth: 0,
            serial: 0,
            touched_history: false,
            limits,
        }
    }

    #[must_use]
    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    #[must_use]
    pub fn with_searcher(mut self, searcher: Box<dyn Searcher>) -> Self {
        self.searcher = searcher;
        self
    }

    pub const fn document(&self) -> &Document {
        &self.doc
    }

    pub const fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub const fn history(&self) -> &History {
        &self.history
    }

    pub const fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub const fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub const fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub const fn limits(&self) -> Limits {
        self.limits
    }

    /// The data stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn marks(&self) -> &[Path] {
        &self.marks
    }

    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    // Snapshots //

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.doc.clone(),
            clipboard: self.clipboard.clone(),
            marks: self.marks.clone(),
            stack: self.stack.clone(),
            history_position: self.history.position(),
            paste: self.paste.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.doc;
        self.clipboard = snapshot.clipboard;
        self.marks = snapshot.marks;
        self.stack = snapshot.stack;
        self.history.set_position(snapshot.history_position);
        self.paste = snapshot.paste;
    }

    /// Run `f`; if it fails, put the document back the way it was.
    pub(crate) fn transact<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let before = self.doc.clone();
        let result = f(self);
        if result.is_err() {
            self.doc = before;
        }
        result
    }

    // Data stack //

    pub(crate) fn pop(&mut self, command: &str) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| EditError::StackUnderflow(command.to_string()))
    }

    fn pop_as<T>(
        &mut self,
        command: &str,
        expected: &'static str,
        take: impl FnOnce(Value) -> std::result::Result<T, Value>,
    ) -> Result<T> {
        let value = self.pop(command)?;
        take(value).map_err(|value| {
            self.stack.push(value);
            EditError::TypeMismatch {
                command: command.to_string(),
                expected,
            }
        })
    }

    pub(crate) fn pop_slot(&mut self, command: &str) -> Result<char> {
        self.pop_as(command, "slot", |value| match value {
            Value::Slot(slot) => Ok(slot),
            other => Err(other),
        })
    }

    pub(crate) fn pop_str(&mut self, command: &str) -> Result<String> {
        self.pop_as(command, "string", |value| match value {
            Value::Str(text) => Ok(text),
            other => Err(other),
        })
    }

    pub(crate) fn pop_quote(&mut self, command: &str) -> Result<Vec<Term>> {
        self.pop_as(command, "quotation", |value| match value {
            Value::Quote(body) => Ok(body),
            other => Err(other),
        })
    }

    pub(crate) fn pop_tree(&mut self, command: &str) -> Result<crate::tree::Subtree> {
        self.pop_as(command, "subtree", |value| match value {
            Value::Tree(tree) => Ok(tree),
            other => Err(other),
        })
    }

    /// Clipboard slot argument: a digit slot on top of the stack, or `0`.
    pub(crate) fn clip_slot(&mut self, command: &str) -> Result<Option<u8>> {
        match self.stack.last() {
            Some(Value::Slot(slot)) => {
                let slot = *slot;
                let digit = slot.to_digit(10).ok_or_else(|| EditError::TypeMismatch {
                    command: command.to_string(),
                    expected: "clipboard slot 0-9",
                })?;
                self.stack.pop();
                Ok(u8::try_from(digit).ok())
            }
            _ => Ok(None),
        }
    }

    // Cursor //

    pub(crate) fn cursor_path(&self) -> Path {
        self.doc.cursor.path().clone()
    }

    pub(crate) fn cursor_node(&self) -> Result<NodeId> {
        self.doc.tree.resolve(self.doc.cursor.path())
    }
}
