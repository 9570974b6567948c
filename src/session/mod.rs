//! The top-level command loop.
//!
//! A [`Session`] takes one key (or one command string) at a time, resolves
//! it through the keymap, runs it to completion and then does the
//! bookkeeping that belongs to top-level commands only:
//! - an undo record when the tree changed,
//! - dropping redo records,
//! - `last-command` and the paste cycle,
//! - clearing the data stack.
//!
//! While a macro is being recorded the session buffers keys instead of
//! running them, until `Esc` stores the recording. `Esc` before any key
//! was buffered abandons the recording and leaves the slot alone.

use tracing::{debug, warn};

use crate::command::{Context, Datum, Limits, Sequence, Term, parse};
use crate::document::Document;
use crate::editor::Record;
use crate::error::{EditError, Result};
use crate::keymap::{Binding, Key, Keymap};

/// What happened to a key fed to [`Session::handle_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A command ran to completion.
    Done,
    /// The key takes a slot; waiting for the next key.
    Pending,
    /// The key was buffered into the macro being recorded.
    Recording,
    /// `Esc` finished a recording and stored it in this slot.
    Recorded(char),
    /// `Esc` abandoned a pending slot-taking key or an empty recording.
    Cancelled,
}

/// A slot-taking key waiting for its slot.
#[derive(Debug, Clone)]
struct PendingKey {
    key: Key,
    body: Vec<Term>,
}

#[derive(Debug)]
pub struct Session {
    cx: Context,
    pending: Option<PendingKey>,
}

impl Session {
    pub fn new(doc: Document) -> Self {
        Self::from_context(Context::new(doc))
    }

    pub fn with_limits(doc: Document, limits: Limits) -> Self {
        Self::from_context(Context::with_limits(doc, limits))
    }

    pub fn from_context(cx: Context) -> Self {
        Self { cx, pending: None }
    }

    #[must_use]
    pub fn with_keymap(self, keymap: Keymap) -> Self {
        Self::from_context(self.cx.with_keymap(keymap))
    }

    pub const fn context(&self) -> &Context {
        &self.cx
    }

    pub const fn document(&self) -> &Document {
        self.cx.document()
    }

    pub fn into_document(self) -> Document {
        self.cx.doc
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub const fn is_recording(&self) -> bool {
        self.cx.recorder().is_recording()
    }

    /// Feed one key press.
    pub fn handle_key(&mut self, key: Key) -> Result<Outcome> {
        if self.cx.recorder.is_recording() {
            if key.is_esc() && self.cx.recorder.buffered() == 0 {
                self.cx.recorder.abort();
                debug!("empty recording discarded");
                return Ok(Outcome::Cancelled);
            }
            if key.is_esc() {
                if let Some((slot, body)) = self.cx.recorder.finish() {
                    debug!(slot = %slot, body = %Sequence(&body), "recorded macro");
                    self.cx.macros.set(slot, body);
                    return Ok(Outcome::Recorded(slot));
                }
            }
            self.cx.recorder.feed(key);
            return Ok(Outcome::Recording);
        }

        if let Some(pending) = self.pending.take() {
            if key.is_esc() {
                debug!(key = %pending.key, "pending key cancelled");
                return Ok(Outcome::Cancelled);
            }
            let slot = key.as_slot().ok_or_else(|| EditError::TypeMismatch {
                command: pending.key.to_string(),
                expected: "slot key",
            })?;
            let mut terms = Vec::with_capacity(pending.body.len() + 1);
            terms.push(Term::Datum(Datum::Slot(slot)));
            terms.extend(pending.body);
            self.execute(&format!("{} {key}", pending.key), &terms)?;
            return Ok(self.settled());
        }

        let binding = match self.cx.keymap.resolve(&key) {
            Ok(binding) => binding.clone(),
            Err(_) if key.is_esc() => return Ok(Outcome::Cancelled),
            Err(err) => return Err(err),
        };
        match binding {
            Binding::Command(body) => {
                self.execute(&key.to_string(), &body)?;
                Ok(self.settled())
            }
            Binding::TakesSlot(body) => {
                self.pending = Some(PendingKey { key, body });
                Ok(Outcome::Pending)
            }
        }
    }

    /// Feed a sequence of keys, stopping at the first failure.
    pub fn handle_keys(&mut self, keys: impl IntoIterator<Item = Key>) -> Result<Outcome> {
        let mut outcome = Outcome::Done;
        for key in keys {
            outcome = self.handle_key(key)?;
        }
        Ok(outcome)
    }

    fn settled(&self) -> Outcome {
        if self.cx.recorder.is_recording() {
            Outcome::Recording
        } else {
            Outcome::Done
        }
    }

    /// Parse `source` and run it as one top-level command.
    pub fn eval(&mut self, source: &str) -> Result<()> {
        let terms = parse(source)?;
        self.execute(source.trim(), &terms)
    }

    /// Run `terms` as one top-level command identified by `id`.
    ///
    /// Failures keep the effects of the terms that ran before the failing
    /// one; only `atomic` rolls back. Either way the change is recorded, so
    /// it can be undone.
    pub fn execute(&mut self, id: &str, terms: &[Term]) -> Result<()> {
        let cx = &mut self.cx;
        let data_only = terms.iter().all(Term::is_data);
        cx.serial += 1;
        cx.depth = 0;
        cx.touched_history = false;
        if !data_only && cx.last_command.as_deref() != Some(id) {
            cx.paste = None;
        }
        let before = cx.doc.clone();

        let result = cx.run(terms);

        if !cx.touched_history && !data_only {
            cx.history.discard_redo();
            if cx.doc.tree != before.tree {
                let after = cx.doc.clone();
                cx.history.push(Record {
                    command: id.to_string(),
                    before,
                    after,
                });
            }
        }
        if result.is_err() || !data_only {
            cx.stack.clear();
        }
        if !data_only {
            cx.last_command = Some(id.to_string());
        }
        cx.depth = 0;

        match &result {
            Ok(()) => debug!(command = id, "command done"),
            Err(err) => warn!(command = id, error = %err, "command failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests;
