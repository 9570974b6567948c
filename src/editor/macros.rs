//! Macro table and key recorder.

use std::collections::BTreeMap;

use tracing::debug;

use crate::command::Term;
use crate::keymap::Key;

/// Stored macros, keyed by slot (`0`–`9`, letters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: BTreeMap<char, Vec<Term>>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: char) -> Option<&[Term]> {
        self.macros.get(&slot).map(Vec::as_slice)
    }

    /// Store (or overwrite) the macro in `slot`.
    pub fn set(&mut self, slot: char, body: Vec<Term>) {
        debug!(slot = %slot, len = body.len(), "macro stored");
        self.macros.insert(slot, body);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum RecorderState {
    #[default]
    Idle,
    Recording {
        slot: char,
        keys: Vec<Key>,
    },
}

/// Idle/Recording state machine fed with raw keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorder {
    state: RecorderState,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Slot being recorded into, if any.
    pub const fn slot(&self) -> Option<char> {
        match self.state {
            RecorderState::Recording { slot, .. } => Some(slot),
            RecorderState::Idle => None,
        }
    }

    /// Enter Recording(`slot`), dropping any unfinished recording.
    pub fn start(&mut self, slot: char) {
        self.state = RecorderState::Recording {
            slot,
            keys: Vec::new(),
        };
    }

    /// Number of keys buffered so far.
    pub fn buffered(&self) -> usize {
        match &self.state {
            RecorderState::Recording { keys, .. } => keys.len(),
            RecorderState::Idle => 0,
        }
    }

    /// Buffer one key. Returns `false` when idle.
    pub fn feed(&mut self, key: Key) -> bool {
        match &mut self.state {
            RecorderState::Recording { keys, .. } => {
                keys.push(key);
                true
            }
            RecorderState::Idle => false,
        }
    }

    /// Stop recording and return the slot with the recorded quotation.
    pub fn finish(&mut self) -> Option<(char, Vec<Term>)> {
        match std::mem::take(&mut self.state) {
            RecorderState::Recording { slot, keys } => {
                Some((slot, keys.into_iter().map(Term::Literal).collect()))
            }
            RecorderState::Idle => None,
        }
    }

    /// Stop recording and throw the buffer away.
    pub fn abort(&mut self) {
        self.state = RecorderState::Idle;
    }
}
