//! Key chords and the key-binding table.
//!
//! The engine only needs `resolve(key) -> binding`; the table itself is
//! owned by whoever drives the session. [`Keymap::default`] is the stock
//! table, and [`Keymap::parse`] reads tables written as
//!
//! ```text
//! # comment
//! bind h left
//! bind x 0 copy delete
//! bind-slot q define-macro
//! ```
//!
//! A `bind-slot` binding waits for one more key and pushes it as a slot
//! literal before running.

use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::command::{Term, parse};
use crate::error::{EditError, Result};

/// A key chord: a key code plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl Key {
    /// Build a key; shift is folded into the character for printable keys.
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let modifiers = if matches!(code, KeyCode::Char(_)) {
            modifiers.difference(KeyModifiers::SHIFT)
        } else {
            modifiers
        };
        Self { code, modifiers }
    }

    pub fn char(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), KeyModifiers::NONE)
    }

    pub fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    pub fn esc() -> Self {
        Self::new(KeyCode::Esc, KeyModifiers::NONE)
    }

    pub fn is_esc(&self) -> bool {
        self.code == KeyCode::Esc && self.modifiers.is_empty()
    }

    /// Slot named by this key: an unmodified ASCII letter or digit.
    pub fn as_slot(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) if self.modifiers.is_empty() && ch.is_ascii_alphanumeric() => {
                Some(ch)
            }
            _ => None,
        }
    }

    /// Parse a key name such as `h`, `C-r`, `M-x`, `esc` or `space`.
    pub fn parse(name: &str) -> Result<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let mut rest = name;
        loop {
            if let Some(tail) = rest.strip_prefix("C-").filter(|t| !t.is_empty()) {
                modifiers |= KeyModifiers::CONTROL;
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("M-").filter(|t| !t.is_empty()) {
                modifiers |= KeyModifiers::ALT;
                rest = tail;
            } else {
                break;
            }
        }
        let code = match rest {
            "esc" => KeyCode::Esc,
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "delete" => KeyCode::Delete,
            "space" => KeyCode::Char(' '),
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "lbrace" => KeyCode::Char('{'),
            "rbrace" => KeyCode::Char('}'),
            _ => {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => KeyCode::Char(ch),
                    _ => return Err(EditError::Parse(format!("unknown key '{name}'"))),
                }
            }
        };
        Ok(Self::new(code, modifiers))
    }

    /// Parse a typed key string: plain characters, with `{name}` for named
    /// keys, e.g. `qa{C-r}ld{esc}`.
    pub fn parse_sequence(text: &str) -> Result<Vec<Self>> {
        let mut keys = Vec::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == '{' {
                let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                keys.push(Self::parse(&name)?);
            } else {
                keys.push(Self::char(ch));
            }
        }
        Ok(keys)
    }
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "C-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "M-")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "space"),
            KeyCode::Char('{') => write!(f, "lbrace"),
            KeyCode::Char('}') => write!(f, "rbrace"),
            KeyCode::Char(ch) => write!(f, "{ch}"),
            KeyCode::Esc => write!(f, "esc"),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Tab => write!(f, "tab"),
            KeyCode::Backspace => write!(f, "backspace"),
            KeyCode::Delete => write!(f, "delete"),
            KeyCode::Left => write!(f, "left"),
            KeyCode::Right => write!(f, "right"),
            KeyCode::Up => write!(f, "up"),
            KeyCode::Down => write!(f, "down"),
            KeyCode::Home => write!(f, "home"),
            KeyCode::End => write!(f, "end"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// What a key is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Run the sequence.
    Command(Vec<Term>),
    /// Read one more key as a slot literal, then run the sequence.
    TakesSlot(Vec<Term>),
}

impl Binding {
    pub fn terms(&self) -> &[Term] {
        match self {
            Self::Command(terms) | Self::TakesSlot(terms) => terms,
        }
    }
}

/// Mapping from key chords to command terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<Key, Binding>,
}

const DEFAULT_KEYMAP: &str = r#"
# navigation
bind h left
bind l right
bind j child
bind k parent
bind H leftmost
bind L rightmost
bind J bottommost
bind K topmost
bind ^ first
bind $ last

# selection and marks
bind s select
bind S select-all
bind C-g deselect
bind n next-selected
bind N prev-selected
bind m mark
bind ' goto-mark

# editing
bind d delete
bind D clear
bind r remove
bind w unwrap
bind W "list" insert-parent
bind i insert-left-sibling
bind a insert-right-sibling
bind o insert-child
bind + "plus" create
bind ~ "neg" create
bind [ "list" create

# clipboard
bind y copy
bind x cut
bind v paste
bind p paste

# reshaping
bind ) slurp
bind ( barf
bind < swap-left
bind > swap-right
bind | split
bind & merge

# history
bind u undo
bind U redo
bind C-r redo

# macros
bind-slot q define-macro
bind-slot @ run-macro
"#;

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::parse(DEFAULT_KEYMAP).expect("default keymap must parse");
        for digit in '0'..='9' {
            keymap.bind(
                Key::char(digit),
                Binding::Command(vec![Term::Datum(crate::command::Datum::Slot(digit))]),
            );
        }
        keymap
    }
}

impl Keymap {
    /// A table with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: Key, binding: Binding) {
        self.bindings.insert(key, binding);
    }

    pub fn unbind(&mut self, key: Key) {
        self.bindings.remove(&key);
    }

    /// Look a key up.
    pub fn resolve(&self, key: &Key) -> Result<&Binding> {
        self.bindings
            .get(key)
            .ok_or_else(|| EditError::Unbound(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Parse a keymap file into a table.
    pub fn parse(source: &str) -> Result<Self> {
        let mut keymap = Self::empty();
        keymap.extend_from(source)?;
        Ok(keymap)
    }

    /// Add the bindings of a keymap file, overriding existing ones.
    pub fn extend_from(&mut self, source: &str) -> Result<()> {
        for (number, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(3, char::is_whitespace);
            let directive = parts.next().unwrap_or_default();
            let key = parts.next().ok_or_else(|| {
                EditError::Parse(format!("line {}: missing key", number + 1))
            })?;
            let body = parse(parts.next().unwrap_or_default())
                .map_err(|err| EditError::Parse(format!("line {}: {err}", number + 1)))?;
            let binding = match directive {
                "bind" => Binding::Command(body),
                "bind-slot" => Binding::TakesSlot(body),
                other => {
                    return Err(EditError::Parse(format!(
                        "line {}: unknown directive '{other}'",
                        number + 1
                    )));
                }
            };
            self.bind(Key::parse(key)?, binding);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_modified_keys() {
        assert_eq!(Key::parse("esc").unwrap(), Key::esc());
        assert_eq!(Key::parse("C-r").unwrap(), Key::ctrl('r'));
        assert_eq!(
            Key::parse("M-x").unwrap(),
            Key::new(KeyCode::Char('x'), KeyModifiers::ALT)
        );
        assert_eq!(Key::parse("C--").unwrap(), Key::ctrl('-'));
        assert!(Key::parse("C-").is_err());
        assert!(Key::parse("nonsense").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for name in ["h", "C-r", "esc", "space", "lbrace", "M-C-x"] {
            let key = Key::parse(name).unwrap();
            assert_eq!(Key::parse(&key.to_string()).unwrap(), key);
        }
    }

    #[test]
    fn test_shift_is_folded_into_char() {
        let event = KeyEvent::new(KeyCode::Char('H'), KeyModifiers::SHIFT);
        assert_eq!(Key::from(event), Key::char('H'));
    }

    #[test]
    fn test_parse_sequence() {
        let keys = Key::parse_sequence("qa{C-r}l{esc}").unwrap();
        assert_eq!(
            keys,
            vec![
                Key::char('q'),
                Key::char('a'),
                Key::ctrl('r'),
                Key::char('l'),
                Key::esc(),
            ]
        );
    }

    #[test]
    fn test_as_slot() {
        assert_eq!(Key::char('a').as_slot(), Some('a'));
        assert_eq!(Key::char('7').as_slot(), Some('7'));
        assert_eq!(Key::char('(').as_slot(), None);
        assert_eq!(Key::ctrl('a').as_slot(), None);
    }

    #[test]
    fn test_default_keymap_resolves() {
        let keymap = Keymap::default();
        assert_eq!(
            keymap.resolve(&Key::char('h')).unwrap(),
            &Binding::Command(vec![Term::Primitive("left".into())])
        );
        assert!(matches!(
            keymap.resolve(&Key::char('q')).unwrap(),
            Binding::TakesSlot(_)
        ));
        assert_eq!(
            keymap.resolve(&Key::char('Z')),
            Err(EditError::Unbound("Z".into()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(Keymap::parse("bind").is_err());
        assert!(Keymap::parse("rebind h left").is_err());
        assert!(Keymap::parse("bind h [left").is_err());
    }

    #[test]
    fn test_extend_overrides() {
        let mut keymap = Keymap::default();
        keymap.extend_from("bind h right").unwrap();
        assert_eq!(
            keymap.resolve(&Key::char('h')).unwrap().terms(),
            &[Term::Primitive("right".into())]
        );
    }
}
