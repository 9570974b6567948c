//! Reader for the literal command syntax.
//!
//! ```text
//! [left] loop             # quotation followed by a postfix combinator
//! 0 copy {l} 0 paste      # slot literals, key tokens, primitives
//! "plus" create           # string literal
//! ```

use std::iter::Peekable;
use std::str::Chars;

use super::term::{Combinator, Datum, Term};
use crate::error::{EditError, Result};
use crate::keymap::Key;

/// Parse a command-language source string into a term sequence.
pub fn parse(source: &str) -> Result<Vec<Term>> {
    let mut chars = source.chars().peekable();
    // Open quotations, innermost last; the bottom entry is the top level.
    let mut frames: Vec<Vec<Term>> = vec![Vec::new()];

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while chars.next().is_some_and(|c| c != '\n') {}
            }
            '[' => {
                chars.next();
                frames.push(Vec::new());
            }
            ']' => {
                chars.next();
                if frames.len() == 1 {
                    return Err(EditError::Parse("unbalanced ']'".into()));
                }
                let body = frames.pop().unwrap_or_default();
                push(&mut frames, Term::Quotation(body));
            }
            '{' => {
                chars.next();
                let term = read_key(&mut chars)?;
                push(&mut frames, term);
            }
            '"' => {
                chars.next();
                let text = read_string(&mut chars)?;
                push(&mut frames, Term::Datum(Datum::Str(text)));
            }
            _ => {
                let word = read_word(&mut chars);
                push(&mut frames, classify(&word));
            }
        }
    }

    if frames.len() > 1 {
        return Err(EditError::Parse("unclosed '['".into()));
    }
    Ok(frames.pop().unwrap_or_default())
}

fn push(frames: &mut [Vec<Term>], term: Term) {
    if let Some(frame) = frames.last_mut() {
        frame.push(term);
    }
}

fn classify(word: &str) -> Term {
    if let Some(combinator) = Combinator::from_name(word) {
        return Term::Combinator(combinator);
    }
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_alphanumeric() => Term::Datum(Datum::Slot(ch)),
        _ => Term::Primitive(word.to_string()),
    }
}

fn read_word(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() || matches!(ch, '[' | ']' | '{' | '"') {
            break;
        }
        word.push(ch);
        chars.next();
    }
    word
}

fn read_key(chars: &mut Peekable<Chars<'_>>) -> Result<Term> {
    let mut name = String::new();
    for ch in chars.by_ref() {
        if ch == '}' {
            return Ok(Term::Literal(Key::parse(&name)?));
        }
        name.push(ch);
    }
    Err(EditError::Parse(format!("unclosed key token '{{{name}'")))
}

fn read_string(chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut text = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return Ok(text),
            '\\' => match chars.next() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some(other) => text.push(other),
                None => break,
            },
            other => text.push(other),
        }
    }
    Err(EditError::Parse("unterminated string literal".into()))
}
