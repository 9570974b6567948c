//! The evaluator.
//!
//! Sequences run left to right and stop at the first failure, keeping
//! whatever the earlier terms did. Only `atomic` rolls back, and `loop`
//! rolls back just the run that failed.

use tracing::{debug, warn};

use super::builtins;
use super::context::Context;
use super::prims;
use super::term::{Combinator, Datum, Term, Value};
use crate::error::{EditError, Result};
use crate::keymap::Binding;

impl Context {
    /// Evaluate a term sequence.
    pub fn run(&mut self, terms: &[Term]) -> Result<()> {
        let mut index = 0;
        while index < terms.len() {
            match &terms[index] {
                Term::Primitive(name) => self.command(name)?,
                Term::Literal(key) => match self.keymap.resolve(key)?.clone() {
                    Binding::Command(body) => self.nested(&body)?,
                    Binding::TakesSlot(body) => {
                        index += 1;
                        let slot = match terms.get(index) {
                            Some(Term::Literal(next)) => next.as_slot(),
                            Some(Term::Datum(Datum::Slot(slot))) => Some(*slot),
                            _ => None,
                        }
                        .ok_or_else(|| EditError::TypeMismatch {
                            command: key.to_string(),
                            expected: "slot key",
                        })?;
                        self.stack.push(Value::Slot(slot));
                        self.nested(&body)?;
                    }
                },
                Term::Quotation(body) => self.stack.push(Value::Quote(body.clone())),
                Term::Datum(datum) => self.stack.push(Value::from(datum.clone())),
                Term::Combinator(combinator) => {
                    let body = self.pop_quote(combinator.name())?;
                    match combinator {
                        Combinator::Loop => self.repeat(&body),
                        Combinator::Atomic => self.atomic(&body)?,
                        Combinator::Eval => self.nested(&body)?,
                    }
                }
            }
            index += 1;
        }
        Ok(())
    }

    /// Run a primitive or built-in by name.
    fn command(&mut self, name: &str) -> Result<()> {
        let revision = self.doc.tree.revision();
        let result = if let Some(primitive) = prims::lookup(name) {
            primitive(self)
        } else if let Some(body) = builtins::lookup(name) {
            self.run(body)
        } else {
            Err(EditError::UnknownCommand(name.to_string()))
        };
        if self.doc.tree.revision() != revision {
            self.doc.cursor.selection_mut().clear();
        }
        if let Err(err) = &result {
            debug!(command = name, error = %err, "command failed");
        }
        result
    }

    /// Run a sequence one call level deeper.
    pub(crate) fn nested(&mut self, body: &[Term]) -> Result<()> {
        if self.depth >= self.limits.max_depth {
            return Err(EditError::MacroRecursionLimit(self.limits.max_depth));
        }
        self.depth += 1;
        let result = self.run(body);
        self.depth -= 1;
        result
    }

    /// `loop`: never fails.
    fn repeat(&mut self, body: &[Term]) {
        for _ in 0..self.limits.loop_limit {
            let before = self.snapshot();
            match self.run(body) {
                Ok(()) => {
                    if self.snapshot() == before {
                        return;
                    }
                }
                Err(err) => {
                    debug!(error = %err, "loop: stopped");
                    self.restore(before);
                    return;
                }
            }
        }
        warn!(limit = self.limits.loop_limit, "loop: iteration limit reached");
    }

    fn atomic(&mut self, body: &[Term]) -> Result<()> {
        let before = self.snapshot();
        match self.run(body) {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!(error = %err, "atomic: rolled back");
                self.restore(before);
                Err(err)
            }
        }
    }
}
