//! The command language.
//!
//! A small postfix, stack-based language: literals and quotations push
//! values onto the data stack, commands and combinators pop their
//! arguments.
//!
//! - [`Term`] and [`Value`]: what programs and the data stack are made of
//! - [`parse()`]: reader for the literal syntax
//! - [`Context`]: the interpreter state and evaluator
//! - primitives, and built-in compound commands written in the language

mod builtins;
mod context;
mod interp;
mod parse;
mod prims;
mod term;

pub use context::{Context, DEFAULT_LOOP_LIMIT, DEFAULT_MAX_DEPTH, Limits};
pub use parse::parse;
pub use term::{Combinator, Datum, Sequence, Term, Value};

/// Whether `name` is a primitive or built-in command.
pub fn is_command(name: &str) -> bool {
    prims::lookup(name).is_some() || builtins::lookup(name).is_some()
}

/// Every command name, primitives first.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    prims::names().chain(builtins::names())
}
