use std::sync::Arc;

use crate::command::{Limits, Value};
use crate::document::Document;
use crate::editor::ClipValue;
use crate::error::EditError;
use crate::keymap::{Binding, Key, Keymap};
use crate::tree::{Language, Path, Subtree};

use super::{Outcome, Session};

fn sym(text: &str) -> Subtree {
    Subtree::text("sym", text)
}

fn session_with(children: Vec<Subtree>, cursor: &[usize]) -> Session {
    let doc = Document::from_subtree(
        Arc::new(Language::example()),
        &Subtree::branch("program", children),
    )
    .unwrap()
    .with_cursor(Path::from(cursor));
    Session::new(doc)
}

/// `(program A B C)` with the cursor on `B`.
fn abc() -> Session {
    session_with(vec![sym("A"), sym("B"), sym("C")], &[1])
}

fn shown(session: &Session) -> String {
    session.document().to_subtree().to_string()
}

fn cursor(session: &Session) -> Path {
    session.document().cursor().path().clone()
}

fn keys(session: &mut Session, typed: &str) -> crate::error::Result<Outcome> {
    session.handle_keys(Key::parse_sequence(typed).unwrap())
}

#[test]
fn test_delete_then_undo_restores_tree_and_cursor() {
    let mut session = abc();
    session.eval("delete").unwrap();
    assert_eq!(shown(&session), "(program A ? C)");
    assert_eq!(cursor(&session), Path::from(&[1][..]));

    session.eval("undo").unwrap();
    assert_eq!(shown(&session), "(program A B C)");
    assert_eq!(cursor(&session), Path::from(&[1][..]));
}

#[test]
fn test_undo_redo_is_identity() {
    let mut session = abc();
    session.eval("\"plus\" insert-parent").unwrap();
    let after = session.document().clone();
    session.eval("undo").unwrap();
    session.eval("redo").unwrap();
    assert_eq!(session.document(), &after);
    assert_eq!(
        session.eval("redo"),
        Err(EditError::NothingToRedo),
        "redo at the newest record should fail"
    );
}

#[test]
fn test_redo_returns_cursor_to_where_undo_left_it() {
    let mut session = abc();
    session.eval("delete").unwrap();
    session.eval("right").unwrap();
    session.eval("undo").unwrap();
    assert_eq!(cursor(&session), Path::from(&[1][..]));
    session.eval("redo").unwrap();
    assert_eq!(shown(&session), "(program A ? C)");
    assert_eq!(cursor(&session), Path::from(&[2][..]));
}

#[test]
fn test_new_command_discards_redo() {
    let mut session = abc();
    session.eval("delete").unwrap();
    session.eval("undo").unwrap();
    session.eval("left").unwrap();
    assert_eq!(session.eval("redo"), Err(EditError::NothingToRedo));
}

#[test]
fn test_navigation_is_not_recorded() {
    let mut session = abc();
    session.eval("left right right").unwrap();
    assert!(session.context().history().is_empty());
    assert_eq!(session.eval("undo"), Err(EditError::NothingToUndo));
}

#[test]
fn test_failed_command_keeps_partial_effect_and_is_undoable() {
    let mut session = abc();
    let err = session.eval("delete right right").unwrap_err();
    assert_eq!(err, EditError::NoSibling);
    assert_eq!(shown(&session), "(program A ? C)");
    assert_eq!(session.context().history().len(), 1);
    session.eval("undo").unwrap();
    assert_eq!(shown(&session), "(program A B C)");
}

#[test]
fn test_failed_atomic_records_nothing() {
    let mut session = abc();
    session.eval("[delete right right] atomic").unwrap_err();
    assert_eq!(shown(&session), "(program A B C)");
    assert!(session.context().history().is_empty());
}

#[test]
fn test_undo_inside_failed_atomic_is_rolled_back() {
    let mut session = abc();
    session.eval("delete").unwrap();
    session.eval("[undo right right] atomic").unwrap_err();
    assert_eq!(shown(&session), "(program A ? C)");
    assert_eq!(session.context().history().position(), 0);
    session.eval("undo").unwrap();
    assert_eq!(shown(&session), "(program A B C)");
}

#[test]
fn test_copy_then_paste_to_the_right() {
    let mut session = abc();
    session.eval("0 copy").unwrap();
    session.eval("right").unwrap();
    session.eval("0 paste").unwrap();
    assert_eq!(shown(&session), "(program A B C B)");
    assert_eq!(cursor(&session), Path::from(&[3][..]));
    assert!(session.context().clipboard().is_empty(0));
}

#[test]
fn test_cut_and_paste_with_keys() {
    let mut session = abc();
    keys(&mut session, "3xl3p").unwrap();
    assert_eq!(shown(&session), "(program A ? C B)");
    assert!(session.context().clipboard().is_empty(3));
    assert!(session.context().stack().is_empty());
}

#[test]
fn test_digit_key_keeps_its_slot_for_the_next_key() {
    let mut session = abc();
    keys(&mut session, "5").unwrap();
    assert_eq!(session.context().stack(), &[Value::Slot('5')]);
    keys(&mut session, "y").unwrap();
    assert!(session.context().stack().is_empty());
    assert_eq!(session.context().clipboard().len(5), 1);
}

#[test]
fn test_repeated_paste_cycles_through_slot() {
    let mut session = abc();
    // Slot 0 holds [A, B, C] with C on top.
    keys(&mut session, "hylylyl").unwrap_err();
    assert_eq!(session.context().clipboard().len(0), 3);
    keys(&mut session, "v").unwrap();
    assert_eq!(shown(&session), "(program A B C C)");
    keys(&mut session, "v").unwrap();
    assert_eq!(shown(&session), "(program A B C B)");
    keys(&mut session, "v").unwrap();
    assert_eq!(shown(&session), "(program A B C A)");
    keys(&mut session, "v").unwrap();
    assert_eq!(shown(&session), "(program A B C C)");
    // The entry currently pasted is the one missing from the slot.
    assert_eq!(
        session.context().clipboard().stack(0),
        &[ClipValue::Single(sym("A")), ClipValue::Single(sym("B"))]
    );
    // Any other command ends the cycle; the next paste pops afresh.
    keys(&mut session, "hv").unwrap();
    assert_eq!(shown(&session), "(program A B C B C)");
    assert_eq!(session.context().clipboard().len(0), 1);
}

#[test]
fn test_failed_paste_cycle_keeps_slot_and_document() {
    let plus = Subtree::branch("plus", vec![Subtree::hole(), sym("y")]);
    let mut session = session_with(vec![plus.clone()], &[]);
    session.eval("copy").unwrap();
    session.eval("child child right copy left").unwrap();
    session.eval("paste").unwrap();
    assert_eq!(shown(&session), "(program (plus y y))");
    let program = ClipValue::Single(Subtree::branch("program", vec![plus]));
    assert_eq!(session.context().clipboard().stack(0), &[program.clone()]);

    // The older entry is a whole program, which cannot stand in a `plus`.
    assert!(matches!(
        session.eval("paste"),
        Err(EditError::SchemaViolation(_))
    ));
    assert_eq!(shown(&session), "(program (plus y y))");
    assert_eq!(session.context().clipboard().stack(0), &[program.clone()]);

    // Repeating again wraps back to the entry that fits.
    session.eval("paste").unwrap();
    assert_eq!(shown(&session), "(program (plus y y))");
    assert_eq!(session.context().clipboard().stack(0), &[program]);
}

#[test]
fn test_record_and_run_macro() {
    let mut session = session_with(vec![sym("A"), sym("B"), sym("C")], &[0]);
    assert_eq!(keys(&mut session, "q").unwrap(), Outcome::Pending);
    assert_eq!(keys(&mut session, "a").unwrap(), Outcome::Recording);
    assert_eq!(keys(&mut session, "ld").unwrap(), Outcome::Recording);
    // Keys are buffered, not run.
    assert_eq!(shown(&session), "(program A B C)");
    assert_eq!(keys(&mut session, "{esc}").unwrap(), Outcome::Recorded('a'));

    keys(&mut session, "@a").unwrap();
    assert_eq!(shown(&session), "(program A ? C)");
    assert_eq!(cursor(&session), Path::from(&[1][..]));
}

#[test]
fn test_escape_right_after_record_keeps_old_macro() {
    let mut session = abc();
    session.eval("[delete] a set-macro").unwrap();
    keys(&mut session, "qa").unwrap();
    assert!(session.is_recording());
    assert_eq!(keys(&mut session, "{esc}").unwrap(), Outcome::Cancelled);
    assert!(!session.is_recording());

    keys(&mut session, "@a").unwrap();
    assert_eq!(shown(&session), "(program A ? C)");
}

#[test]
fn test_macro_set_from_quotation() {
    let mut session = session_with(vec![sym("A"), sym("B"), sym("C")], &[0]);
    session.eval("[right delete] a set-macro").unwrap();
    session.eval("a run-macro").unwrap();
    assert_eq!(shown(&session), "(program A ? C)");
    session.eval("undo").unwrap();
    assert_eq!(shown(&session), "(program A B C)");
}

#[test]
fn test_recursive_macro_hits_depth_limit() {
    let limits = Limits {
        max_depth: 16,
        ..Limits::default()
    };
    let doc = Document::from_subtree(
        Arc::new(Language::example()),
        &Subtree::branch("program", vec![sym("A")]),
    )
    .unwrap();
    let mut session = Session::with_limits(doc, limits);
    keys(&mut session, "qb@b{esc}").unwrap();
    assert_eq!(
        keys(&mut session, "@b"),
        Err(EditError::MacroRecursionLimit(16))
    );
    // Still usable afterwards.
    session.eval("child delete").unwrap();
    assert_eq!(shown(&session), "(program ?)");
}

#[test]
fn test_escape_cancels_pending_key() {
    let mut session = abc();
    assert_eq!(keys(&mut session, "@").unwrap(), Outcome::Pending);
    assert_eq!(keys(&mut session, "{esc}").unwrap(), Outcome::Cancelled);
    assert!(!session.is_pending());
    assert_eq!(keys(&mut session, "{esc}").unwrap(), Outcome::Cancelled);
}

#[test]
fn test_pending_key_needs_a_slot() {
    let mut session = abc();
    keys(&mut session, "@").unwrap();
    assert!(matches!(
        keys(&mut session, "("),
        Err(EditError::TypeMismatch { .. })
    ));
    assert!(!session.is_pending());
}

#[test]
fn test_unbound_key() {
    let mut session = abc();
    assert_eq!(
        keys(&mut session, "{C-z}"),
        Err(EditError::Unbound("C-z".into()))
    );
}

#[test]
fn test_custom_keymap() {
    let keymap = Keymap::parse("bind h right\nbind-slot g run-macro").unwrap();
    let mut session = abc().with_keymap(keymap);
    keys(&mut session, "h").unwrap();
    assert_eq!(cursor(&session), Path::from(&[2][..]));
    assert_eq!(keys(&mut session, "l"), Err(EditError::Unbound("l".into())));
}

#[test]
fn test_key_literal_in_command_string() {
    let mut session = abc();
    session.eval("{h} {d}").unwrap();
    assert_eq!(shown(&session), "(program ? B C)");
}

#[test]
fn test_reshape_keys() {
    let list = Subtree::branch("list", vec![sym("x")]);
    let mut session = session_with(vec![list, sym("y"), sym("z")], &[0]);
    keys(&mut session, ")").unwrap();
    assert_eq!(shown(&session), "(program (list x y) z)");
    keys(&mut session, "(").unwrap();
    assert_eq!(shown(&session), "(program (list x) y z)");
    keys(&mut session, "u").unwrap();
    assert_eq!(shown(&session), "(program (list x y) z)");
}

#[test]
fn test_mark_register_survives_between_commands() {
    let mut session = abc();
    keys(&mut session, "mhh").unwrap_err();
    assert_eq!(cursor(&session), Path::from(&[0][..]));
    keys(&mut session, "'").unwrap();
    assert_eq!(cursor(&session), Path::from(&[1][..]));
}

#[test]
fn test_search_command() {
    let mut session = abc();
    session.eval("\"^[AC]$\" search").unwrap();
    assert_eq!(cursor(&session), Path::from(&[2][..]));
    assert_eq!(session.document().cursor().selection().len(), 2);
    keys(&mut session, "N").unwrap();
    assert_eq!(cursor(&session), Path::from(&[0][..]));
}

#[test]
fn test_binding_lookup_matches_keymap() {
    let session = abc();
    assert!(matches!(
        session.context().keymap().resolve(&Key::char('@')),
        Ok(Binding::TakesSlot(_))
    ));
}
