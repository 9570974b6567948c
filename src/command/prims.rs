//! Primitive commands.
//!
//! Each primitive reads its arguments from the data stack, acts on the
//! context and either succeeds or fails with an [`EditError`]. Primitives
//! that take several tree steps either run inside [`Context::transact`] or
//! only mutate in their last step, so a failing primitive never leaves a
//! half-done edit behind.

use tracing::debug;

use super::context::{Context, PasteCycle};
use super::term::Value;
use crate::editor::ClipValue;
use crate::error::{EditError, Result};
use crate::tree::{Arity, NodeId, Path, Subtree, Tree};

type Primitive = fn(&mut Context) -> Result<()>;

const PRIMITIVES: &[(&str, Primitive)] = &[
    // Navigation
    ("left", left),
    ("right", right),
    ("child", child),
    ("parent", parent),
    // Selection
    ("select", select),
    ("deselect", deselect),
    ("next-selected", next_selected),
    ("prev-selected", prev_selected),
    // Mark register
    ("mark", mark),
    ("goto-mark", goto_mark),
    ("unmark", unmark),
    // Editing
    ("delete", delete),
    ("clear", clear),
    ("unwrap", unwrap),
    ("create", create),
    ("insert-left-sibling", insert_left_sibling),
    ("insert-right-sibling", insert_right_sibling),
    ("insert-child", insert_child),
    ("insert-parent", insert_parent),
    ("remove", remove),
    ("dissolve", dissolve),
    // Moving subtrees through the data stack
    ("take", take),
    ("put", put),
    ("put-left", put_left),
    ("put-right", put_right),
    ("put-last", put_last),
    ("shell", shell),
    ("drop", drop_value),
    // Clipboard
    ("copy", copy),
    ("paste", paste),
    // Macros
    ("define-macro", define_macro),
    ("set-macro", set_macro),
    ("run-macro", run_macro),
    // History
    ("undo", undo),
    ("redo", redo),
    // Search
    ("search", search),
];

pub fn lookup(name: &str) -> Option<Primitive> {
    PRIMITIVES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, primitive)| *primitive)
}

/// Names of every primitive command.
pub fn names() -> impl Iterator<Item = &'static str> {
    PRIMITIVES.iter().map(|(name, _)| *name)
}

// Helpers //

/// Copy `value` into the arena and hand it to `place`; the copy is freed
/// again if `place` fails.
fn graft(
    tree: &mut Tree,
    value: &Subtree,
    place: impl FnOnce(&mut Tree, NodeId) -> Result<()>,
) -> Result<()> {
    let node = tree.adopt(value)?;
    if let Err(err) = place(tree, node) {
        tree.discard(node)?;
        return Err(err);
    }
    Ok(())
}

/// Replace the node at `path` with a copy of `value`, freeing the old node.
fn replace_with(tree: &mut Tree, path: &Path, value: &Subtree) -> Result<()> {
    graft(tree, value, |tree, node| {
        let old = tree.replace(path, node)?;
        tree.discard(old)
    })
}

fn parent_and_index(path: &Path) -> Result<(Path, usize)> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(EditError::AtRoot),
    }
}

/// Pop a subtree, run `f` with it, and push it back if `f` fails.
fn with_popped_tree(
    cx: &mut Context,
    command: &str,
    f: impl FnOnce(&mut Context, &Subtree) -> Result<()>,
) -> Result<()> {
    let value = cx.pop_tree(command)?;
    let result = f(cx, &value);
    if result.is_err() {
        cx.stack.push(Value::Tree(value));
    }
    result
}

// Navigation //

fn left(cx: &mut Context) -> Result<()> {
    cx.doc.cursor.left()
}

fn right(cx: &mut Context) -> Result<()> {
    cx.doc.cursor.right(&cx.doc.tree)
}

fn child(cx: &mut Context) -> Result<()> {
    cx.doc.cursor.child(&cx.doc.tree)
}

fn parent(cx: &mut Context) -> Result<()> {
    cx.doc.cursor.parent()
}

// Selection //

fn select(cx: &mut Context) -> Result<()> {
    cx.doc.cursor.select();
    Ok(())
}

fn deselect(cx: &mut Context) -> Result<()> {
    cx.doc.cursor.selection_mut().clear();
    Ok(())
}

fn next_selected(cx: &mut Context) -> Result<()> {
    let target = cx
        .doc
        .cursor
        .selection()
        .next_after(cx.doc.cursor.path())
        .cloned()
        .ok_or(EditError::NoSibling)?;
    cx.doc.tree.resolve(&target)?;
    cx.doc.cursor.jump(target);
    Ok(())
}

fn prev_selected(cx: &mut Context) -> Result<()> {
    let target = cx
        .doc
        .cursor
        .selection()
        .prev_before(cx.doc.cursor.path())
        .cloned()
        .ok_or(EditError::NoSibling)?;
    cx.doc.tree.resolve(&target)?;
    cx.doc.cursor.jump(target);
    Ok(())
}

// Marks //

fn mark(cx: &mut Context) -> Result<()> {
    let path = cx.cursor_path();
    cx.marks.push(path);
    Ok(())
}

fn goto_mark(cx: &mut Context) -> Result<()> {
    let path = cx.marks.last().cloned().ok_or(EditError::NoMark)?;
    cx.doc.tree.resolve(&path).map_err(|_| EditError::NoMark)?;
    cx.doc.cursor.jump(path);
    Ok(())
}

fn unmark(cx: &mut Context) -> Result<()> {
    cx.marks.pop().map(|_| ()).ok_or(EditError::NoMark)
}

// Editing //

fn delete(cx: &mut Context) -> Result<()> {
    let path = cx.cursor_path();
    if cx.doc.tree.is_hole(cx.cursor_node()?) {
        return Ok(());
    }
    replace_with(&mut cx.doc.tree, &path, &Subtree::hole())?;
    cx.doc.cursor.jump(path);
    Ok(())
}

fn clear(cx: &mut Context) -> Result<()> {
    let path = cx.cursor_path();
    cx.doc.tree.clear(&path)?;
    cx.doc.cursor.jump(path);
    Ok(())
}

fn unwrap(cx: &mut Context) -> Result<()> {
    let path = cx.cursor_path();
    let spliced = cx.doc.tree.unwrap(&path)?;
    if spliced > 0 {
        cx.doc.cursor.jump(path);
    } else {
        let (parent, _) = parent_and_index(&path)?;
        cx.doc.cursor.jump(parent);
    }
    Ok(())
}

/// `"T" create`: rebuild the current node as a `T`, keeping its children.
fn create(cx: &mut Context) -> Result<()> {
    let name = cx.pop_str("create")?;
    let path = cx.cursor_path();
    let old = cx.doc.tree.subtree(cx.cursor_node()?);
    let lang = cx.doc.tree.language().clone();
    let cannot_host = || {
        EditError::SchemaViolation(format!(
            "'{name}' cannot hold the {} children of '{}'",
            old.children.len(),
            old.construct
        ))
    };
    let new = match lang.arity(&name)? {
        Arity::Text => {
            if !old.children.is_empty() {
                return Err(cannot_host());
            }
            Subtree::text(name.as_str(), old.text.clone().unwrap_or_default())
        }
        Arity::Flexible(_) => Subtree::branch(name.as_str(), old.children.clone()),
        Arity::Fixed(sorts) => {
            if old.children.len() > sorts.len() {
                return Err(cannot_host());
            }
            let mut children = old.children.clone();
            children.resize_with(sorts.len(), Subtree::hole);
            Subtree::branch(name.as_str(), children)
        }
    };
    replace_with(&mut cx.doc.tree, &path, &new)?;
    cx.doc.cursor.jump(path);
    Ok(())
}

fn insert_sibling(cx: &mut Context, offset: usize) -> Result<()> {
    let (parent, index) = parent_and_index(cx.doc.cursor.path())?;
    let index = index + offset;
    graft(&mut cx.doc.tree, &Subtree::hole(), |tree, node| {
        tree.insert_child(&parent, index, node)
    })?;
    cx.doc.cursor.jump(parent.child(index));
    Ok(())
}

fn insert_left_sibling(cx: &mut Context) -> Result<()> {
    insert_sibling(cx, 0)
}

fn insert_right_sibling(cx: &mut Context) -> Result<()> {
    insert_sibling(cx, 1)
}

fn insert_child(cx: &mut Context) -> Result<()> {
    let path = cx.cursor_path();
    let index = cx.doc.tree.children(cx.cursor_node()?).len();
    graft(&mut cx.doc.tree, &Subtree::hole(), |tree, node| {
        tree.insert_child(&path, index, node)
    })?;
    cx.doc.cursor.jump(path.child(index));
    Ok(())
}

/// `"T" insert-parent`: wrap the current node in a new `T`.
fn insert_parent(cx: &mut Context) -> Result<()> {
    let name = cx.pop_str("insert-parent")?;
    let path = cx.cursor_path();
    let old = cx.doc.tree.subtree(cx.cursor_node()?);
    let lang = cx.doc.tree.language().clone();
    let (wrapper, slot) = match lang.arity(&name)? {
        Arity::Flexible(_) => (Subtree::branch(name.as_str(), vec![old]), 0),
        Arity::Fixed(sorts) => {
            let slot = sorts
                .iter()
                .position(|sort| lang.fits(&old.construct, sort))
                .ok_or_else(|| {
                    EditError::SchemaViolation(format!(
                        "'{name}' has no slot for '{}'",
                        old.construct
                    ))
                })?;
            let children = (0..sorts.len())
                .map(|index| if index == slot { old.clone() } else { Subtree::hole() })
                .collect();
            (Subtree::branch(name.as_str(), children), slot)
        }
        Arity::Text => {
            return Err(EditError::SchemaViolation(format!(
                "text construct '{name}' cannot have children"
            )));
        }
    };
    replace_with(&mut cx.doc.tree, &path, &wrapper)?;
    cx.doc.cursor.jump(path.child(slot));
    Ok(())
}

/// Cut the current node out of its parent; the cursor moves to the parent.
fn detach_current(cx: &mut Context) -> Result<Subtree> {
    let (parent, index) = parent_and_index(cx.doc.cursor.path())?;
    let node = cx.doc.tree.remove_child(&parent, index)?;
    let value = cx.doc.tree.detach(node)?;
    cx.doc.cursor.ascend_to(parent, index);
    Ok(value)
}

fn remove(cx: &mut Context) -> Result<()> {
    detach_current(cx).map(|_| ())
}

/// Remove the current node if it is a flexible node with no children left.
fn dissolve(cx: &mut Context) -> Result<()> {
    let node = cx.cursor_node()?;
    let construct = cx.doc.tree.construct(node);
    if !cx.doc.tree.language().is_flexible(construct) || !cx.doc.tree.children(node).is_empty() {
        return Err(EditError::SchemaViolation(format!(
            "'{construct}' is not an empty flexible node"
        )));
    }
    remove(cx)
}

fn take(cx: &mut Context) -> Result<()> {
    let value = detach_current(cx)?;
    cx.stack.push(Value::Tree(value));
    Ok(())
}

fn put(cx: &mut Context) -> Result<()> {
    with_popped_tree(cx, "put", |cx, value| {
        let path = cx.cursor_path();
        replace_with(&mut cx.doc.tree, &path, value)?;
        cx.doc.cursor.jump(path);
        Ok(())
    })
}

fn put_sibling(cx: &mut Context, command: &str, offset: usize) -> Result<()> {
    with_popped_tree(cx, command, |cx, value| {
        let (parent, index) = parent_and_index(cx.doc.cursor.path())?;
        let index = index + offset;
        graft(&mut cx.doc.tree, value, |tree, node| {
            tree.insert_child(&parent, index, node)
        })?;
        cx.doc.cursor.jump(parent.child(index));
        Ok(())
    })
}

fn put_left(cx: &mut Context) -> Result<()> {
    put_sibling(cx, "put-left", 0)
}

fn put_right(cx: &mut Context) -> Result<()> {
    put_sibling(cx, "put-right", 1)
}

fn put_last(cx: &mut Context) -> Result<()> {
    with_popped_tree(cx, "put-last", |cx, value| {
        let path = cx.cursor_path();
        let index = cx.doc.tree.children(cx.cursor_node()?).len();
        graft(&mut cx.doc.tree, value, |tree, node| {
            tree.insert_child(&path, index, node)
        })?;
        cx.doc.cursor.jump(path.child(index));
        Ok(())
    })
}

/// Push an empty node of the current node's construct.
fn shell(cx: &mut Context) -> Result<()> {
    let node = cx.cursor_node()?;
    let construct = cx.doc.tree.construct(node).to_string();
    let value = match cx.doc.tree.language().arity(&construct)? {
        Arity::Text => Subtree::text(construct, ""),
        Arity::Flexible(_) => Subtree::branch(construct, Vec::new()),
        Arity::Fixed(sorts) if sorts.is_empty() => Subtree::branch(construct, Vec::new()),
        Arity::Fixed(_) => {
            return Err(EditError::SchemaViolation(format!(
                "'{construct}' has a fixed arity and has no empty form"
            )));
        }
    };
    cx.stack.push(Value::Tree(value));
    Ok(())
}

fn drop_value(cx: &mut Context) -> Result<()> {
    cx.pop("drop").map(|_| ())
}

// Clipboard //

fn copy(cx: &mut Context) -> Result<()> {
    let slot = cx.clip_slot("copy")?.unwrap_or(0);
    let selection = cx.doc.cursor.selection();
    let value = if selection.is_empty() {
        ClipValue::Single(cx.doc.tree.subtree(cx.cursor_node()?))
    } else {
        let mut items = selection
            .paths()
            .map(|path| Ok(cx.doc.tree.subtree(cx.doc.tree.resolve(path)?)))
            .collect::<Result<Vec<_>>>()?;
        if items.len() == 1 {
            ClipValue::Single(items.remove(0))
        } else {
            ClipValue::Splice(items)
        }
    };
    cx.clipboard.push(slot, value)
}

/// Insert the items of `value` at the cursor: over a hole, or to the right
/// of the current node. The cursor lands on the first pasted node.
fn place(cx: &mut Context, value: &ClipValue) -> Result<()> {
    cx.transact(|cx| {
        let path = cx.cursor_path();
        let items = value.items();
        let on_hole = cx.doc.tree.is_hole(cx.cursor_node()?);
        let (rest, first_path) = if on_hole {
            let (first, rest) = items.split_first().ok_or(EditError::ClipboardEmpty(0))?;
            replace_with(&mut cx.doc.tree, &path, first)?;
            (rest, path.clone())
        } else {
            let (_, index) = parent_and_index(&path)?;
            (items, path.sibling(index + 1))
        };
        if !rest.is_empty() {
            let (parent, index) = parent_and_index(&path)?;
            for (offset, item) in rest.iter().enumerate() {
                let at = index + 1 + offset;
                graft(&mut cx.doc.tree, item, |tree, node| {
                    tree.insert_child(&parent, at, node)
                })?;
            }
        }
        cx.doc.cursor.jump(first_path);
        Ok(())
    })
}

/// `n paste`. Repeating the same top-level paste command swaps the
/// previous paste for the next-older entry of the slot.
fn paste(cx: &mut Context) -> Result<()> {
    let explicit = cx.clip_slot("paste")?;
    let cycle = cx
        .paste
        .take()
        .filter(|cycle| cycle.serial < cx.serial && explicit.is_none_or(|slot| slot == cycle.slot));

    let Some(mut cycle) = cycle else {
        let slot = explicit.unwrap_or(0);
        let before = cx.doc.clone();
        let stack = cx.clipboard.stack(slot).to_vec();
        let value = cx.clipboard.pop(slot)?;
        if let Err(err) = place(cx, &value) {
            cx.clipboard.push(slot, value)?;
            return Err(err);
        }
        cx.paste = Some(PasteCycle {
            slot,
            depth: 0,
            before,
            stack,
            serial: cx.serial,
        });
        return Ok(());
    };

    let depth = (cycle.depth + 1) % cycle.stack.len().max(1);
    debug!(slot = cycle.slot, depth, "paste: cycling");
    let current = std::mem::replace(&mut cx.doc, cycle.before.clone());
    let slot_now = cx.clipboard.stack(cycle.slot).to_vec();
    cx.clipboard.restore(cycle.slot, cycle.stack.clone())?;
    let placed = cx
        .clipboard
        .take_at(cycle.slot, depth)
        .and_then(|value| place(cx, &value));
    // On failure the next repeat still moves past the entry that did not fit.
    cycle.depth = depth;
    if let Err(err) = placed {
        cx.doc = current;
        cx.clipboard.restore(cycle.slot, slot_now)?;
        cx.paste = Some(cycle);
        return Err(err);
    }
    cycle.serial = cx.serial;
    cx.paste = Some(cycle);
    Ok(())
}

// Macros //

fn define_macro(cx: &mut Context) -> Result<()> {
    let slot = cx.pop_slot("define-macro")?;
    debug!(slot = %slot, "recording macro");
    cx.recorder.start(slot);
    Ok(())
}

fn set_macro(cx: &mut Context) -> Result<()> {
    let slot = cx.pop_slot("set-macro")?;
    let body = cx.pop_quote("set-macro")?;
    cx.macros.set(slot, body);
    Ok(())
}

fn run_macro(cx: &mut Context) -> Result<()> {
    let slot = cx.pop_slot("run-macro")?;
    let body = cx.macros.get(slot).ok_or(EditError::NoMacro(slot))?.to_vec();
    cx.nested(&body)
}

// History //

fn undo(cx: &mut Context) -> Result<()> {
    let record = cx.history.undo(&mut cx.doc)?;
    debug!(command = %record.command, "undo");
    cx.touched_history = true;
    Ok(())
}

fn redo(cx: &mut Context) -> Result<()> {
    let record = cx.history.redo(&mut cx.doc)?;
    debug!(command = %record.command, "redo");
    cx.touched_history = true;
    Ok(())
}

// Search //

/// `"query" search`: select every match and move to the next one after
/// the cursor, wrapping around.
fn search(cx: &mut Context) -> Result<()> {
    let query = cx.pop_str("search")?;
    let selection = cx.searcher.search(&query, &cx.doc)?;
    let here = cx.doc.cursor.path();
    let target = selection
        .next_after(here)
        .or_else(|| selection.paths().next())
        .cloned()
        .ok_or_else(|| EditError::NotFound(query.clone()))?;
    *cx.doc.cursor.selection_mut() = selection;
    cx.doc.cursor.jump(target);
    Ok(())
}
