use crate::error::{EditError, Result};
use crate::tree::Subtree;

/// Number of addressable clipboard slots (`0`–`9`).
pub const SLOT_COUNT: usize = 10;

/// A detached value held in a clipboard slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipValue {
    /// One subtree, pasted as one node.
    Single(Subtree),
    /// Several sibling subtrees, pasted side by side.
    Splice(Vec<Subtree>),
}

impl ClipValue {
    /// The subtrees this value pastes, in order.
    pub fn items(&self) -> &[Subtree] {
        match self {
            Self::Single(tree) => std::slice::from_ref(tree),
            Self::Splice(trees) => trees,
        }
    }
}

/// Ten stacks of detached subtrees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    slots: [Vec<ClipValue>; SLOT_COUNT],
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn stack_mut(&mut self, slot: u8) -> Result<&mut Vec<ClipValue>> {
        self.slots
            .get_mut(usize::from(slot))
            .ok_or(EditError::ClipboardEmpty(slot))
    }

    /// Push onto the top of `slot`.
    pub fn push(&mut self, slot: u8, value: ClipValue) -> Result<()> {
        self.stack_mut(slot)?.push(value);
        Ok(())
    }

    /// Pop the top of `slot`.
    pub fn pop(&mut self, slot: u8) -> Result<ClipValue> {
        self.stack_mut(slot)?
            .pop()
            .ok_or(EditError::ClipboardEmpty(slot))
    }

    /// Remove the entry `depth` levels below the top of `slot`.
    pub fn take_at(&mut self, slot: u8, depth: usize) -> Result<ClipValue> {
        let stack = self.stack_mut(slot)?;
        if depth >= stack.len() {
            return Err(EditError::ClipboardEmpty(slot));
        }
        let index = stack.len() - 1 - depth;
        Ok(stack.remove(index))
    }

    /// Entries of `slot`, bottom first.
    pub fn stack(&self, slot: u8) -> &[ClipValue] {
        self.slots
            .get(usize::from(slot))
            .map_or(&[], Vec::as_slice)
    }

    /// Overwrite the whole stack of `slot`.
    pub fn restore(&mut self, slot: u8, entries: Vec<ClipValue>) -> Result<()> {
        *self.stack_mut(slot)? = entries;
        Ok(())
    }

    pub fn len(&self, slot: u8) -> usize {
        self.stack(slot).len()
    }

    pub fn is_empty(&self, slot: u8) -> bool {
        self.stack(slot).is_empty()
    }
}
