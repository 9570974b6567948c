use std::sync::Arc;

use super::path::Path;
use super::schema::{Arity, HOLE, Language};
use super::subtree::Subtree;
use crate::error::{EditError, Result};

/// Index of a node slot in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    construct: String,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// The Tree Store: an arena of nodes linked by parent/child indices.
///
/// Besides the document itself the arena may hold *orphans*: parent-less
/// nodes created by [`Tree::adopt`] or cut loose by [`Tree::remove_child`]
/// and [`Tree::replace`]. Orphans can be inserted elsewhere or turned back
/// into owned values with [`Tree::detach`].
///
/// Cloning a tree is how the interpreter takes snapshots.
#[derive(Debug, Clone)]
pub struct Tree {
    lang: Arc<Language>,
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
    revision: u64,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.to_subtree() == other.to_subtree()
    }
}

impl Eq for Tree {}

impl Tree {
    /// Build a tree from a document value, checking it against `lang`.
    pub fn new(lang: Arc<Language>, root: &Subtree) -> Result<Self> {
        if !lang.fits_root(&root.construct) {
            return Err(EditError::SchemaViolation(format!(
                "'{}' cannot be the root of a {} document",
                root.construct,
                lang.name()
            )));
        }
        lang.check_subtree(root)?;
        let mut tree = Self {
            lang,
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            revision: 0,
        };
        tree.root = tree.build(root);
        Ok(tree)
    }

    /// A document holding nothing but an empty root construct.
    pub fn empty(lang: Arc<Language>) -> Result<Self> {
        let root = lang.empty_node(lang.root())?;
        Self::new(lang, &root)
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.lang
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Counter bumped by every successful mutation.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    // Reading //

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0]
            .as_ref()
            .unwrap_or_else(|| panic!("tree: node {} was freed", id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0]
            .as_mut()
            .unwrap_or_else(|| panic!("tree: node {} was freed", id.0))
    }

    pub fn construct(&self, id: NodeId) -> &str {
        &self.node(id).construct
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn is_hole(&self, id: NodeId) -> bool {
        self.node(id).construct == HOLE
    }

    /// Resolve a path from the root.
    pub fn resolve(&self, path: &Path) -> Result<NodeId> {
        let mut id = self.root;
        for &index in path.indices() {
            id = *self
                .node(id)
                .children
                .get(index)
                .ok_or_else(|| EditError::InvalidPath(path.clone()))?;
        }
        Ok(id)
    }

    /// Path of a node that belongs to the document.
    pub fn path_of(&self, id: NodeId) -> Path {
        let mut indices = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let index = self
                .node(parent)
                .children
                .iter()
                .position(|&c| c == current)
                .unwrap_or_default();
            indices.push(index);
            current = parent;
        }
        indices.reverse();
        Path::from(indices)
    }

    /// Owned copy of the subtree rooted at `id`.
    pub fn subtree(&self, id: NodeId) -> Subtree {
        let node = self.node(id);
        Subtree {
            construct: node.construct.clone(),
            text: node.text.clone(),
            children: node.children.iter().map(|&c| self.subtree(c)).collect(),
        }
    }

    /// Owned copy of the whole document.
    pub fn to_subtree(&self) -> Subtree {
        self.subtree(self.root)
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.to_subtree().node_count()
    }

    /// A tree always has at least its root.
    pub const fn is_empty(&self) -> bool {
        false
    }

    // Orphans //

    /// Copy a value into the arena as an orphan, checking it first.
    pub fn adopt(&mut self, tree: &Subtree) -> Result<NodeId> {
        self.lang.check_subtree(tree)?;
        Ok(self.build(tree))
    }

    /// Remove an orphan from the arena and return it as a value.
    pub fn detach(&mut self, id: NodeId) -> Result<Subtree> {
        self.ensure_orphan(id)?;
        let tree = self.subtree(id);
        self.free_subtree(id);
        Ok(tree)
    }

    fn ensure_orphan(&self, id: NodeId) -> Result<()> {
        if id == self.root || self.node(id).parent.is_some() {
            return Err(EditError::AlreadyOwned);
        }
        Ok(())
    }

    fn build(&mut self, tree: &Subtree) -> NodeId {
        let children: Vec<NodeId> = tree.children.iter().map(|c| self.build(c)).collect();
        let id = self.alloc(Node {
            construct: tree.construct.clone(),
            text: tree.text.clone(),
            children: children.clone(),
            parent: None,
        });
        for child in children {
            self.node_mut(child).parent = Some(id);
        }
        id
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Some(node);
            NodeId(slot)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes[id.0].take() {
            self.free.push(id.0);
            for child in node.children {
                self.free_subtree(child);
            }
        }
    }

    // Mutation //

    /// Replace the node at `path` with the orphan `node`.
    ///
    /// Returns the old node, now an orphan.
    pub fn replace(&mut self, path: &Path, node: NodeId) -> Result<NodeId> {
        let old = self.resolve(path)?;
        self.ensure_orphan(node)?;
        let construct = self.node(node).construct.clone();
        match self.node(old).parent {
            None => {
                if !self.lang.fits_root(&construct) {
                    return Err(EditError::SchemaViolation(format!(
                        "'{construct}' cannot be the document root"
                    )));
                }
                self.root = node;
            }
            Some(parent) => {
                let index = path.last().unwrap_or_default();
                self.check_slot(parent, index, &construct)?;
                self.node_mut(parent).children[index] = node;
                self.node_mut(node).parent = Some(parent);
                self.node_mut(old).parent = None;
            }
        }
        self.revision += 1;
        Ok(old)
    }

    /// Insert the orphan `node` as child `index` of the node at `parent_path`.
    pub fn insert_child(&mut self, parent_path: &Path, index: usize, node: NodeId) -> Result<()> {
        let parent = self.resolve(parent_path)?;
        if index > self.node(parent).children.len() {
            return Err(EditError::InvalidPath(parent_path.child(index)));
        }
        self.ensure_orphan(node)?;
        self.ensure_flexible(parent)?;
        let construct = self.node(node).construct.clone();
        self.check_slot(parent, index, &construct)?;
        self.node_mut(parent).children.insert(index, node);
        self.node_mut(node).parent = Some(parent);
        self.revision += 1;
        Ok(())
    }

    /// Remove child `index` of the node at `parent_path`, returning it as an
    /// orphan.
    pub fn remove_child(&mut self, parent_path: &Path, index: usize) -> Result<NodeId> {
        let parent = self.resolve(parent_path)?;
        let child = *self
            .node(parent)
            .children
            .get(index)
            .ok_or_else(|| EditError::InvalidPath(parent_path.child(index)))?;
        self.ensure_flexible(parent)?;
        self.node_mut(parent).children.remove(index);
        self.node_mut(child).parent = None;
        self.revision += 1;
        Ok(child)
    }

    /// Replace the node at `path` by its own children, spliced into its
    /// parent at its position. Returns how many children were spliced.
    pub fn unwrap(&mut self, path: &Path) -> Result<usize> {
        let id = self.resolve(path)?;
        let parent = self.node(id).parent.ok_or(EditError::AtRoot)?;
        self.ensure_flexible(parent)?;
        let index = path.last().unwrap_or_default();
        let children = self.node(id).children.clone();
        for &child in &children {
            let construct = self.node(child).construct.clone();
            self.check_slot(parent, index, &construct)?;
        }
        let count = children.len();
        let siblings = &mut self.node_mut(parent).children;
        siblings.remove(index);
        for (offset, &child) in children.iter().enumerate() {
            siblings.insert(index + offset, child);
        }
        for &child in &children {
            self.node_mut(child).parent = Some(parent);
        }
        self.node_mut(id).children.clear();
        self.free_subtree(id);
        self.revision += 1;
        Ok(count)
    }

    /// Remove every child of the node at `path`; text nodes lose their text.
    pub fn clear(&mut self, path: &Path) -> Result<()> {
        let id = self.resolve(path)?;
        let construct = self.node(id).construct.clone();
        match self.lang.arity(&construct)? {
            Arity::Text => {
                self.node_mut(id).text = Some(String::new());
            }
            Arity::Flexible(_) => {
                let children = std::mem::take(&mut self.node_mut(id).children);
                for child in children {
                    self.node_mut(child).parent = None;
                    self.free_subtree(child);
                }
            }
            Arity::Fixed(sorts) => {
                if !sorts.is_empty() {
                    return Err(EditError::SchemaViolation(format!(
                        "'{construct}' has a fixed arity and cannot be cleared"
                    )));
                }
            }
        }
        self.revision += 1;
        Ok(())
    }

    /// Free an orphan and everything below it.
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        self.ensure_orphan(id)?;
        self.free_subtree(id);
        Ok(())
    }

    fn ensure_flexible(&self, id: NodeId) -> Result<()> {
        let construct = &self.node(id).construct;
        if self.lang.is_flexible(construct) {
            Ok(())
        } else {
            Err(EditError::SchemaViolation(format!(
                "'{construct}' does not take a variable number of children"
            )))
        }
    }

    fn check_slot(&self, parent: NodeId, index: usize, child: &str) -> Result<()> {
        let parent_construct = &self.node(parent).construct;
        let sort = self
            .lang
            .slot_sort(parent_construct, index)
            .ok_or_else(|| {
                EditError::SchemaViolation(format!("'{parent_construct}' has no slot {index}"))
            })?;
        if self.lang.fits(child, &sort) {
            Ok(())
        } else {
            Err(EditError::SchemaViolation(format!(
                "'{child}' cannot be placed under '{parent_construct}' (expects {sort})"
            )))
        }
    }

    /// Check parent links and the schema for every node in the document.
    pub fn validate(&self) -> Result<()> {
        if self.node(self.root).parent.is_some() {
            return Err(EditError::AlreadyOwned);
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            for &child in &node.children {
                if self.node(child).parent != Some(id) {
                    return Err(EditError::AlreadyOwned);
                }
                stack.push(child);
            }
        }
        self.lang.check_subtree(&self.to_subtree())
    }
}
