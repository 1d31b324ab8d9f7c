//! Iteration and visible-row navigation
//!
//! "Visible" means laid out: not hidden by compact mode and every visual
//! ancestor expanded. In flattened order the visual parent of a top-level
//! data node is the root, whatever categories hold it.

use crate::node::{NodeFlags, NodeId, NodeKind, PropertyNode};
use crate::tree::{PropertyTree, TreeOrder};

/// Ordering an iterator walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterOrder {
    /// Whatever ordering the tree currently displays
    #[default]
    Current,
    Categorized,
    Flat,
}

/// What a `NodeIter` yields
#[derive(Debug, Clone, Copy, Default)]
pub struct IterSpec {
    pub order: IterOrder,
    /// Skip category nodes
    pub data_only: bool,
    /// Descend into children of fixed and dynamic parents
    pub recurse_parents: bool,
    /// Skip hidden nodes and children of collapsed nodes
    pub visible_only: bool,
}

impl IterSpec {
    /// Every node in the current ordering, aggregate children included
    pub fn all() -> Self {
        Self {
            recurse_parents: true,
            ..Self::default()
        }
    }

    /// Property nodes only, aggregate children included
    pub fn properties() -> Self {
        Self {
            data_only: true,
            recurse_parents: true,
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: IterOrder) -> Self {
        self.order = order;
        self
    }

    pub fn visible(mut self) -> Self {
        self.visible_only = true;
        self
    }

    pub fn top_level_only(mut self) -> Self {
        self.recurse_parents = false;
        self
    }
}

/// Lazy pre-order walk; `restart` rewinds it
pub struct NodeIter<'a> {
    tree: &'a PropertyTree,
    spec: IterSpec,
    stack: Vec<NodeId>,
}

impl<'a> NodeIter<'a> {
    fn new(tree: &'a PropertyTree, spec: IterSpec) -> Self {
        let mut iter = Self {
            tree,
            spec,
            stack: Vec::new(),
        };
        iter.restart();
        iter
    }

    pub fn restart(&mut self) {
        let order = match self.spec.order {
            IterOrder::Current => self.tree.order(),
            IterOrder::Categorized => TreeOrder::Categorized,
            IterOrder::Flat => TreeOrder::Flat,
        };
        let tree = self.tree;
        let tops = match order {
            TreeOrder::Categorized => tree.nodes[tree.root].children.as_slice(),
            TreeOrder::Flat => tree.flat.as_slice(),
        };
        self.stack.clear();
        self.stack.extend(tops.iter().rev().copied());
    }
}

impl Iterator for NodeIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let Some(node) = self.tree.nodes.get(id) else {
                continue;
            };
            if self.spec.visible_only && self.tree.is_hidden(id) {
                continue;
            }
            let descend = match node.kind {
                NodeKind::Category => true,
                NodeKind::FixedParent | NodeKind::DynamicParent => self.spec.recurse_parents,
                _ => false,
            };
            if descend && (node.expanded || !self.spec.visible_only) {
                self.stack.extend(node.children.iter().rev().copied());
            }
            if self.spec.data_only && node.kind == NodeKind::Category {
                continue;
            }
            return Some(id);
        }
        None
    }
}

impl PropertyTree {
    pub fn iter(&self, spec: IterSpec) -> NodeIter<'_> {
        NodeIter::new(self, spec)
    }

    /// Hidden by compact mode
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.compact && self.nodes.get(id).is_some_and(|n| n.flags.contains(NodeFlags::HIDEABLE))
    }

    /// Parent in the active ordering
    pub fn visual_parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        match (self.order, node.flat_index) {
            (TreeOrder::Flat, Some(_)) => Some(self.root),
            _ => node.parent,
        }
    }

    /// Sibling list in the active ordering and the node's index in it
    fn siblings(&self, id: NodeId) -> (&[NodeId], usize) {
        let Some(node) = self.nodes.get(id) else {
            return (&[], 0);
        };
        match (self.order, node.flat_index) {
            (TreeOrder::Flat, Some(i)) => (&self.flat, i),
            _ => match node.parent {
                Some(p) => (&self.nodes[p].children, node.index_in_parent),
                None => (&[], 0),
            },
        }
    }

    fn shows_children(&self, node: &PropertyNode) -> bool {
        node.kind != NodeKind::Root && node.expanded && !node.children.is_empty()
    }

    fn first_shown(&self, ids: &[NodeId]) -> Option<NodeId> {
        ids.iter().copied().find(|&n| !self.is_hidden(n))
    }

    fn last_shown(&self, ids: &[NodeId]) -> Option<NodeId> {
        ids.iter().rev().copied().find(|&n| !self.is_hidden(n))
    }

    fn deepest_last(&self, mut id: NodeId) -> NodeId {
        loop {
            let node = &self.nodes[id];
            if !self.shows_children(node) {
                return id;
            }
            match self.last_shown(&node.children) {
                Some(child) => id = child,
                None => return id,
            }
        }
    }

    pub fn first_visible(&self) -> Option<NodeId> {
        self.first_shown(self.top_level())
    }

    pub fn last_visible(&self) -> Option<NodeId> {
        self.last_shown(self.top_level())
            .map(|id| self.deepest_last(id))
    }

    /// Next laid-out row after `id`, stepping into expanded children and out
    /// of finished subtrees.
    pub fn next_visible(&self, id: NodeId) -> Option<NodeId> {
        if id == self.root {
            return self.first_visible();
        }
        let node = self.nodes.get(id)?;
        if self.shows_children(node) {
            if let Some(child) = self.first_shown(&node.children) {
                return Some(child);
            }
        }
        let mut current = id;
        loop {
            let (siblings, index) = self.siblings(current);
            if let Some(next) = self.first_shown(siblings.get(index + 1..).unwrap_or(&[])) {
                return Some(next);
            }
            let parent = self.visual_parent(current)?;
            if parent == self.root {
                return None;
            }
            current = parent;
        }
    }

    /// Laid-out row before `id`
    pub fn prev_visible(&self, id: NodeId) -> Option<NodeId> {
        if id == self.root || !self.nodes.contains_key(id) {
            return None;
        }
        let (siblings, index) = self.siblings(id);
        if let Some(prev) = self.last_shown(siblings.get(..index).unwrap_or(&[])) {
            return Some(self.deepest_last(prev));
        }
        self.visual_parent(id).filter(|&p| p != self.root)
    }

    /// Visual ancestors of `id`, nearest first, root excluded
    pub fn visual_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = id;
        while let Some(parent) = self.visual_parent(current) {
            if parent == self.root {
                break;
            }
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Whether `id` currently occupies a row
    pub fn is_laid_out(&self, id: NodeId) -> bool {
        if id == self.root || !self.nodes.contains_key(id) || self.is_hidden(id) {
            return false;
        }
        if self.order == TreeOrder::Flat
            && self.nodes[id].kind == NodeKind::Category
        {
            return false;
        }
        let mut current = id;
        while let Some(parent) = self.visual_parent(current) {
            if parent == self.root {
                return true;
            }
            if !self.nodes[parent].expanded || self.is_hidden(parent) {
                return false;
            }
            current = parent;
        }
        false
    }
}
