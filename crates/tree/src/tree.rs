//! Property tree
//!
//! Arena of `PropertyNode`s with two orderings over the same node set: the
//! categorized hierarchy (`parent`/`children`) and a flattened list holding
//! the top-level data nodes with categories dissolved. Every change that can
//! move rows bumps `generation`, which is what layout caches key on.
//!
//! Inserts are validated in full before anything is attached, so a rejected
//! insert leaves the tree untouched.

use std::sync::Arc;

use ahash::AHashMap as HashMap;
use slotmap::SlotMap;

use crate::choices::ChoiceSet;
use crate::error::{GridError, Result};
use crate::node::{Attributes, NodeFlags, NodeId, NodeKind, NodeSpec, PropertyNode};
use crate::value::{ValueKind, Variant};
use crate::value_type::{ValueTypeRegistry, CATEGORY_TAG};

/// Which sibling ordering drives display and navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeOrder {
    #[default]
    Categorized,
    Flat,
}

/// Scope a spec is validated against
struct Scope {
    kind: NodeKind,
    sealed: bool,
    key: String,
}

pub struct PropertyTree {
    pub(crate) nodes: SlotMap<NodeId, PropertyNode>,
    pub(crate) root: NodeId,
    /// Scoped key -> node
    pub(crate) names: HashMap<String, NodeId>,
    /// Flattened ordering of top-level data nodes
    pub(crate) flat: Vec<NodeId>,
    pub(crate) order: TreeOrder,
    pub(crate) compact: bool,
    generation: u64,
    types: Arc<ValueTypeRegistry>,
}

impl PropertyTree {
    pub fn new(types: Arc<ValueTypeRegistry>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(PropertyNode {
            label: String::new(),
            name: String::new(),
            value: Variant::Str(String::new()),
            value_type: CATEGORY_TAG.to_string(),
            flags: NodeFlags::empty(),
            choices: None,
            kind: NodeKind::Root,
            editor: None,
            help: None,
            attributes: Attributes::default(),
            parent: None,
            children: Vec::new(),
            index_in_parent: 0,
            depth: 0,
            cached_top_y: None,
            background: 0,
            expanded: true,
            sealed: false,
            key: String::new(),
            flat_index: None,
        });
        Self {
            nodes,
            root,
            names: HashMap::new(),
            flat: Vec::new(),
            order: TreeOrder::Categorized,
            compact: false,
            generation: 0,
            types,
        }
    }

    // === Accessors ===

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn types(&self) -> &Arc<ValueTypeRegistry> {
        &self.types
    }

    /// Layout generation, bumped by anything that can move rows
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn order(&self) -> TreeOrder {
        self.order
    }

    pub fn is_categorized(&self) -> bool {
        self.order == TreeOrder::Categorized
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Number of nodes, not counting the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&PropertyNode> {
        self.nodes.get(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&PropertyNode> {
        self.nodes.get(id).ok_or(GridError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut PropertyNode> {
        self.nodes.get_mut(id).ok_or(GridError::UnknownNode(id))
    }

    /// Look up a node by scoped key (`Parent.Child` below aggregates)
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.names.get(key).copied()
    }

    /// Top-level data nodes in flattened order
    pub fn flat_order(&self) -> &[NodeId] {
        &self.flat
    }

    /// Root-level entries of the active ordering
    pub fn top_level(&self) -> &[NodeId] {
        match self.order {
            TreeOrder::Categorized => &self.nodes[self.root].children,
            TreeOrder::Flat => &self.flat,
        }
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    // === Structure ===

    /// Append `spec` as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId> {
        self.insert(parent, None, spec)
    }

    /// Insert `spec` (with its children) under `parent` at `index`, or at the
    /// end when `index` is `None`. A category whose name already exists in
    /// the scope is merged into the existing one, whose id is returned.
    pub fn insert(&mut self, parent: NodeId, index: Option<usize>, spec: NodeSpec) -> Result<NodeId> {
        let scope = {
            let p = self.node(parent)?;
            Scope {
                kind: p.kind,
                sealed: p.sealed,
                key: p.key.clone(),
            }
        };
        let mut pending = HashMap::new();
        if let Err(err) = self.check_spec(&scope, &spec, &mut pending) {
            log::warn!("insert under '{}' rejected: {}", scope.key, err);
            return Err(err);
        }

        let id = self.build(parent, index, spec);
        if scope.kind.is_aggregate() {
            self.recompose(parent);
            self.propagate_up(parent);
        }
        self.bump();
        log::debug!(
            "inserted '{}' (generation {})",
            self.nodes[id].key,
            self.generation
        );
        Ok(id)
    }

    fn scoped_key(parent_kind: NodeKind, parent_key: &str, name: &str) -> String {
        if parent_kind.is_aggregate() {
            format!("{}.{}", parent_key, name)
        } else {
            name.to_string()
        }
    }

    /// Validate a spec subtree without touching the tree
    fn check_spec(
        &self,
        scope: &Scope,
        spec: &NodeSpec,
        pending: &mut HashMap<String, NodeKind>,
    ) -> Result<()> {
        match (scope.kind, spec.kind) {
            (_, NodeKind::Root) => {
                return Err(GridError::StructuralViolation(
                    "a root node cannot be inserted".into(),
                ))
            }
            (NodeKind::Leaf, _) => {
                return Err(GridError::StructuralViolation(format!(
                    "'{}' is a leaf and cannot have children",
                    scope.key
                )))
            }
            (NodeKind::FixedParent, _) if scope.sealed => {
                return Err(GridError::StructuralViolation(format!(
                    "children of '{}' are fixed",
                    scope.key
                )))
            }
            (parent, NodeKind::Category) if !parent.is_grouping() => {
                return Err(GridError::StructuralViolation(format!(
                    "category '{}' must be placed under the root or a category",
                    spec.name
                )))
            }
            _ => {}
        }
        if spec.kind == NodeKind::Leaf && !spec.children.is_empty() {
            return Err(GridError::StructuralViolation(format!(
                "leaf '{}' cannot have children",
                spec.name
            )));
        }

        let value_type = self.types.lookup(&spec.value_type)?;
        if spec.kind.is_aggregate() && !value_type.is_aggregate() {
            return Err(GridError::StructuralViolation(format!(
                "value type '{}' of '{}' does not aggregate children",
                spec.value_type, spec.name
            )));
        }
        if let Some(value) = &spec.value {
            if value_type.construct(value.clone()).is_none() {
                return Err(GridError::Parse(format!(
                    "cannot store a {:?} value in '{}' ({})",
                    value.kind(),
                    spec.name,
                    spec.value_type
                )));
            }
        }

        let key = Self::scoped_key(scope.kind, &scope.key, &spec.name);
        let existing = self
            .names
            .get(&key)
            .map(|&id| (self.nodes[id].kind, self.nodes[id].sealed))
            .or_else(|| pending.get(&key).map(|&kind| (kind, false)));

        let child_scope = match existing {
            Some((NodeKind::Category, _)) if spec.kind == NodeKind::Category => Scope {
                kind: NodeKind::Category,
                sealed: false,
                key,
            },
            Some(_) => return Err(GridError::DuplicateName(key)),
            None => {
                pending.insert(key.clone(), spec.kind);
                Scope {
                    kind: spec.kind,
                    sealed: false,
                    key,
                }
            }
        };
        for child in &spec.children {
            self.check_spec(&child_scope, child, pending)?;
        }
        Ok(())
    }

    /// Attach a validated spec subtree
    fn build(&mut self, parent: NodeId, index: Option<usize>, spec: NodeSpec) -> NodeId {
        let (parent_kind, parent_depth, parent_flags, parent_background, parent_key) = {
            let p = &self.nodes[parent];
            (p.kind, p.depth, p.flags, p.background, p.key.clone())
        };
        let key = Self::scoped_key(parent_kind, &parent_key, &spec.name);

        if let Some(&existing) = self.names.get(&key) {
            // Category folding
            for child in spec.children {
                self.build(existing, None, child);
            }
            return existing;
        }

        let types = Arc::clone(&self.types);
        let value_type = types.get(&spec.value_type);
        let default = value_type.map_or(Variant::Str(String::new()), |t| t.default.clone());
        let has_value = spec.value.is_some();
        let value = match (spec.value, value_type) {
            (Some(v), Some(t)) => t.construct(v).unwrap_or(default),
            _ => default,
        };

        let goes_flat = spec.kind != NodeKind::Category && parent_kind.is_grouping();
        let depth = if goes_flat && self.order == TreeOrder::Flat {
            1
        } else {
            child_depth(parent_kind, parent_depth)
        };

        let kind = spec.kind;
        let id = self.nodes.insert(PropertyNode {
            label: spec.label,
            name: spec.name,
            value,
            value_type: spec.value_type,
            flags: spec.flags | (parent_flags & NodeFlags::HIDEABLE),
            choices: spec.choices,
            kind,
            editor: spec.editor,
            help: spec.help,
            attributes: spec.attributes,
            parent: Some(parent),
            children: Vec::new(),
            index_in_parent: 0,
            depth,
            cached_top_y: None,
            background: spec.background.unwrap_or(parent_background),
            expanded: spec.expanded,
            sealed: false,
            key: key.clone(),
            flat_index: None,
        });

        let children = &mut self.nodes[parent].children;
        let at = index.map_or(children.len(), |i| i.min(children.len()));
        children.insert(at, id);
        self.reindex_children(parent, at);
        self.names.insert(key, id);
        if goes_flat {
            self.nodes[id].flat_index = Some(self.flat.len());
            self.flat.push(id);
        }

        for child in spec.children {
            self.build(id, None, child);
        }
        if kind == NodeKind::FixedParent {
            self.nodes[id].sealed = true;
        }
        if kind.is_aggregate() {
            if has_value {
                self.push_down(id);
            } else {
                self.recompose(id);
            }
        }
        id
    }

    fn reindex_children(&mut self, parent: NodeId, from: usize) {
        let count = self.nodes[parent].children.len();
        for i in from..count {
            let child = self.nodes[parent].children[i];
            self.nodes[child].index_in_parent = i;
        }
    }

    fn reindex_flat(&mut self) {
        for i in 0..self.flat.len() {
            let id = self.flat[i];
            self.nodes[id].flat_index = Some(i);
        }
    }

    /// Pre-order ids of `id` and all its descendants
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// True when `id` is `ancestor` or lies below it
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes.get(n).and_then(|node| node.parent);
        }
        false
    }

    /// Whether `delete(id)` would be accepted. The root and the parts of a
    /// fixed aggregate cannot be removed.
    pub fn check_delete(&self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.kind == NodeKind::Root {
            return Err(GridError::StructuralViolation(
                "the root cannot be deleted".into(),
            ));
        }
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            if parent.kind == NodeKind::FixedParent && parent.sealed {
                return Err(GridError::StructuralViolation(format!(
                    "children of '{}' are fixed",
                    parent.key
                )));
            }
        }
        Ok(())
    }

    /// Remove a node and its whole subtree
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        self.check_delete(id)?;
        let node = self.node(id)?;
        let parent = node.parent;
        let index = node.index_in_parent;

        if let Some(parent) = parent {
            self.nodes[parent].children.remove(index);
            self.reindex_children(parent, index);
        }

        let mut flat_changed = false;
        for n in self.subtree(id) {
            if let Some(removed) = self.nodes.remove(n) {
                if self.names.get(&removed.key) == Some(&n) {
                    self.names.remove(&removed.key);
                }
                flat_changed |= removed.flat_index.is_some();
            }
        }
        if flat_changed {
            let nodes = &self.nodes;
            self.flat.retain(|n| nodes.contains_key(*n));
            self.reindex_flat();
        }

        if let Some(parent) = parent {
            if self.nodes[parent].kind.is_aggregate() {
                self.recompose(parent);
                self.propagate_up(parent);
            }
        }
        self.bump();
        log::debug!("deleted subtree at {:?} (generation {})", id, self.generation);
        Ok(())
    }

    /// Remove every node except the root
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|id, _| id == root);
        self.nodes[root].children.clear();
        self.names.clear();
        self.flat.clear();
        self.bump();
    }

    /// Change a node's name, rekeying it and any scoped descendants
    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<()> {
        let node = self.node(id)?;
        let parent = node.parent.ok_or_else(|| {
            GridError::StructuralViolation("the root has no name".into())
        })?;
        let parent_node = &self.nodes[parent];
        let new_key = Self::scoped_key(parent_node.kind, &parent_node.key, name);
        if new_key == node.key {
            return Ok(());
        }
        if self.names.contains_key(&new_key) {
            return Err(GridError::DuplicateName(new_key));
        }

        self.nodes[id].name = name.to_string();
        for n in self.subtree(id) {
            let Some(parent) = self.nodes[n].parent else {
                continue;
            };
            let (parent_kind, parent_key) = {
                let p = &self.nodes[parent];
                (p.kind, p.key.clone())
            };
            let node = &mut self.nodes[n];
            let key = Self::scoped_key(parent_kind, &parent_key, &node.name);
            let old = std::mem::replace(&mut node.key, key.clone());
            self.names.remove(&old);
            self.names.insert(key, n);
        }
        log::debug!("renamed {:?} to '{}'", id, name);
        Ok(())
    }

    pub fn set_label(&mut self, id: NodeId, label: &str) -> Result<()> {
        self.node_mut(id)?.label = label.to_string();
        Ok(())
    }

    pub fn set_help(&mut self, id: NodeId, help: Option<&str>) -> Result<()> {
        self.node_mut(id)?.help = help.map(str::to_string);
        Ok(())
    }

    pub fn set_editor(&mut self, id: NodeId, editor: Option<&str>) -> Result<()> {
        self.node_mut(id)?.editor = editor.map(str::to_string);
        Ok(())
    }

    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) -> Result<()> {
        self.node_mut(id)?.attributes.set(key, value);
        Ok(())
    }

    pub fn set_choices(&mut self, id: NodeId, choices: Option<ChoiceSet>) -> Result<()> {
        self.node_mut(id)?.choices = choices;
        Ok(())
    }

    /// Set or clear flags. `HIDEABLE` applies to the whole subtree.
    pub fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) -> Result<()> {
        self.node(id)?;
        let targets = if flag.contains(NodeFlags::HIDEABLE) {
            self.subtree(id)
        } else {
            vec![id]
        };
        for n in targets {
            self.nodes[n].flags.set(flag, on);
        }
        if flag.contains(NodeFlags::HIDEABLE) && self.compact {
            self.bump();
        }
        Ok(())
    }

    // === Ordering & visibility state ===

    /// Stable sort by label. `None` sorts every sibling group and the flat
    /// ordering. Aggregate children keep their order since the parent value
    /// is composed positionally. Uncategorized properties sort ahead of
    /// categories.
    pub fn sort(&mut self, target: Option<NodeId>) -> Result<()> {
        match target {
            None => {
                let groups: Vec<NodeId> = self
                    .subtree(self.root)
                    .into_iter()
                    .filter(|&n| self.nodes[n].kind.is_grouping())
                    .collect();
                for group in groups {
                    self.sort_children(group);
                }
                self.sort_flat();
            }
            Some(id) => {
                let kind = self.node(id)?.kind;
                if kind.is_grouping() {
                    self.sort_children(id);
                }
                if id == self.root {
                    self.sort_flat();
                }
            }
        }
        self.bump();
        Ok(())
    }

    fn sort_children(&mut self, id: NodeId) {
        let mut children = std::mem::take(&mut self.nodes[id].children);
        let nodes = &self.nodes;
        children.sort_by(|a, b| {
            let (a, b) = (&nodes[*a], &nodes[*b]);
            (a.is_category(), a.label.as_str()).cmp(&(b.is_category(), b.label.as_str()))
        });
        self.nodes[id].children = children;
        self.reindex_children(id, 0);
    }

    fn sort_flat(&mut self) {
        let nodes = &self.nodes;
        self.flat
            .sort_by(|a, b| nodes[*a].label.cmp(&nodes[*b].label));
        self.reindex_flat();
    }

    /// Expand or collapse. Returns whether anything changed; nodes without
    /// children never change.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<bool> {
        let node = self.node(id)?;
        if node.kind == NodeKind::Root || node.children.is_empty() || node.expanded == expanded {
            return Ok(false);
        }
        self.nodes[id].expanded = expanded;
        if !expanded {
            for n in self.subtree(id).into_iter().skip(1) {
                self.nodes[n].cached_top_y = None;
            }
        }
        self.bump();
        log::debug!(
            "{} {:?} (generation {})",
            if expanded { "expanded" } else { "collapsed" },
            id,
            self.generation
        );
        Ok(true)
    }

    /// Hide or show `HIDEABLE` nodes
    pub fn set_compact(&mut self, compact: bool) -> bool {
        if self.compact == compact {
            return false;
        }
        self.compact = compact;
        self.bump();
        true
    }

    /// Switch between categorized and flattened display. Depths are
    /// recomputed for the new ordering; nodes themselves are reused.
    pub fn switch_ordering(&mut self, order: TreeOrder) -> bool {
        if self.order == order {
            return false;
        }
        self.order = order;
        self.reindex_flat();
        self.assign_depths(self.root, 0);
        if order == TreeOrder::Flat {
            for i in 0..self.flat.len() {
                self.assign_depths(self.flat[i], 1);
            }
        }
        self.bump();
        log::debug!("switched to {:?} ordering", order);
        true
    }

    fn assign_depths(&mut self, start: NodeId, depth: u32) {
        let mut stack = vec![(start, depth)];
        while let Some((id, depth)) = stack.pop() {
            let node = &mut self.nodes[id];
            node.depth = depth;
            let below = child_depth(node.kind, depth);
            stack.extend(node.children.iter().map(|&c| (c, below)));
        }
    }

    /// Record where a node was laid out (layout space), `None` to forget
    pub fn set_cached_top(&mut self, id: NodeId, top: Option<f32>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.cached_top_y = top;
        }
    }

    /// Forget every recorded row position
    pub fn clear_cached_tops(&mut self) {
        for node in self.nodes.values_mut() {
            node.cached_top_y = None;
        }
    }

    // === Values ===

    /// Store a value, coercing it to the node's value type. Aggregate
    /// parents push the value down to their children; a changed child
    /// recomposes its aggregate ancestors.
    pub fn set_value(&mut self, id: NodeId, value: Variant) -> Result<()> {
        let node = self.node(id)?;
        if node.kind.is_grouping() {
            return Err(GridError::StructuralViolation(format!(
                "'{}' holds no value",
                node.key
            )));
        }
        let types = Arc::clone(&self.types);
        let value_type = types.lookup(&node.value_type)?;
        let found = value.kind();
        let Some(value) = value_type.construct(value) else {
            let err = GridError::TypeMismatch {
                node: id,
                expected: value_type.kind,
                found,
            };
            log::warn!("{}", err);
            return Err(err);
        };

        let node = &mut self.nodes[id];
        node.value = value;
        node.flags.remove(NodeFlags::UNSPECIFIED);
        if node.kind.is_aggregate() {
            self.push_down(id);
        }
        self.propagate_up(id);
        Ok(())
    }

    pub fn value(&self, id: NodeId) -> Option<&Variant> {
        self.nodes.get(id).map(|n| &n.value)
    }

    /// Value serialized with its type's codec
    pub fn format_value(&self, id: NodeId) -> Result<String> {
        let node = self.node(id)?;
        self.types.format(&node.value_type, &node.value)
    }

    pub fn get_int(&self, id: NodeId) -> i64 {
        self.typed(id, ValueKind::Int, Variant::as_int)
    }

    pub fn get_real(&self, id: NodeId) -> f64 {
        self.typed(id, ValueKind::Real, Variant::as_real)
    }

    pub fn get_bool(&self, id: NodeId) -> bool {
        self.typed(id, ValueKind::Bool, Variant::as_bool)
    }

    pub fn get_string(&self, id: NodeId) -> String {
        self.typed(id, ValueKind::Str, |v| v.as_str().map(str::to_string))
    }

    pub fn get_str_list(&self, id: NodeId) -> Vec<String> {
        self.typed(id, ValueKind::StrList, |v| v.as_str_list().map(<[String]>::to_vec))
    }

    /// Typed read; a mismatch is logged and yields the default
    fn typed<T: Default>(&self, id: NodeId, expected: ValueKind, read: impl Fn(&Variant) -> Option<T>) -> T {
        let Some(node) = self.nodes.get(id) else {
            log::warn!("{}", GridError::UnknownNode(id));
            return T::default();
        };
        read(&node.value).unwrap_or_else(|| {
            log::warn!(
                "{}",
                GridError::TypeMismatch {
                    node: id,
                    expected,
                    found: node.value.kind(),
                }
            );
            T::default()
        })
    }

    /// Flag the node and its aggregate ancestors as modified. Returns the
    /// topmost aggregate ancestor, or the node itself when it has none.
    pub fn mark_modified(&mut self, id: NodeId) -> Result<NodeId> {
        self.node_mut(id)?.flags.insert(NodeFlags::MODIFIED);
        let mut top = id;
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            let node = &mut self.nodes[parent];
            if !node.kind.is_aggregate() {
                break;
            }
            node.flags.insert(NodeFlags::MODIFIED);
            top = parent;
            current = node.parent;
        }
        Ok(top)
    }

    pub fn is_modified(&self) -> bool {
        self.nodes.values().any(|n| n.flags.contains(NodeFlags::MODIFIED))
    }

    pub fn clear_modified(&mut self) {
        for node in self.nodes.values_mut() {
            node.flags.remove(NodeFlags::MODIFIED);
        }
    }

    /// Recompose every aggregate ancestor of a changed child
    pub fn child_changed(&mut self, child: NodeId) -> Result<()> {
        self.node(child)?;
        self.propagate_up(child);
        Ok(())
    }

    /// Push an aggregate parent's value down into its children
    pub fn refresh_children(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.push_down(id);
        Ok(())
    }

    fn propagate_up(&mut self, mut id: NodeId) {
        while let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
            if !self.nodes[parent].kind.is_aggregate() {
                break;
            }
            self.recompose(parent);
            id = parent;
        }
    }

    fn recompose(&mut self, id: NodeId) {
        let types = Arc::clone(&self.types);
        let Some(value_type) = types.get(&self.nodes[id].value_type) else {
            return;
        };
        let Some(aggregate) = value_type.aggregate else {
            return;
        };
        let values: Vec<Variant> = self.nodes[id]
            .children
            .iter()
            .map(|c| self.nodes[*c].value.clone())
            .collect();
        if let Some(value) = value_type.construct((aggregate.compose)(&values)) {
            self.nodes[id].value = value;
        }
    }

    fn push_down(&mut self, id: NodeId) {
        let types = Arc::clone(&self.types);
        let mut stack = vec![id];
        while let Some(parent) = stack.pop() {
            let node = &self.nodes[parent];
            let Some(aggregate) = types.get(&node.value_type).and_then(|t| t.aggregate) else {
                continue;
            };
            let children = node.children.clone();
            let parts = (aggregate.decompose)(&node.value, children.len());
            for (child, part) in children.into_iter().zip(parts) {
                let child_node = &mut self.nodes[child];
                if let Some(value) = types
                    .get(&child_node.value_type)
                    .and_then(|t| t.construct(part))
                {
                    child_node.value = value;
                }
                if child_node.kind.is_aggregate() {
                    stack.push(child);
                }
            }
        }
    }
}

impl Default for PropertyTree {
    fn default() -> Self {
        Self::new(Arc::new(ValueTypeRegistry::with_builtins()))
    }
}

/// Depth of a child below a parent of `kind` at `depth`. Aggregate children
/// sit one extra level in.
fn child_depth(kind: NodeKind, depth: u32) -> u32 {
    if kind.is_aggregate() {
        depth + 2
    } else {
        depth + 1
    }
}
