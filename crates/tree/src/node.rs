//! Property nodes
//!
//! Nodes live in the tree's arena and refer to each other by `NodeId`.
//! A node's structural role is a tag (`NodeKind`), not a type.

use bitflags::bitflags;

use crate::choices::ChoiceSet;
use crate::text::parse_attributes;
use crate::value::Variant;

slotmap::new_key_type! {
    /// Stable, generational handle to a node in a `PropertyTree`
    pub struct NodeId;
}

/// Structural role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    /// No children, normal editing
    Leaf,
    /// Children defined at construction, value aggregates them
    FixedParent,
    /// Children added/removed at runtime, value aggregates them
    DynamicParent,
    /// Pure grouping, never holds a value
    Category,
}

impl NodeKind {
    /// Fixed or dynamic aggregate parent
    pub fn is_aggregate(self) -> bool {
        matches!(self, NodeKind::FixedParent | NodeKind::DynamicParent)
    }

    /// Root or category: the scopes that share one name table level
    pub fn is_grouping(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Category)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u16 {
        const MODIFIED = 0x01;
        const DISABLED = 0x02;
        const HIDEABLE = 0x04;
        const UNSPECIFIED = 0x08;
        const HAS_CUSTOM_PAINT = 0x10;
        const NO_EDITOR = 0x20;
        const CLASS_SPECIFIC_1 = 0x40;
        const CLASS_SPECIFIC_2 = 0x80;
    }
}

/// Parsed attribute string, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    pub fn parse(text: &str) -> Self {
        Self {
            pairs: parse_attributes(text),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A single entry in the property tree
#[derive(Debug, Clone)]
pub struct PropertyNode {
    pub label: String,
    /// Name within the owning scope (not the scoped key)
    pub name: String,
    pub value: Variant,
    /// Registry tag of the value type
    pub value_type: String,
    pub flags: NodeFlags,
    pub choices: Option<ChoiceSet>,
    pub kind: NodeKind,
    /// Explicit editor name, overrides the registry's default
    pub editor: Option<String>,
    pub help: Option<String>,
    pub attributes: Attributes,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) index_in_parent: usize,
    pub(crate) depth: u32,
    pub(crate) cached_top_y: Option<f32>,
    pub(crate) background: u8,
    pub(crate) expanded: bool,
    /// Fixed children are in place and no more can be added
    pub(crate) sealed: bool,
    /// Key in the tree's name table
    pub(crate) key: String,
    /// Position in the flattened ordering, for top-level data nodes
    pub(crate) flat_index: Option<usize>,
}

impl PropertyNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn index_in_parent(&self) -> usize {
        self.index_in_parent
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Top of the row in layout space, `None` when not laid out
    pub fn cached_top_y(&self) -> Option<f32> {
        self.cached_top_y
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_category(&self) -> bool {
        self.kind == NodeKind::Category
    }

    /// Scoped name used by the name table (`Parent.Child` below aggregates)
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has_flag(&self, flag: NodeFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// Description of a node to insert
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub label: String,
    pub kind: NodeKind,
    pub value_type: String,
    /// `None` takes the value type's default
    pub value: Option<Variant>,
    pub flags: NodeFlags,
    pub choices: Option<ChoiceSet>,
    pub editor: Option<String>,
    pub help: Option<String>,
    pub attributes: Attributes,
    /// Overrides the inherited background palette index
    pub background: Option<u8>,
    pub expanded: bool,
    /// Children inserted together with the node (required for fixed parents)
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    fn base(name: &str, label: &str, kind: NodeKind, value_type: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            value_type: value_type.to_string(),
            value: None,
            flags: NodeFlags::empty(),
            choices: None,
            editor: None,
            help: None,
            attributes: Attributes::default(),
            background: None,
            expanded: true,
            children: Vec::new(),
        }
    }

    /// Plain leaf property
    pub fn leaf(name: &str, label: &str, value_type: &str) -> Self {
        Self::base(name, label, NodeKind::Leaf, value_type)
    }

    /// Category; the label doubles as the name
    pub fn category(label: &str) -> Self {
        Self::base(label, label, NodeKind::Category, crate::value_type::CATEGORY_TAG)
    }

    /// Aggregate with children fixed at construction
    pub fn fixed_parent(name: &str, label: &str, value_type: &str, children: Vec<NodeSpec>) -> Self {
        let mut spec = Self::base(name, label, NodeKind::FixedParent, value_type);
        spec.children = children;
        spec.expanded = false;
        spec
    }

    /// Aggregate whose children come and go at runtime
    pub fn dynamic_parent(name: &str, label: &str, value_type: &str) -> Self {
        let mut spec = Self::base(name, label, NodeKind::DynamicParent, value_type);
        spec.expanded = false;
        spec
    }

    /// Min/max pair of reals
    pub fn range(name: &str, label: &str, min: f64, max: f64) -> Self {
        Self::fixed_parent(
            name,
            label,
            "range",
            vec![
                Self::leaf("min", "Minimum", "real").with_value(min),
                Self::leaf("max", "Maximum", "real").with_value(max),
            ],
        )
    }

    /// Decimal degrees edited as degrees, minutes and seconds
    pub fn degree(name: &str, label: &str) -> Self {
        Self::fixed_parent(
            name,
            label,
            "degree",
            vec![
                Self::leaf("deg", "\u{b0}", "real"),
                Self::leaf("min", "'", "real"),
                Self::leaf("sec", "''", "real"),
            ],
        )
    }

    pub fn with_value(mut self, value: impl Into<Variant>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Value not known yet (shown blank until the user commits one)
    pub fn unspecified(mut self) -> Self {
        self.flags |= NodeFlags::UNSPECIFIED;
        self
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_choices(mut self, choices: ChoiceSet) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn with_editor(mut self, editor: &str) -> Self {
        self.editor = Some(editor.to_string());
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_attributes(mut self, text: &str) -> Self {
        for (key, value) in parse_attributes(text) {
            self.attributes.set(&key, value);
        }
        self
    }

    pub fn with_background(mut self, index: u8) -> Self {
        self.background = Some(index);
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.expanded = false;
        self
    }

    pub fn expanded(mut self) -> Self {
        self.expanded = true;
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}
