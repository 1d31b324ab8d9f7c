//! Bulk load and save
//!
//! A `PropertyRecord` is the flat, serializable form of one node. Records are
//! written in categorized pre-order; structure lives in the attribute string:
//!
//! - `parent=<key>`: scoped key of the parent (absent for top-level nodes)
//! - `dynamic=1`: aggregate whose children come and go at runtime
//! - `help`, `editor`, `flags` (hex), `expanded`, `background`
//! - `choices` / `choice_values`: an unpublished choice set, as quoted tokens
//!
//! Everything else in the string is kept as user attributes.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use serde::{Deserialize, Serialize};

use crate::choices::{ChoiceEntry, ChoiceRegistry, ChoiceSet};
use crate::error::{GridError, Result};
use crate::nav::{IterOrder, IterSpec};
use crate::node::{Attributes, NodeFlags, NodeId, NodeKind, NodeSpec};
use crate::text::{format_attributes, join_quoted, split_quoted};
use crate::tree::PropertyTree;
use crate::value_type::CATEGORY_TAG;

const RESERVED: &[&str] = &[
    "parent",
    "dynamic",
    "help",
    "editor",
    "flags",
    "expanded",
    "background",
    "choices",
    "choice_values",
];

/// Flags that survive a save/load cycle
const PERSISTED_FLAGS: NodeFlags = NodeFlags::DISABLED
    .union(NodeFlags::HIDEABLE)
    .union(NodeFlags::UNSPECIFIED)
    .union(NodeFlags::HAS_CUSTOM_PAINT)
    .union(NodeFlags::NO_EDITOR)
    .union(NodeFlags::CLASS_SPECIFIC_1)
    .union(NodeFlags::CLASS_SPECIFIC_2);

/// Serializable form of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    pub label: String,
    pub value_type: String,
    /// Value in its type's text codec
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attributes: String,
    /// Name of a published choice set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_set: Option<String>,
}

impl PropertyTree {
    /// Every node in categorized pre-order
    pub fn to_records(&self) -> Vec<PropertyRecord> {
        self.iter(IterSpec::all().with_order(IterOrder::Categorized))
            .filter_map(|id| self.to_record(id))
            .collect()
    }

    fn to_record(&self, id: NodeId) -> Option<PropertyRecord> {
        let node = self.get(id)?;
        let parent = node.parent().and_then(|p| self.get(p))?;

        let mut extra: Vec<(&str, String)> = Vec::new();
        if parent.kind != NodeKind::Root {
            extra.push(("parent", parent.key().to_string()));
        }
        if node.kind == NodeKind::DynamicParent {
            extra.push(("dynamic", "1".into()));
        }
        if let Some(help) = &node.help {
            extra.push(("help", help.clone()));
        }
        if let Some(editor) = &node.editor {
            extra.push(("editor", editor.clone()));
        }
        let flags = node.flags & PERSISTED_FLAGS;
        if !flags.is_empty() {
            extra.push(("flags", format!("{:x}", flags.bits())));
        }
        if node.kind != NodeKind::Leaf {
            extra.push(("expanded", if node.is_expanded() { "1" } else { "0" }.into()));
        }
        if node.background() != parent.background() {
            extra.push(("background", node.background().to_string()));
        }
        let mut choice_set = None;
        if let Some(choices) = &node.choices {
            match choices.name() {
                Some(name) => choice_set = Some(name.to_string()),
                None => {
                    let labels: Vec<String> = choices.entries().iter().map(|e| e.label.clone()).collect();
                    let values: Vec<String> = choices.entries().iter().map(|e| e.value.to_string()).collect();
                    extra.push(("choices", join_quoted(&labels)));
                    extra.push(("choice_values", join_quoted(&values)));
                }
            }
        }

        let attributes = format_attributes(
            extra
                .iter()
                .map(|(k, v)| (*k, v.as_str()))
                .chain(node.attributes.iter()),
        );
        let value = if node.kind == NodeKind::Category {
            String::new()
        } else {
            self.types()
                .format(&node.value_type, &node.value)
                .unwrap_or_else(|_| node.value.to_string())
        };

        Some(PropertyRecord {
            name: node.name.clone(),
            label: node.label.clone(),
            value_type: node.value_type.clone(),
            value,
            attributes,
            choice_set,
        })
    }

    /// Insert records under `base` (records without a `parent` attribute)
    /// or under the tree node their `parent` key names. Either every record
    /// is attached or the tree is left as it was. Returns the ids of the
    /// top-level nodes.
    pub fn load_records(
        &mut self,
        base: NodeId,
        records: &[PropertyRecord],
        choices: &ChoiceRegistry,
    ) -> Result<Vec<NodeId>> {
        self.node(base)?;

        // key -> index of the record within this batch
        let mut batch: HashMap<String, usize> = HashMap::new();
        let mut specs: Vec<Option<NodeSpec>> = Vec::with_capacity(records.len());
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(records.len());
        let mut anchors: Vec<NodeId> = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            let (spec, parent_key) = self.record_to_spec(record, choices)?;
            let (parent_index, parent_kind, anchor) = match parent_key.as_deref() {
                None => (None, self.node(base)?.kind, base),
                Some(key) => match batch.get(key) {
                    Some(&j) => (
                        Some(j),
                        specs[j].as_ref().map_or(NodeKind::Leaf, |s| s.kind),
                        base,
                    ),
                    None => {
                        let id = self.find(key).ok_or_else(|| {
                            GridError::Parse(format!("record '{}' names unknown parent '{}'", record.name, key))
                        })?;
                        (None, self.node(id)?.kind, id)
                    }
                },
            };
            let key = match parent_key {
                Some(p) if parent_kind.is_aggregate() => format!("{}.{}", p, spec.name),
                _ => spec.name.clone(),
            };
            if batch.insert(key.clone(), i).is_some() && spec.kind != NodeKind::Category {
                return Err(GridError::DuplicateName(key));
            }
            specs.push(Some(spec));
            parents.push(parent_index);
            anchors.push(anchor);
        }

        for i in (0..specs.len()).rev() {
            if let Some(j) = parents[i] {
                if let Some(spec) = specs[i].take() {
                    if let Some(parent) = specs[j].as_mut() {
                        parent.children.insert(0, spec);
                    }
                }
            }
        }

        let before: HashSet<NodeId> = self.nodes.keys().collect();
        let mut top = Vec::new();
        for (i, spec) in specs.into_iter().enumerate() {
            let Some(spec) = spec else {
                continue;
            };
            match self.append(anchors[i], spec) {
                Ok(id) => top.push(id),
                Err(err) => {
                    self.discard_new(&before);
                    return Err(err);
                }
            }
        }
        log::info!("loaded {} records", records.len());
        Ok(top)
    }

    /// Delete every subtree attached since `before` was taken
    fn discard_new(&mut self, before: &HashSet<NodeId>) {
        let added: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(id, node)| {
                !before.contains(id) && node.parent().is_some_and(|p| before.contains(&p))
            })
            .map(|(id, _)| id)
            .collect();
        for id in added {
            if let Err(err) = self.delete(id) {
                log::warn!("rollback of {:?} failed: {}", id, err);
            }
        }
    }

    fn record_to_spec(
        &self,
        record: &PropertyRecord,
        choices: &ChoiceRegistry,
    ) -> Result<(NodeSpec, Option<String>)> {
        let mut attributes = Attributes::parse(&record.attributes);
        let mut take = |key: &str| attributes.remove(key);
        let parent = take("parent");
        let dynamic = take("dynamic").is_some_and(|v| v.trim() == "1");
        let help = take("help");
        let editor = take("editor");
        let flags = take("flags")
            .and_then(|v| u16::from_str_radix(v.trim(), 16).ok())
            .map_or(NodeFlags::empty(), NodeFlags::from_bits_truncate);
        let expanded = take("expanded").map(|v| v.trim() != "0");
        let background = take("background").and_then(|v| v.trim().parse::<u8>().ok());
        let inline_labels = take("choices");
        let inline_values = take("choice_values");
        debug_assert!(RESERVED.iter().all(|k| attributes.get(k).is_none()));

        let value_type = self.types().lookup(&record.value_type)?;
        let mut spec = if record.value_type == CATEGORY_TAG {
            NodeSpec::category(&record.label)
        } else if value_type.is_aggregate() && dynamic {
            NodeSpec::dynamic_parent(&record.name, &record.label, &record.value_type)
        } else if value_type.is_aggregate() {
            NodeSpec::fixed_parent(&record.name, &record.label, &record.value_type, Vec::new())
        } else {
            NodeSpec::leaf(&record.name, &record.label, &record.value_type)
        };
        spec.name = record.name.clone();

        if spec.kind != NodeKind::Category && !record.value.is_empty() {
            let value = (value_type.parse)(&record.value).ok_or_else(|| {
                GridError::Parse(format!(
                    "'{}' is not a valid {} for '{}'",
                    record.value, record.value_type, record.name
                ))
            })?;
            spec.value = Some(value);
        }

        spec.choices = match (&record.choice_set, inline_labels) {
            (Some(name), _) => Some(
                choices
                    .get(name)
                    .ok_or_else(|| GridError::UnknownChoiceSet(name.clone()))?,
            ),
            (None, Some(labels)) => {
                let labels = split_quoted(&labels);
                let values: Vec<i64> = inline_values
                    .map(|v| split_quoted(&v).iter().filter_map(|s| s.parse().ok()).collect())
                    .unwrap_or_default();
                Some(ChoiceSet::from_entries(
                    labels
                        .into_iter()
                        .enumerate()
                        .map(|(i, label)| ChoiceEntry {
                            label,
                            value: values.get(i).copied().unwrap_or(i as i64),
                        })
                        .collect(),
                ))
            }
            (None, None) => None,
        };

        spec.flags = flags;
        spec.help = help;
        spec.editor = editor;
        spec.background = background;
        if let Some(expanded) = expanded {
            spec.expanded = expanded;
        }
        spec.attributes = attributes;
        Ok((spec, parent))
    }
}

/// Pretty JSON for a batch of records
pub fn records_to_json(records: &[PropertyRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(|e| GridError::Parse(e.to_string()))
}

pub fn records_from_json(text: &str) -> Result<Vec<PropertyRecord>> {
    serde_json::from_str(text).map_err(|e| GridError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Variant;

    #[test]
    fn test_save_load_keeps_structure() {
        let mut tree = PropertyTree::default();
        let root = tree.root();
        let shape = tree.append(root, NodeSpec::category("Shape")).unwrap();
        tree.append(
            shape,
            NodeSpec::leaf("colour", "Colour", "colour")
                .with_value(Variant::Int(0xFF0000))
                .with_help("Fill colour"),
        )
        .unwrap();
        tree.append(shape, NodeSpec::range("span", "Span", 1.0, 2.0)).unwrap();
        tree.append(
            root,
            NodeSpec::leaf("mode", "Mode", "choice")
                .with_choices(ChoiceSet::from_labels(&["Fast", "Exact"]))
                .with_attributes("unit=ms"),
        )
        .unwrap();

        let records = tree.to_records();
        assert_eq!(records.len(), 6);
        assert_eq!(records[1].value, "#FF0000");

        let json = records_to_json(&records).unwrap();
        let back = records_from_json(&json).unwrap();
        let mut copy = PropertyTree::default();
        let base = copy.root();
        copy.load_records(base, &back, &ChoiceRegistry::new()).unwrap();

        assert_eq!(copy.to_records(), records);
        let colour = copy.find("colour").unwrap();
        assert_eq!(copy.get_int(colour), 0xFF0000);
        assert_eq!(copy.node(colour).unwrap().help.as_deref(), Some("Fill colour"));
        let mode = copy.find("mode").unwrap();
        assert_eq!(copy.node(mode).unwrap().attributes.get("unit"), Some("ms"));
        assert_eq!(copy.node(mode).unwrap().choices.as_ref().map(|c| c.len()), Some(2));
        assert!(copy.find("span.max").is_some());
    }

    #[test]
    fn test_failed_load_leaves_tree_untouched() {
        let mut tree = PropertyTree::default();
        let root = tree.root();
        tree.append(root, NodeSpec::leaf("a", "A", "int")).unwrap();
        let records = vec![
            PropertyRecord {
                name: "b".into(),
                label: "B".into(),
                value_type: "int".into(),
                value: "1".into(),
                attributes: String::new(),
                choice_set: None,
            },
            PropertyRecord {
                name: "a".into(),
                label: "A".into(),
                value_type: "int".into(),
                value: "2".into(),
                attributes: String::new(),
                choice_set: None,
            },
        ];
        let err = tree.load_records(root, &records, &ChoiceRegistry::new()).unwrap_err();
        assert_eq!(err, GridError::DuplicateName("a".into()));
        assert_eq!(tree.len(), 1);
        assert!(tree.find("b").is_none());
    }

    #[test]
    fn test_unknown_choice_set() {
        let mut tree = PropertyTree::default();
        let root = tree.root();
        let records = vec![PropertyRecord {
            name: "unit".into(),
            label: "Unit".into(),
            value_type: "choice".into(),
            value: "0".into(),
            attributes: String::new(),
            choice_set: Some("units".into()),
        }];
        assert_eq!(
            tree.load_records(root, &records, &ChoiceRegistry::new()),
            Err(GridError::UnknownChoiceSet("units".into()))
        );
    }
}
