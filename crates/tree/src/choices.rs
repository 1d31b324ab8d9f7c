//! Shared choice lists
//!
//! A `ChoiceSet` is an immutable list of `(label, value)` pairs behind an
//! `Arc`. Nodes that enumerate the same logical list share one allocation:
//! the `ChoiceRegistry` hands out the live handle for a name and only keeps
//! a `Weak` itself, so the data goes away with its last owner.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use ahash::AHashMap as HashMap;

static NEXT_CHOICE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_CHOICE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceEntry {
    pub label: String,
    pub value: i64,
}

#[derive(Debug)]
struct ChoiceData {
    id: u64,
    name: Option<String>,
    entries: Vec<ChoiceEntry>,
}

/// Shared handle to an immutable choice list
#[derive(Debug, Clone)]
pub struct ChoiceSet {
    data: Arc<ChoiceData>,
}

impl ChoiceSet {
    /// Anonymous set; values default to the entry index
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        Self::from_entries(
            labels
                .iter()
                .enumerate()
                .map(|(i, label)| ChoiceEntry {
                    label: label.as_ref().to_string(),
                    value: i as i64,
                })
                .collect(),
        )
    }

    /// Anonymous set with explicit values
    pub fn from_entries(entries: Vec<ChoiceEntry>) -> Self {
        Self {
            data: Arc::new(ChoiceData {
                id: next_id(),
                name: None,
                entries,
            }),
        }
    }

    /// Identity of the backing store, equal for handles that share it
    pub fn id(&self) -> u64 {
        self.data.id
    }

    /// Name under which this set was published, if any
    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn entries(&self) -> &[ChoiceEntry] {
        &self.data.entries
    }

    pub fn len(&self) -> usize {
        self.data.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.entries.is_empty()
    }

    /// True when both handles point at the same backing store
    pub fn ptr_eq(&self, other: &ChoiceSet) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles to this backing store
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    pub fn index_of_value(&self, value: i64) -> Option<usize> {
        self.data.entries.iter().position(|e| e.value == value)
    }

    pub fn index_of_label(&self, label: &str) -> Option<usize> {
        self.data.entries.iter().position(|e| e.label == label)
    }

    pub fn label_of_value(&self, value: i64) -> Option<&str> {
        self.index_of_value(value)
            .map(|i| self.data.entries[i].label.as_str())
    }

    pub fn value_of_label(&self, label: &str) -> Option<i64> {
        self.index_of_label(label).map(|i| self.data.entries[i].value)
    }

    /// Copy-on-write edit. Published data is never touched; the result is a
    /// new anonymous set with its own id.
    pub fn edited(&self, edit: impl FnOnce(&mut Vec<ChoiceEntry>)) -> ChoiceSet {
        let mut entries = self.data.entries.clone();
        edit(&mut entries);
        ChoiceSet::from_entries(entries)
    }
}

impl PartialEq for ChoiceSet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.data.entries == other.data.entries
    }
}

/// Named choice lists shared between nodes and grid instances
#[derive(Default)]
pub struct ChoiceRegistry {
    published: HashMap<String, Weak<ChoiceData>>,
}

impl ChoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live handle for `name`, if some owner still holds it
    pub fn get(&self, name: &str) -> Option<ChoiceSet> {
        self.published
            .get(name)
            .and_then(Weak::upgrade)
            .map(|data| ChoiceSet { data })
    }

    /// Return the shared handle for `name`, building and publishing it when
    /// no live copy exists.
    pub fn get_or_publish(
        &mut self,
        name: &str,
        build: impl FnOnce() -> Vec<ChoiceEntry>,
    ) -> ChoiceSet {
        if let Some(existing) = self.get(name) {
            return existing;
        }
        let data = Arc::new(ChoiceData {
            id: next_id(),
            name: Some(name.to_string()),
            entries: build(),
        });
        log::debug!("published choice set '{}' ({} entries)", name, data.entries.len());
        self.published.insert(name.to_string(), Arc::downgrade(&data));
        ChoiceSet { data }
    }

    /// Publish labels with index values
    pub fn publish_labels<S: AsRef<str>>(&mut self, name: &str, labels: &[S]) -> ChoiceSet {
        self.get_or_publish(name, || ChoiceSet::from_labels(labels).entries().to_vec())
    }

    /// Whether `name` currently has a live backing store
    pub fn is_live(&self, name: &str) -> bool {
        self.published
            .get(name)
            .map_or(false, |weak| weak.strong_count() > 0)
    }

    /// Drop bookkeeping for sets whose last owner is gone
    pub fn purge(&mut self) {
        self.published.retain(|_, weak| weak.strong_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_shares_data() {
        let mut registry = ChoiceRegistry::new();
        let a = registry.publish_labels("units", &["m", "km"]);
        let b = registry.publish_labels("units", &["ignored"]);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert_eq!(b.len(), 2);
        assert_eq!(a.owner_count(), 2);
    }

    #[test]
    fn test_release_keeps_data_until_last_owner() {
        let mut registry = ChoiceRegistry::new();
        let a = registry.publish_labels("units", &["m", "km"]);
        let b = registry.get("units").unwrap();
        drop(a);
        assert!(registry.is_live("units"));
        assert_eq!(b.label_of_value(1), Some("km"));
        drop(b);
        assert!(!registry.is_live("units"));
        registry.purge();
        assert!(registry.get("units").is_none());
    }

    #[test]
    fn test_edited_is_copy_on_write() {
        let mut registry = ChoiceRegistry::new();
        let a = registry.publish_labels("units", &["m"]);
        let b = a.edited(|entries| {
            entries.push(ChoiceEntry {
                label: "km".into(),
                value: 1,
            })
        });
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        assert_ne!(a.id(), b.id());
        assert!(b.name().is_none());
    }
}
