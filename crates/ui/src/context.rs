//! Engine-wide shared state
//!
//! One context is shared by every grid in the process. The value-type
//! registry is fixed after construction, the editor table is swapped
//! atomically on registration and the choice registry sits behind a lock
//! because loading records publishes into it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};
use tiny_tree::{ChoiceRegistry, ChoiceSet, ValueKind, ValueTypeRegistry};

use crate::editor::{EditorDescriptor, EditorRegistry};

pub struct EngineContext {
    types: Arc<ValueTypeRegistry>,
    editors: ArcSwap<EditorRegistry>,
    choices: Mutex<ChoiceRegistry>,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineContext {
    /// Context with the built-in value types and editors
    pub fn new() -> Self {
        Self::with_types(ValueTypeRegistry::with_builtins())
    }

    pub fn with_types(types: ValueTypeRegistry) -> Self {
        let types = Arc::new(types);
        let editors = EditorRegistry::with_builtins(types.clone());
        Self {
            types,
            editors: ArcSwap::from_pointee(editors),
            choices: Mutex::new(ChoiceRegistry::new()),
        }
    }

    pub fn types(&self) -> Arc<ValueTypeRegistry> {
        self.types.clone()
    }

    /// Snapshot of the editor table
    pub fn editors(&self) -> Arc<EditorRegistry> {
        self.editors.load_full()
    }

    pub fn register_editor(&self, editor: Arc<dyn EditorDescriptor>) {
        self.editors.rcu(|current| {
            let mut next = EditorRegistry::clone(current);
            next.register(editor.clone());
            next
        });
    }

    pub fn bind_editor_tag(&self, tag: &str, editor: &str) {
        self.editors.rcu(|current| {
            let mut next = EditorRegistry::clone(current);
            next.bind_tag(tag, editor);
            next
        });
    }

    pub fn bind_editor_kind(&self, kind: ValueKind, editor: &str) {
        self.editors.rcu(|current| {
            let mut next = EditorRegistry::clone(current);
            next.bind_kind(kind, editor);
            next
        });
    }

    pub fn choices(&self) -> MutexGuard<'_, ChoiceRegistry> {
        self.choices.lock()
    }

    /// Publish a named choice set built from labels
    pub fn publish_choices<S: AsRef<str>>(&self, name: &str, labels: &[S]) -> ChoiceSet {
        self.choices.lock().publish_labels(name, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editors::CheckBoxEditor;
    use tiny_tree::{NodeSpec, PropertyTree};

    #[test]
    fn test_rebinding_swaps_the_table() {
        let context = EngineContext::new();
        let before = context.editors();
        context.bind_editor_tag("int", CheckBoxEditor::NAME);
        let after = context.editors();

        let mut tree = PropertyTree::new(context.types());
        let root = tree.root();
        let id = tree.append(root, NodeSpec::leaf("n", "N", "int")).unwrap();
        let node = tree.get(id).unwrap();
        assert_eq!(before.editor_for(node).map(|e| e.name()), Some("TextCtrl"));
        assert_eq!(after.editor_for(node).map(|e| e.name()), Some("CheckBox"));
    }

    #[test]
    fn test_published_choices_are_shared() {
        let context = EngineContext::new();
        let first = context.publish_choices("sizes", &["S", "M", "L"]);
        let again = context.choices().get("sizes").unwrap();
        assert!(first.ptr_eq(&again));
    }
}
