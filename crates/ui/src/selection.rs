//! Selection and in-place editing state machine
//!
//! ```text
//! Idle ──select──▶ Selected ──edit──▶ Dirty ──commit──▶ Committing
//!   ▲                 ▲                 ▲                   │
//!   │                 └────── ok ───────┼───────────────────┤
//!   │                                   └── rejected ───────┘
//!   └────────────── select(None) / teardown
//! ```
//!
//! A dirty editor is committed before the selection may move. A rejected
//! value keeps the editor open, flagged invalid, and the move is refused.
//! Teardown frees the editor without validating.

use std::sync::Arc;

use tiny_sdk::LayoutRect;
use tiny_tree::{GridError, NodeFlags, NodeId, PropertyTree, Result, Variant};

use crate::editor::{EditorControl, EditorDescriptor, EditorRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    /// A node is selected; its editor (if any) shows the model value
    Selected,
    /// The editor holds a transient value the model has not seen
    Dirty,
    /// Validating and copying the transient value into the model
    Committing,
}

/// Editor widget open on the selected node
pub struct LiveEditor {
    pub descriptor: Arc<dyn EditorDescriptor>,
    pub control: EditorControl,
    /// Model value when the control was created
    pub original: Variant,
}

struct Selection {
    node: NodeId,
    editor: Option<LiveEditor>,
    /// Last commit attempt was rejected
    invalid: bool,
}

/// A value that reached the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub node: NodeId,
    /// Topmost aggregate ancestor, or `node` itself; observers get one
    /// notification per logical edit
    pub notify: NodeId,
}

/// Result of a selection request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectOutcome {
    /// Selection moved to a different node (or to none)
    pub changed: bool,
    /// Commit performed on the way out of the old node
    pub commit: Option<Commit>,
}

#[derive(Default)]
pub struct SelectionController {
    state: SelectionState,
    current: Option<Selection>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn node(&self) -> Option<NodeId> {
        self.current.as_ref().map(|s| s.node)
    }

    pub fn is_dirty(&self) -> bool {
        self.state == SelectionState::Dirty
    }

    /// Last commit was rejected and the invalid value is still displayed
    pub fn is_invalid(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.invalid)
    }

    pub fn editor(&self) -> Option<&LiveEditor> {
        self.current.as_ref().and_then(|s| s.editor.as_ref())
    }

    pub fn control(&self) -> Option<&EditorControl> {
        self.editor().map(|e| &e.control)
    }

    /// Move the selection to `target`. A dirty editor is committed first
    /// unless `force` is set, in which case its value is dropped.
    pub fn select(
        &mut self,
        tree: &mut PropertyTree,
        editors: &EditorRegistry,
        target: Option<NodeId>,
        anchor: LayoutRect,
        force: bool,
    ) -> Result<SelectOutcome> {
        if self.state == SelectionState::Committing {
            return Err(GridError::Busy);
        }
        if let Some(id) = target {
            tree.node(id)?;
        }
        if target.is_some() && target == self.node() && !force {
            return Ok(SelectOutcome::default());
        }

        let mut outcome = SelectOutcome {
            changed: target != self.node(),
            commit: None,
        };
        if self.state == SelectionState::Dirty {
            if force {
                if let Some(node) = self.node() {
                    log::debug!("dropping uncommitted edit on {:?}", node);
                }
            } else {
                outcome.commit = self.commit(tree)?;
            }
        }

        self.current = None;
        self.state = SelectionState::Idle;
        if let Some(id) = target {
            let editor = Self::open_editor(tree, editors, id, anchor);
            self.current = Some(Selection {
                node: id,
                editor,
                invalid: false,
            });
            self.state = SelectionState::Selected;
        }
        Ok(outcome)
    }

    fn open_editor(
        tree: &PropertyTree,
        editors: &EditorRegistry,
        id: NodeId,
        anchor: LayoutRect,
    ) -> Option<LiveEditor> {
        let node = tree.get(id)?;
        let descriptor = editors.control_editor_for(node)?;
        let control = descriptor.create_control(anchor, &node.value, node)?;
        Some(LiveEditor {
            descriptor,
            control,
            original: node.value.clone(),
        })
    }

    /// Replace the editor's transient value. Returns false when no editor is
    /// open.
    pub fn set_transient_value(&mut self, tree: &PropertyTree, value: &Variant) -> Result<bool> {
        if self.state == SelectionState::Committing {
            return Err(GridError::Busy);
        }
        let Some(selection) = self.current.as_mut() else {
            return Ok(false);
        };
        let Some(editor) = selection.editor.as_mut() else {
            return Ok(false);
        };
        let node = tree.node(selection.node)?;
        editor.descriptor.write_control(&mut editor.control, value, node);
        self.state = SelectionState::Dirty;
        Ok(true)
    }

    /// Let the host change the control (typing, picking). Any change marks
    /// the editor dirty.
    pub fn edit_control(&mut self, edit: impl FnOnce(&mut EditorControl)) -> Result<bool> {
        if self.state == SelectionState::Committing {
            return Err(GridError::Busy);
        }
        let Some(editor) = self.current.as_mut().and_then(|s| s.editor.as_mut()) else {
            return Ok(false);
        };
        edit(&mut editor.control);
        self.state = SelectionState::Dirty;
        Ok(true)
    }

    /// Validate the transient value and copy it into the model. `Ok(None)`
    /// when there was nothing to commit or the value did not change.
    pub fn commit(&mut self, tree: &mut PropertyTree) -> Result<Option<Commit>> {
        match self.state {
            SelectionState::Committing => return Err(GridError::Busy),
            SelectionState::Dirty => {}
            _ => return Ok(None),
        }
        let Some(selection) = self.current.as_mut() else {
            self.state = SelectionState::Idle;
            return Ok(None);
        };
        let Some(editor) = selection.editor.as_mut() else {
            self.state = SelectionState::Selected;
            return Ok(None);
        };
        let id = selection.node;
        self.state = SelectionState::Committing;

        let node = match tree.node(id) {
            Ok(node) => node,
            Err(err) => {
                self.current = None;
                self.state = SelectionState::Idle;
                return Err(err);
            }
        };
        let value = editor.descriptor.read_control(&editor.control, node);
        if let Err(rejection) = editor.descriptor.validate(&value, node) {
            log::info!("rejected value for '{}': {}", node.key(), rejection.message);
            selection.invalid = true;
            self.state = SelectionState::Dirty;
            return Err(rejection.into());
        }
        if value.same_bits(&node.value) && !node.has_flag(NodeFlags::UNSPECIFIED) {
            selection.invalid = false;
            self.state = SelectionState::Selected;
            return Ok(None);
        }

        if let Err(err) = tree.set_value(id, value) {
            selection.invalid = true;
            self.state = SelectionState::Dirty;
            return Err(err);
        }
        let notify = tree.mark_modified(id)?;

        // The model may have coerced the value; show what was stored
        if let Ok(node) = tree.node(id) {
            editor.descriptor.write_control(&mut editor.control, &node.value, node);
            editor.original = node.value.clone();
        }
        selection.invalid = false;
        self.state = SelectionState::Selected;
        log::debug!("committed {:?} (notify {:?})", id, notify);
        Ok(Some(Commit { node: id, notify }))
    }

    /// Drop the transient value and rebuild the control from the model
    pub fn cancel(&mut self, tree: &PropertyTree) -> Result<()> {
        if self.state == SelectionState::Committing {
            return Err(GridError::Busy);
        }
        let Some(selection) = self.current.as_mut() else {
            return Ok(());
        };
        let node = tree.node(selection.node)?;
        if let Some(editor) = selection.editor.as_mut() {
            let anchor = editor.control.rect;
            match editor.descriptor.create_control(anchor, &node.value, node) {
                Some(control) => {
                    editor.control = control;
                    editor.original = node.value.clone();
                }
                None => selection.editor = None,
            }
        }
        selection.invalid = false;
        self.state = SelectionState::Selected;
        Ok(())
    }

    /// Free the editor unconditionally. Returns the node that was selected.
    pub fn teardown(&mut self) -> Option<NodeId> {
        let node = self.node();
        self.current = None;
        self.state = SelectionState::Idle;
        node
    }

    /// Re-anchor the live control after a layout change
    pub fn move_editor(&mut self, anchor: LayoutRect) {
        if let Some(editor) = self.current.as_mut().and_then(|s| s.editor.as_mut()) {
            editor.control.rect = anchor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_tree::{NodeSpec, ValueTypeRegistry};

    struct Fixture {
        tree: PropertyTree,
        editors: EditorRegistry,
        perimeter: NodeId,
        area: NodeId,
    }

    fn fixture() -> Fixture {
        let types = Arc::new(ValueTypeRegistry::with_builtins());
        let editors = EditorRegistry::with_builtins(types.clone());
        let mut tree = PropertyTree::new(types);
        let root = tree.root();
        let shape = tree.append(root, NodeSpec::category("Shape")).unwrap();
        let perimeter = tree
            .append(shape, NodeSpec::leaf("perimeter", "Perimeter", "real").unspecified())
            .unwrap();
        let area = tree
            .append(shape, NodeSpec::leaf("area", "Area", "real").unspecified())
            .unwrap();
        Fixture {
            tree,
            editors,
            perimeter,
            area,
        }
    }

    fn anchor() -> LayoutRect {
        LayoutRect::new(140.0, 0.0, 100.0, 20.0)
    }

    #[test]
    fn test_commit_stores_value() {
        let mut f = fixture();
        let mut sel = SelectionController::new();
        let outcome = sel
            .select(&mut f.tree, &f.editors, Some(f.perimeter), anchor(), false)
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(sel.state(), SelectionState::Selected);

        assert!(sel.set_transient_value(&f.tree, &Variant::Real(12.5)).unwrap());
        assert_eq!(sel.state(), SelectionState::Dirty);
        let commit = sel.commit(&mut f.tree).unwrap().unwrap();
        assert_eq!(commit.node, f.perimeter);
        assert_eq!(commit.notify, f.perimeter);

        let node = f.tree.get(f.perimeter).unwrap();
        assert_eq!(node.value, Variant::Real(12.5));
        assert!(node.has_flag(NodeFlags::MODIFIED));
        assert!(!node.has_flag(NodeFlags::UNSPECIFIED));
        assert_eq!(sel.state(), SelectionState::Selected);
    }

    #[test]
    fn test_rejected_value_blocks_selection_change() {
        let mut f = fixture();
        let mut sel = SelectionController::new();
        sel.select(&mut f.tree, &f.editors, Some(f.perimeter), anchor(), false)
            .unwrap();
        sel.edit_control(|c| c.text = "not a number".into()).unwrap();

        let err = sel
            .select(&mut f.tree, &f.editors, Some(f.area), anchor(), false)
            .unwrap_err();
        assert!(matches!(err, GridError::ValidationFailed { .. }));
        assert_eq!(sel.node(), Some(f.perimeter));
        assert_eq!(sel.state(), SelectionState::Dirty);
        assert!(sel.is_invalid());
        assert_eq!(sel.control().unwrap().text, "not a number");

        // Teardown path ignores the bad value
        let outcome = sel
            .select(&mut f.tree, &f.editors, Some(f.area), anchor(), true)
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(sel.node(), Some(f.area));
    }

    #[test]
    fn test_cancel_restores_model_value() {
        let mut f = fixture();
        f.tree.set_value(f.area, Variant::Real(3.25)).unwrap();
        let mut sel = SelectionController::new();
        sel.select(&mut f.tree, &f.editors, Some(f.area), anchor(), false)
            .unwrap();
        sel.edit_control(|c| c.text = "99".into()).unwrap();
        sel.cancel(&f.tree).unwrap();

        assert_eq!(sel.state(), SelectionState::Selected);
        assert_eq!(sel.control().unwrap().text, "3.25");
        assert!(f.tree.value(f.area).unwrap().same_bits(&Variant::Real(3.25)));
        assert_eq!(sel.commit(&mut f.tree).unwrap(), None);
    }

    #[test]
    fn test_category_selection_has_no_editor() {
        let mut f = fixture();
        let shape = f.tree.find("Shape").unwrap();
        let mut sel = SelectionController::new();
        sel.select(&mut f.tree, &f.editors, Some(shape), anchor(), false)
            .unwrap();
        assert_eq!(sel.node(), Some(shape));
        assert!(sel.editor().is_none());
        assert!(!sel.set_transient_value(&f.tree, &Variant::Real(1.0)).unwrap());
        assert_eq!(sel.teardown(), Some(shape));
        assert_eq!(sel.state(), SelectionState::Idle);
    }
}
