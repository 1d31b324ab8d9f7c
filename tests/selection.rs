use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tiny_propgrid::sdk::{HostServices, StatusSink};
use tiny_propgrid::{
    EngineContext, GridError, GridEvent, NodeFlags, NodeId, NodeSpec, PropertyGrid, SelectionState,
    Variant,
};

#[derive(Clone, Default)]
struct Status(Rc<RefCell<Vec<String>>>);

impl StatusSink for Status {
    fn set_status(&mut self, text: &str) {
        self.0.borrow_mut().push(text.to_string());
    }
}

struct Shape {
    grid: PropertyGrid,
    events: Receiver<GridEvent>,
    status: Status,
    shape: NodeId,
    perimeter: NodeId,
    area: NodeId,
}

fn shape_grid() -> Shape {
    let status = Status::default();
    let mut grid = PropertyGrid::new(Arc::new(EngineContext::new()))
        .with_host(HostServices::new().with_status(status.clone()));
    let root = grid.tree().root();
    let shape = grid.append(root, NodeSpec::category("Shape")).unwrap();
    let perimeter = grid
        .append(
            shape,
            NodeSpec::leaf("perimeter", "Perimeter", "real")
                .unspecified()
                .with_attributes("min=0"),
        )
        .unwrap();
    let area = grid
        .append(shape, NodeSpec::leaf("area", "Area", "real").unspecified())
        .unwrap();
    let events = grid.subscribe();
    Shape {
        grid,
        events,
        status,
        shape,
        perimeter,
        area,
    }
}

#[test]
fn test_commit_sets_value_and_fires_once() {
    let mut s = shape_grid();
    s.grid.select(Some(s.perimeter)).unwrap();
    s.grid.set_transient_value(Variant::Real(12.5)).unwrap();
    assert_eq!(s.grid.selection_state(), SelectionState::Dirty);
    assert_eq!(s.grid.commit().unwrap(), Some(s.perimeter));

    let node = s.grid.tree().get(s.perimeter).unwrap();
    assert_eq!(node.value, Variant::Real(12.5));
    assert!(node.has_flag(NodeFlags::MODIFIED));
    assert!(!node.has_flag(NodeFlags::UNSPECIFIED));
    assert!(!s.grid.tree().get(s.shape).unwrap().has_flag(NodeFlags::MODIFIED));

    let commits = s
        .events
        .try_iter()
        .filter(|e| matches!(e, GridEvent::ValueCommitted(_)))
        .count();
    assert_eq!(commits, 1);
}

#[test]
fn test_rejected_value_keeps_selection() {
    let mut s = shape_grid();
    s.grid.select(Some(s.perimeter)).unwrap();
    while s.events.try_recv().is_ok() {}

    s.grid.set_editor_text("twelve").unwrap();
    let err = s.grid.select(Some(s.area)).unwrap_err();
    assert!(matches!(err, GridError::ValidationFailed { .. }));

    assert_eq!(s.grid.selected(), Some(s.perimeter));
    assert!(s.grid.is_value_invalid());
    assert_eq!(s.grid.control().unwrap().text, "twelve");
    assert!(s.events.try_recv().is_err());
    let status = s.status.0.borrow();
    assert!(status.last().is_some_and(|m| m.contains("Perimeter")));
}

#[test]
fn test_out_of_range_value_is_rejected() {
    let mut s = shape_grid();
    s.grid.select(Some(s.perimeter)).unwrap();
    s.grid.set_editor_text("-1").unwrap();
    assert!(s.grid.commit().is_err());
    assert!(s.grid.tree().get(s.perimeter).unwrap().has_flag(NodeFlags::UNSPECIFIED));
}

#[test]
fn test_cancel_leaves_model_untouched() {
    let mut s = shape_grid();
    s.grid.set_value(s.area, Variant::Real(0.1 + 0.2)).unwrap();
    let before = s.grid.tree().value(s.area).cloned().unwrap();

    s.grid.select(Some(s.area)).unwrap();
    s.grid.set_editor_text("42").unwrap();
    s.grid.cancel().unwrap();

    assert!(s.grid.tree().value(s.area).unwrap().same_bits(&before));
    assert_eq!(s.grid.selection_state(), SelectionState::Selected);
    assert_eq!(s.grid.control().unwrap().text, before.to_string());
}

#[test]
fn test_delete_category_clears_selection_first() {
    let mut s = shape_grid();
    s.grid.select(Some(s.perimeter)).unwrap();
    s.grid.set_editor_text("3").unwrap();
    while s.events.try_recv().is_ok() {}

    s.grid.delete(s.shape).unwrap();
    assert_eq!(s.grid.selected(), None);
    assert!(s.grid.control().is_none());
    assert_eq!(s.grid.selection_state(), SelectionState::Idle);
    assert!(s.grid.tree().get(s.perimeter).is_none());

    let events: Vec<_> = s.events.try_iter().collect();
    assert_eq!(
        events,
        vec![
            GridEvent::ValueCommitted(s.perimeter),
            GridEvent::SelectionChanged(None)
        ]
    );
}

#[test]
fn test_collapse_moves_selection_to_parent() {
    let mut s = shape_grid();
    s.grid.select(Some(s.area)).unwrap();
    assert!(s.grid.collapse(s.shape).unwrap());
    assert_eq!(s.grid.selected(), Some(s.shape));
    assert!(s.grid.control().is_none());
}

#[test]
fn test_teardown_drops_invalid_edit() {
    let mut s = shape_grid();
    s.grid.select(Some(s.perimeter)).unwrap();
    s.grid.set_editor_text("oops").unwrap();
    s.grid.teardown();
    assert_eq!(s.grid.selected(), None);
    assert!(s.grid.tree().get(s.perimeter).unwrap().has_flag(NodeFlags::UNSPECIFIED));
}

#[test]
fn test_aggregate_commit_notifies_parent() {
    let mut s = shape_grid();
    let root = s.grid.tree().root();
    let span = s.grid.append(root, tiny_propgrid::NodeSpec::range("span", "Span", 0.0, 1.0)).unwrap();
    s.grid.expand(span).unwrap();
    let max = s.grid.tree().find("span.max").unwrap();
    while s.events.try_recv().is_ok() {}

    s.grid.select(Some(max)).unwrap();
    s.grid.set_editor_text("5").unwrap();
    assert_eq!(s.grid.commit().unwrap(), Some(span));
    assert!(s.events.try_iter().any(|e| e == GridEvent::ValueCommitted(span)));
    assert!(s.grid.tree().get(span).unwrap().has_flag(NodeFlags::MODIFIED));
}

#[test]
fn test_refused_delete_keeps_dirty_edit() {
    let mut s = shape_grid();
    s.grid.select(Some(s.perimeter)).unwrap();
    s.grid.set_editor_text("3").unwrap();
    while s.events.try_recv().is_ok() {}

    let root = s.grid.tree().root();
    let err = s.grid.delete(root).unwrap_err();
    assert!(matches!(err, GridError::StructuralViolation(_)));

    assert_eq!(s.grid.selected(), Some(s.perimeter));
    assert_eq!(s.grid.selection_state(), SelectionState::Dirty);
    assert_eq!(s.grid.control().unwrap().text, "3");
    let node = s.grid.tree().get(s.perimeter).unwrap();
    assert!(node.has_flag(NodeFlags::UNSPECIFIED));
    assert!(!node.has_flag(NodeFlags::MODIFIED));
    assert!(s.events.try_recv().is_err());
}

#[test]
fn test_fixed_part_cannot_be_deleted() {
    let mut s = shape_grid();
    let root = s.grid.tree().root();
    s.grid.append(root, NodeSpec::range("span", "Span", 0.0, 1.0)).unwrap();
    s.grid.expand(s.grid.tree().find("span").unwrap()).unwrap();
    let min = s.grid.tree().find("span.min").unwrap();
    s.grid.select(Some(min)).unwrap();

    assert!(matches!(
        s.grid.delete(min),
        Err(GridError::StructuralViolation(_))
    ));
    assert_eq!(s.grid.selected(), Some(min));
    assert!(s.grid.tree().get(min).is_some());
}
