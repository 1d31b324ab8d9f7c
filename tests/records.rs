use std::sync::Arc;

use tiny_propgrid::{
    ChoiceSet, EngineContext, GridError, NodeKind, NodeSpec, PropertyGrid, PropertyRecord, Variant,
};

fn sample(grid: &mut PropertyGrid, context: &EngineContext) {
    let root = grid.tree().root();
    let shape = grid.append(root, NodeSpec::category("Shape")).unwrap();
    grid.append(
        shape,
        NodeSpec::leaf("perimeter", "Perimeter", "real")
            .with_value(12.5)
            .with_help("Outline length"),
    )
    .unwrap();
    grid.append(shape, NodeSpec::range("span", "Span", 1.0, 2.0)).unwrap();
    let units = context.publish_choices("units", &["mm", "cm", "m"]);
    grid.append(shape, NodeSpec::leaf("unit", "Unit", "choice").with_choices(units).with_value(2i64))
        .unwrap();
    grid.append(
        shape,
        NodeSpec::leaf("layers", "Layers", "multichoice")
            .with_choices(ChoiceSet::from_labels(&["Grid", "Axes"]))
            .with_value(Variant::StrList(vec!["Axes".into()])),
    )
    .unwrap();
}

#[test]
fn test_json_round_trip_rebuilds_hierarchy() {
    let context = Arc::new(EngineContext::new());
    let mut source = PropertyGrid::new(context.clone());
    sample(&mut source, &context);
    let json = source.save_json().unwrap();

    // Plain JSON array of records
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed.as_array().is_some_and(|a| a.len() >= 6));

    let mut target = PropertyGrid::new(context.clone());
    target.load_json(&json).unwrap();
    let tree = target.tree();

    let perimeter = tree.find("perimeter").unwrap();
    let node = tree.get(perimeter).unwrap();
    assert_eq!(node.value, Variant::Real(12.5));
    assert_eq!(node.help.as_deref(), Some("Outline length"));
    assert_eq!(tree.get(node.parent().unwrap()).unwrap().label, "Shape");

    let span = tree.find("span").unwrap();
    assert_eq!(tree.get(span).unwrap().kind, NodeKind::FixedParent);
    assert_eq!(tree.get_real(tree.find("span.max").unwrap()), 2.0);

    let unit = tree.get(tree.find("unit").unwrap()).unwrap();
    let shared = context.choices().get("units").unwrap();
    assert!(unit.choices.as_ref().unwrap().ptr_eq(&shared));

    let layers = tree.get(tree.find("layers").unwrap()).unwrap();
    assert_eq!(layers.choices.as_ref().unwrap().len(), 2);

    assert_eq!(target.save_records(), source.save_records());
}

#[test]
fn test_failed_load_changes_nothing() {
    let context = Arc::new(EngineContext::new());
    let mut grid = PropertyGrid::new(context);
    let root = grid.tree().root();
    grid.append(root, NodeSpec::leaf("existing", "Existing", "int")).unwrap();
    let before = grid.save_records();

    let records = vec![
        PropertyRecord {
            name: "fresh".into(),
            label: "Fresh".into(),
            value_type: "int".into(),
            value: "1".into(),
            attributes: String::new(),
            choice_set: None,
        },
        PropertyRecord {
            name: "existing".into(),
            label: "Again".into(),
            value_type: "int".into(),
            value: "2".into(),
            attributes: String::new(),
            choice_set: None,
        },
    ];
    let err = grid.load_records(&records).unwrap_err();
    assert!(matches!(err, GridError::DuplicateName(_)));
    assert_eq!(grid.save_records(), before);
    assert!(grid.tree().find("fresh").is_none());
}

#[test]
fn test_shared_choices_outlive_one_owner() {
    let context = Arc::new(EngineContext::new());
    let first = context.publish_choices("sizes", &["S", "M"]);
    let second = context.publish_choices("sizes", &["ignored"]);
    assert!(first.ptr_eq(&second));
    assert_eq!(second.len(), 2);

    drop(first);
    assert!(context.choices().is_live("sizes"));
    assert_eq!(context.choices().get("sizes").unwrap().entries()[1].label, "M");

    drop(second);
    assert!(!context.choices().is_live("sizes"));
}
