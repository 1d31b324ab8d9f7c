use std::collections::BTreeMap;

use proptest::prelude::*;
use tiny_propgrid::{GridError, NodeFlags, NodeId, NodeKind, NodeSpec, PropertyTree, TreeOrder, Variant};
use tiny_tree::{IterOrder, IterSpec};

fn labels(tree: &PropertyTree, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    ids.into_iter()
        .map(|id| tree.get(id).unwrap().label.clone())
        .collect()
}

/// Every child's recorded index matches its position, everywhere
fn check_indices(tree: &PropertyTree) {
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let node = tree.get(id).unwrap();
        for (i, &child) in node.children().iter().enumerate() {
            let child_node = tree.get(child).unwrap();
            assert_eq!(child_node.index_in_parent(), i);
            assert_eq!(child_node.parent(), Some(id));
            stack.push(child);
        }
    }
}

fn leaf_multiset(tree: &PropertyTree, order: IterOrder) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for id in tree.iter(IterSpec::properties().with_order(order)) {
        *counts.entry(tree.get(id).unwrap().key().to_string()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_shape_scenario_orderings() {
    let mut tree = PropertyTree::default();
    let root = tree.root();
    let shape = tree.append(root, NodeSpec::category("Shape")).unwrap();
    tree.append(shape, NodeSpec::leaf("perimeter", "Perimeter", "real").unspecified())
        .unwrap();
    tree.append(shape, NodeSpec::leaf("area", "Area", "real").unspecified())
        .unwrap();

    let flat = tree.iter(IterSpec::properties().with_order(IterOrder::Flat));
    assert_eq!(labels(&tree, flat), vec!["Perimeter", "Area"]);

    let categorized = tree.iter(IterSpec::all().with_order(IterOrder::Categorized));
    assert_eq!(labels(&tree, categorized), vec!["Shape", "Perimeter", "Area"]);
    assert_eq!(labels(&tree, tree.get(shape).unwrap().children().to_vec()), vec!["Perimeter", "Area"]);
}

#[test]
fn test_category_names_fold() {
    let mut tree = PropertyTree::default();
    let root = tree.root();
    let first = tree.append(root, NodeSpec::category("Shape")).unwrap();
    let again = tree.append(root, NodeSpec::category("Shape")).unwrap();
    assert_eq!(first, again);
    assert_eq!(tree.top_level().len(), 1);
}

#[test]
fn test_expand_collapse_is_idempotent() {
    let mut tree = PropertyTree::default();
    let root = tree.root();
    let cat = tree.append(root, NodeSpec::category("Cat")).unwrap();
    let range = tree.append(cat, NodeSpec::range("span", "Span", 0.0, 1.0)).unwrap();
    tree.append(cat, NodeSpec::leaf("after", "After", "int")).unwrap();

    let visible = |tree: &PropertyTree| tree.iter(IterSpec::all().visible()).collect::<Vec<_>>();
    let before = visible(&tree);
    assert!(tree.set_expanded(range, true).unwrap());
    assert_eq!(visible(&tree).len(), before.len() + 2);
    assert!(tree.set_expanded(range, false).unwrap());
    assert_eq!(visible(&tree), before);
    assert!(!tree.set_expanded(range, false).unwrap());
}

#[test]
fn test_modified_reaches_aggregates_only() {
    let mut tree = PropertyTree::default();
    let root = tree.root();
    let cat = tree.append(root, NodeSpec::category("Geometry")).unwrap();
    let range = tree.append(cat, NodeSpec::range("span", "Span", 0.0, 1.0)).unwrap();
    let sibling = tree.append(cat, NodeSpec::leaf("n", "N", "int")).unwrap();
    let min = tree.find("span.min").unwrap();

    tree.set_value(min, Variant::Real(-4.0)).unwrap();
    let top = tree.mark_modified(min).unwrap();
    assert_eq!(top, range);

    let modified: Vec<NodeId> = tree
        .iter(IterSpec::all())
        .filter(|&id| tree.get(id).unwrap().has_flag(NodeFlags::MODIFIED))
        .collect();
    assert_eq!(modified, vec![range, min]);
    assert!(!tree.get(cat).unwrap().has_flag(NodeFlags::MODIFIED));
    assert!(!tree.get(sibling).unwrap().has_flag(NodeFlags::MODIFIED));
    assert_eq!(
        tree.value(range),
        Some(&Variant::StrList(vec!["-4".into(), "1".into()]))
    );
}

#[derive(Debug, Clone)]
enum Op {
    Category(u8),
    Leaf { category: Option<u8>, name: u8 },
    Range { category: Option<u8>, name: u8 },
    InsertAt { category: Option<u8>, name: u8, index: usize },
    Delete(usize),
    Sort,
    Switch,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4).prop_map(Op::Category),
        (proptest::option::of(0u8..4), 0u8..32).prop_map(|(category, name)| Op::Leaf { category, name }),
        (proptest::option::of(0u8..4), 0u8..32).prop_map(|(category, name)| Op::Range { category, name }),
        (proptest::option::of(0u8..4), 0u8..32, 0usize..8)
            .prop_map(|(category, name, index)| Op::InsertAt { category, name, index }),
        (0usize..64).prop_map(Op::Delete),
        Just(Op::Sort),
        Just(Op::Switch),
    ]
}

proptest! {
    #[test]
    fn prop_structure_invariants_hold(ops in proptest::collection::vec(op(), 1..60)) {
        let mut tree = PropertyTree::default();
        let root = tree.root();
        for op in ops {
            match op {
                Op::Category(c) => {
                    tree.append(root, NodeSpec::category(&format!("C{}", c))).unwrap();
                }
                Op::Leaf { category, name } | Op::Range { category, name } => {
                    let parent = match category {
                        Some(c) => tree.append(root, NodeSpec::category(&format!("C{}", c))).unwrap(),
                        None => root,
                    };
                    let key = format!("p{}", name);
                    let spec = if matches!(op, Op::Range { .. }) {
                        NodeSpec::range(&key, &key, 0.0, 1.0)
                    } else {
                        NodeSpec::leaf(&key, &key, "int")
                    };
                    // Duplicate names are rejected without touching the tree
                    let generation = tree.generation();
                    if tree.append(parent, spec).is_err() {
                        prop_assert_eq!(tree.generation(), generation);
                    }
                }
                Op::InsertAt { category, name, index } => {
                    let parent = match category {
                        Some(c) => tree.append(root, NodeSpec::category(&format!("C{}", c))).unwrap(),
                        None => root,
                    };
                    let index = index % (tree.get(parent).unwrap().children().len() + 1);
                    let key = format!("p{}", name);
                    let generation = tree.generation();
                    match tree.insert(parent, Some(index), NodeSpec::leaf(&key, &key, "int")) {
                        Ok(id) => prop_assert_eq!(tree.get(id).unwrap().index_in_parent(), index),
                        Err(_) => prop_assert_eq!(tree.generation(), generation),
                    }
                }
                Op::Delete(i) => {
                    let all: Vec<NodeId> = tree.iter(IterSpec::all()).collect();
                    if !all.is_empty() {
                        let target = all[i % all.len()];
                        let fixed_part = tree
                            .get(target)
                            .and_then(|n| n.parent())
                            .is_some_and(|p| tree.get(p).unwrap().kind == NodeKind::FixedParent);
                        match tree.delete(target) {
                            Ok(()) => prop_assert!(!fixed_part),
                            Err(err) => {
                                prop_assert!(fixed_part);
                                prop_assert!(matches!(err, GridError::StructuralViolation(_)));
                            }
                        }
                    }
                }
                Op::Sort => tree.sort(None).unwrap(),
                Op::Switch => {
                    let next = if tree.is_categorized() { TreeOrder::Flat } else { TreeOrder::Categorized };
                    prop_assert!(tree.switch_ordering(next));
                }
            }
            check_indices(&tree);
            prop_assert_eq!(
                leaf_multiset(&tree, IterOrder::Flat),
                leaf_multiset(&tree, IterOrder::Categorized)
            );
        }
    }
}
