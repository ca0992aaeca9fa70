use std::collections::HashSet;

use anyhow::Result;
use stategraph::{split, Filter, GraphError, NodeArena, NodeId, Tag, Value};

fn mixed_node(arena: &mut NodeArena) -> Result<NodeId> {
    let norm = arena
        .build("norm")
        .leaf("mean", "batch_stat", Value::Scalar(0.0))?
        .leaf("scale", "parameter", Value::Scalar(1.0))?
        .finish();
    let root = arena
        .build("model")
        .leaf("w", "parameter", Value::tensor([2], vec![0.1, 0.2]))?
        .leaf("cache", "transient", Value::Empty)?
        .child("norm", norm)?
        .finish();
    Ok(root)
}

#[test]
fn filters_partition_leaves_with_remainder() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = mixed_node(&mut arena)?;
    let (states, graphdef) = split(&arena, root, &[Filter::tag("parameter")])?;
    assert_eq!(states.len(), 2);

    let params: Vec<String> = states[0].paths().map(|p| p.to_string()).collect();
    assert_eq!(params, vec!["w", "norm/scale"]);
    let rest: Vec<String> = states[1].paths().map(|p| p.to_string()).collect();
    assert_eq!(rest, vec!["cache", "norm/mean"]);

    // strict partition: pairwise disjoint, union equals the declared slots
    let mut union: HashSet<String> = HashSet::new();
    for state in &states {
        for path in state.paths() {
            assert!(union.insert(path.to_string()), "path {path} appears twice");
        }
    }
    let declared: HashSet<String> = graphdef
        .leaf_paths()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(union, declared);
    Ok(())
}

#[test]
fn first_matching_filter_wins() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = mixed_node(&mut arena)?;
    let (states, _) = split(
        &arena,
        root,
        &[Filter::Everything, Filter::tag("parameter")],
    )?;
    assert_eq!(states.len(), 3);
    assert_eq!(states[0].len(), 4);
    assert!(states[1].is_empty());
    assert!(states[2].is_empty());
    Ok(())
}

#[test]
fn empty_placeholder_leaves_appear_in_states() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = mixed_node(&mut arena)?;
    let (states, _) = split(&arena, root, &[])?;
    assert!(states[0].contains(&stategraph::Path::from("cache")));
    assert!(states[0]
        .get(&stategraph::Path::from("cache"))
        .unwrap()
        .is_empty());
    Ok(())
}

#[test]
fn merge_accepts_partitioned_states() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = mixed_node(&mut arena)?;
    let (states, graphdef) = split(&arena, root, &[Filter::tag("parameter")])?;
    let rebuilt = graphdef.merge(&mut arena, &states)?;
    let (all, _) = split(&arena, rebuilt, &[])?;
    assert_eq!(all[0].len(), 4);
    Ok(())
}

#[test]
fn merge_without_required_state_fails_and_rolls_back() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = mixed_node(&mut arena)?;
    let (states, graphdef) = split(&arena, root, &[Filter::tag("parameter")])?;

    let before = arena.len();
    let err = graphdef.merge(&mut arena, &states[..1]).unwrap_err();
    assert!(matches!(err, GraphError::MissingLeaf { .. }));
    assert_eq!(arena.len(), before, "failed merge must not leave records");
    Ok(())
}

#[test]
fn filter_combinators_match_expected_tags() {
    let parameter = Tag::new("parameter");
    let transient = Tag::new("transient");
    assert!(Filter::tag("parameter").matches(&parameter));
    assert!(!Filter::tag("parameter").matches(&transient));
    assert!(Filter::Not(Box::new(Filter::tag("parameter"))).matches(&transient));
    assert!(
        Filter::Any(vec![Filter::tag("parameter"), Filter::tag("transient")])
            .matches(&transient)
    );
    assert!(Filter::Everything.matches(&parameter));
    assert!(!Filter::Nothing.matches(&parameter));
}

#[test]
fn builder_rejects_unclassifiable_attributes() {
    let mut arena = NodeArena::new();
    let root = arena.build("root").finish();

    match arena.add_child(root, "sub", NodeId(42)) {
        Err(GraphError::Classification { .. }) => {}
        other => panic!("expected a classification failure, got {other:?}"),
    }

    match arena.build("other").child("sub", NodeId(42)) {
        Err(GraphError::Classification { .. }) => {}
        Ok(_) => panic!("expected a classification failure"),
        Err(other) => panic!("unexpected error {other:?}"),
    }

    let builder = arena
        .build("dup")
        .leaf("w", "parameter", Value::Scalar(1.0))
        .expect("first leaf is valid");
    match builder.leaf("w", "parameter", Value::Scalar(2.0)) {
        Err(GraphError::Classification { .. }) => {}
        Ok(_) => panic!("duplicate attribute names must be rejected"),
        Err(other) => panic!("unexpected error {other:?}"),
    }

    match arena.build("bad").leaf("a/b", "parameter", Value::Empty) {
        Err(GraphError::Classification { .. }) => {}
        Ok(_) => panic!("separator in attribute names must be rejected"),
        Err(other) => panic!("unexpected error {other:?}"),
    }
}
