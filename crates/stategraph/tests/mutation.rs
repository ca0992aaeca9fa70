use anyhow::Result;
use stategraph::{pop, split, update, Filter, GraphError, NodeArena, NodeId, Path, State, Value};

fn model(arena: &mut NodeArena) -> Result<NodeId> {
    let cell = arena
        .build("cell")
        .leaf("h", "transient", Value::tensor([2], vec![0.0, 0.0]))?
        .leaf("w", "parameter", Value::tensor([2], vec![0.3, 0.7]))?
        .finish();
    let root = arena
        .build("rnn")
        .leaf("embed", "parameter", Value::tensor([2], vec![1.0, -1.0]))?
        .child("cell", cell)?
        .finish();
    Ok(root)
}

#[test]
fn pop_extracts_matching_leaves_and_blanks_them() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;

    let popped = pop(&mut arena, root, &[Filter::tag("transient")])?;
    let paths: Vec<String> = popped.paths().map(|p| p.to_string()).collect();
    assert_eq!(paths, vec!["cell/h"]);
    assert_eq!(
        popped.get(&Path::from("cell/h")),
        Some(&Value::tensor([2], vec![0.0, 0.0]))
    );

    // the slot stays declared but now holds the empty placeholder
    let (states, graphdef) = split(&arena, root, &[])?;
    assert_eq!(states[0].get(&Path::from("cell/h")), Some(&Value::Empty));
    assert_eq!(graphdef.leaf_paths().len(), 3);
    assert_eq!(
        states[0].get(&Path::from("cell/w")),
        Some(&Value::tensor([2], vec![0.3, 0.7]))
    );
    Ok(())
}

#[test]
fn update_restores_popped_leaves() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;
    let (before, _) = split(&arena, root, &[])?;

    let popped = pop(&mut arena, root, &[Filter::tag("transient")])?;
    update(&mut arena, root, &[popped])?;

    let (after, _) = split(&arena, root, &[])?;
    assert_eq!(before[0], after[0]);
    Ok(())
}

#[test]
fn pop_without_matches_leaves_graph_unchanged() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;
    let (before, _) = split(&arena, root, &[])?;

    let popped = pop(&mut arena, root, &[Filter::tag("optimizer")])?;
    assert!(popped.is_empty());
    let (after, _) = split(&arena, root, &[])?;
    assert_eq!(before[0], after[0]);
    Ok(())
}

#[test]
fn update_writes_values_in_place() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;

    let state: State = [(Path::from("embed"), Value::tensor([2], vec![5.0, 6.0]))]
        .into_iter()
        .collect();
    update(&mut arena, root, &[state])?;

    let leaf = arena.leaf(root, "embed").unwrap();
    assert_eq!(leaf.value, Value::tensor([2], vec![5.0, 6.0]));
    assert_eq!(leaf.tag, "parameter");
    Ok(())
}

#[test]
fn update_is_atomic_on_structure_mismatch() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;
    let (before, _) = split(&arena, root, &[])?;

    let mut state = State::new();
    state.insert(Path::from("embed"), Value::tensor([2], vec![9.0, 9.0]));
    state.insert(Path::from("cell/missing"), Value::Scalar(1.0));

    let err = update(&mut arena, root, &[state]).unwrap_err();
    assert!(matches!(err, GraphError::StructureMismatch { .. }));

    // the valid write in the same batch must not have landed
    let (after, _) = split(&arena, root, &[])?;
    assert_eq!(before[0], after[0]);
    Ok(())
}

#[test]
fn update_rejects_shape_changes() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;

    let mut state = State::new();
    state.insert(Path::from("embed"), Value::tensor([3], vec![1.0, 2.0, 3.0]));
    let err = update(&mut arena, root, &[state]).unwrap_err();
    assert!(matches!(err, GraphError::StructureMismatch { .. }));
    Ok(())
}

#[test]
fn update_rejects_duplicate_paths_across_states() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;
    let (before, _) = split(&arena, root, &[])?;

    let first: State = [(Path::from("embed"), Value::tensor([2], vec![1.0, 1.0]))]
        .into_iter()
        .collect();
    let second: State = [(Path::from("embed"), Value::tensor([2], vec![2.0, 2.0]))]
        .into_iter()
        .collect();

    let err = update(&mut arena, root, &[first, second]).unwrap_err();
    assert!(matches!(err, GraphError::StructureMismatch { .. }));
    let (after, _) = split(&arena, root, &[])?;
    assert_eq!(before[0], after[0]);
    Ok(())
}

#[test]
fn update_rejects_non_leaf_targets() -> Result<()> {
    let mut arena = NodeArena::new();
    let root = model(&mut arena)?;

    // "cell" resolves to a child, not a leaf slot
    let state: State = [(Path::from("cell"), Value::Scalar(0.0))].into_iter().collect();
    let err = update(&mut arena, root, &[state]).unwrap_err();
    assert!(matches!(err, GraphError::StructureMismatch { .. }));
    Ok(())
}
