//! In-place mutation of live graphs: leaf extraction and leaf write-back.
//!
//! Both operations resolve everything first against a read-only view and only
//! then mutate, so a failing call leaves the graph exactly as it was.

use std::collections::HashSet;

use crate::arena::{Attr, NodeArena, NodeId};
use crate::error::{GraphError, GraphResult};
use crate::filter::Filter;
use crate::path::Path;
use crate::registry::IndexRegistry;
use crate::state::State;
use crate::value::Value;

/// Removes every leaf whose tag matches any of `filters` from the graph
/// rooted at `root`, replacing each with the empty placeholder, and returns
/// the removed values as a state keyed by the same paths a flatten would
/// assign. Children are traversed but never removed. An empty filter list
/// matches nothing; the graph is then untouched and the state empty.
pub fn pop(arena: &mut NodeArena, root: NodeId, filters: &[Filter]) -> GraphResult<State> {
    let mut registry = IndexRegistry::new();
    let mut path = Path::root();
    let mut matches: Vec<(NodeId, String, Path)> = Vec::new();
    resolve_matches(arena, root, filters, &mut registry, &mut path, &mut matches)?;

    let mut state = State::new();
    for (node, name, leaf_path) in matches {
        let removed = arena.replace_leaf_value(node, &name, Value::Empty);
        state.insert(leaf_path, removed);
    }
    Ok(state)
}

/// Writes the leaf values carried by `states` into the graph rooted at
/// `root`, leaving tags and structure untouched.
///
/// The operation is atomic: every supplied path must resolve to an existing
/// leaf slot of compatible structural shape, and each path may be supplied at
/// most once across all states; otherwise a [`GraphError::StructureMismatch`]
/// is raised and no write is applied.
pub fn update(arena: &mut NodeArena, root: NodeId, states: &[State]) -> GraphResult<()> {
    arena.expect_node(root, &Path::root())?;

    let mut seen: HashSet<&Path> = HashSet::new();
    let mut writes: Vec<(NodeId, String, Value)> = Vec::new();
    for state in states {
        for (entry_path, value) in state.iter() {
            if !seen.insert(entry_path) {
                return Err(GraphError::StructureMismatch {
                    path: entry_path.clone(),
                    detail: "path is supplied by more than one state".to_string(),
                });
            }
            let (node, name) = resolve_slot(arena, root, entry_path)?;
            let existing = arena
                .leaf(node, &name)
                .expect("resolved slot disappeared during update");
            if !existing.value.structure_matches(value) {
                return Err(GraphError::StructureMismatch {
                    path: entry_path.clone(),
                    detail: "supplied value disagrees with the slot's structural shape"
                        .to_string(),
                });
            }
            writes.push((node, name, value.clone()));
        }
    }

    for (node, name, value) in writes {
        arena.replace_leaf_value(node, &name, value);
    }
    Ok(())
}

/// Pre-order walk collecting the location of every filter-matching leaf.
/// Read-only; all traversal errors surface here, before any mutation.
fn resolve_matches(
    arena: &NodeArena,
    node: NodeId,
    filters: &[Filter],
    registry: &mut IndexRegistry,
    path: &mut Path,
    matches: &mut Vec<(NodeId, String, Path)>,
) -> GraphResult<()> {
    let (_index, is_new) = registry.register(node);
    if !is_new {
        return Ok(());
    }
    let record = arena.expect_node(node, path)?;
    let classified = arena.classify_node(path, record)?;

    for (name, leaf) in &classified.leaves {
        if filters.iter().any(|filter| filter.matches(&leaf.tag)) {
            matches.push((node, name.to_string(), path.child(name)));
        }
    }
    for (name, child_id) in &classified.children {
        path.push(name);
        resolve_matches(arena, *child_id, filters, registry, path, matches)?;
        path.pop();
    }
    Ok(())
}

/// Resolves a path to the node and attribute name of an existing leaf slot.
fn resolve_slot(arena: &NodeArena, root: NodeId, path: &Path) -> GraphResult<(NodeId, String)> {
    let segments = path.segments();
    let (leaf_name, parents) = match segments.split_last() {
        Some(split) => split,
        None => {
            return Err(GraphError::StructureMismatch {
                path: path.clone(),
                detail: "the empty path does not address a leaf slot".to_string(),
            })
        }
    };

    let mut current = root;
    for segment in parents {
        let record = arena.expect_node(current, path)?;
        current = match record.get(segment) {
            Some(Attr::Child(child)) => *child,
            Some(_) => {
                return Err(GraphError::StructureMismatch {
                    path: path.clone(),
                    detail: format!("segment '{segment}' is not a child attribute"),
                })
            }
            None => {
                return Err(GraphError::StructureMismatch {
                    path: path.clone(),
                    detail: format!("no attribute named '{segment}'"),
                })
            }
        };
    }

    let record = arena.expect_node(current, path)?;
    match record.get(leaf_name) {
        Some(Attr::Leaf(_)) => Ok((current, leaf_name.clone())),
        Some(_) => Err(GraphError::StructureMismatch {
            path: path.clone(),
            detail: format!("attribute '{leaf_name}' is not a leaf"),
        }),
        None => Err(GraphError::StructureMismatch {
            path: path.clone(),
            detail: format!("no attribute named '{leaf_name}'"),
        }),
    }
}
