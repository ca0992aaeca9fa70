//! Flatten engine: live graph in, descriptor plus partitioned states out.
//!
//! The walk is a pre-order depth-first traversal. Each node is registered
//! with the identity registry on first encounter; a later encounter embeds a
//! back-reference instead of redescending, which is what bounds recursion on
//! cyclic graphs. Leaves are routed to the state of the first matching
//! filter, in caller order, with a final remainder bucket for the rest.

use crate::arena::{NodeArena, NodeId};
use crate::error::GraphResult;
use crate::filter::Filter;
use crate::graphdef::{ChildDef, GraphDef, NodeDef};
use crate::path::Path;
use crate::registry::IndexRegistry;
use crate::state::State;

/// Flattens the graph rooted at `root` into flat leaf states plus a
/// structural descriptor.
///
/// With `n >= 1` filters the result carries `n + 1` states, one per filter in
/// caller order plus a final remainder bucket; with no filters, a single state
/// covering every leaf. The returned states' path sets are pairwise disjoint
/// and their union equals the descriptor's leaf-slot set. The arena is not
/// modified; leaf values are cloned into the states.
pub fn split(
    arena: &NodeArena,
    root: NodeId,
    filters: &[Filter],
) -> GraphResult<(Vec<State>, GraphDef)> {
    let bucket_count = if filters.is_empty() {
        1
    } else {
        filters.len() + 1
    };
    let mut states = vec![State::new(); bucket_count];
    let mut registry = IndexRegistry::new();
    let mut path = Path::root();

    let (index, is_new) = registry.register(root);
    debug_assert!(is_new && index == 0);
    let root_def = flatten_node(
        arena,
        root,
        index,
        filters,
        &mut registry,
        &mut path,
        &mut states,
    )?;
    let graphdef = GraphDef::new(root_def, registry.len());
    Ok((states, graphdef))
}

/// Structural deep copy of the graph rooted at `root`, preserving its
/// internal sharing and cycle topology while minting fresh identities.
pub fn clone_node(arena: &mut NodeArena, root: NodeId) -> GraphResult<NodeId> {
    let (states, graphdef) = split(arena, root, &[])?;
    graphdef.merge(arena, &states)
}

fn flatten_node(
    arena: &NodeArena,
    node: NodeId,
    index: usize,
    filters: &[Filter],
    registry: &mut IndexRegistry,
    path: &mut Path,
    states: &mut [State],
) -> GraphResult<NodeDef> {
    let record = arena.expect_node(node, path)?;
    let classified = arena.classify_node(path, record)?;

    let mut static_fields = Vec::with_capacity(classified.statics.len());
    for (name, value) in &classified.statics {
        static_fields.push((name.to_string(), (*value).clone()));
    }

    let mut leaf_slots = Vec::with_capacity(classified.leaves.len());
    for (name, leaf) in &classified.leaves {
        let bucket = filters
            .iter()
            .position(|filter| filter.matches(&leaf.tag))
            .unwrap_or(filters.len());
        states[bucket].insert(path.child(name), leaf.value.clone());
        leaf_slots.push((name.to_string(), leaf.tag.clone()));
    }

    let mut children = Vec::with_capacity(classified.children.len());
    for (name, child_id) in &classified.children {
        let (child_index, is_new) = registry.register(*child_id);
        let entry = if is_new {
            path.push(name);
            let child_def = flatten_node(
                arena,
                *child_id,
                child_index,
                filters,
                registry,
                path,
                states,
            )?;
            path.pop();
            ChildDef::Node(child_def)
        } else {
            ChildDef::Reference(child_index)
        };
        children.push((name.to_string(), entry));
    }

    Ok(NodeDef {
        kind: record.kind().to_string(),
        index,
        static_fields,
        leaf_slots,
        children,
    })
}
