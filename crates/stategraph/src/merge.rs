//! Reconstruct engine: descriptor plus states in, live graph out.
//!
//! Reconstruction is two-phase per node, keyed by descriptor index. A node
//! record is allocated (constructor identity, static fields, leaf slots left
//! as empty placeholders) and cached under its index *before* its leaves and
//! children are populated. A self- or ancestor-back-reference encountered
//! later in the same subtree therefore resolves to the still-being-populated
//! record instead of failing or duplicating it, which is what restores shared
//! identity and cycles exactly.

use std::collections::{HashMap, HashSet};

use crate::arena::{Attr, NodeArena, NodeId, NodeRecord};
use crate::error::{GraphError, GraphResult};
use crate::graphdef::{ChildDef, GraphDef, NodeDef};
use crate::path::Path;
use crate::state::State;
use crate::value::{Leaf, Value};

pub(crate) fn merge_into(
    def: &GraphDef,
    arena: &mut NodeArena,
    states: &[State],
) -> GraphResult<NodeId> {
    if crate::env::verify_enabled() {
        def.validate()?;
    }

    // Roll the arena back on any failure: records built by this call are only
    // referenced by records built by this call, so truncation restores the
    // arena exactly.
    let checkpoint = arena.len();
    match build_graph(def, arena, states) {
        Ok(root) => Ok(root),
        Err(err) => {
            arena.truncate(checkpoint);
            Err(err)
        }
    }
}

fn build_graph(def: &GraphDef, arena: &mut NodeArena, states: &[State]) -> GraphResult<NodeId> {
    let mut cache: HashMap<usize, NodeId> = HashMap::new();
    let mut consumed: HashSet<Path> = HashSet::new();
    let mut path = Path::root();
    let root = build_node(def.root(), arena, states, &mut cache, &mut consumed, &mut path)?;

    // Every supplied path must have landed in a leaf slot.
    for state in states {
        for entry_path in state.paths() {
            if !consumed.contains(entry_path) {
                return Err(GraphError::StructureMismatch {
                    path: entry_path.clone(),
                    detail: "path is not a leaf slot of the descriptor".to_string(),
                });
            }
        }
    }
    Ok(root)
}

fn build_node(
    def: &NodeDef,
    arena: &mut NodeArena,
    states: &[State],
    cache: &mut HashMap<usize, NodeId>,
    consumed: &mut HashSet<Path>,
    path: &mut Path,
) -> GraphResult<NodeId> {
    // Allocate: statics verbatim, leaf slots as empty placeholders.
    let mut record = NodeRecord::new(def.kind.clone());
    for (name, value) in &def.static_fields {
        record.push_attr(name, Attr::Static(value.clone()))?;
    }
    for (name, tag) in &def.leaf_slots {
        record.push_attr(name, Attr::Leaf(Leaf::new(tag.clone(), Value::Empty)))?;
    }
    let id = arena.insert(record);
    if cache.insert(def.index, id).is_some() {
        return Err(GraphError::DanglingReference { index: def.index });
    }

    // Populate leaves from the supplied states.
    for (name, _tag) in &def.leaf_slots {
        let leaf_path = path.child(name);
        let mut found: Option<&Value> = None;
        for state in states {
            if let Some(value) = state.get(&leaf_path) {
                if found.is_some() {
                    return Err(GraphError::StructureMismatch {
                        path: leaf_path,
                        detail: "path is supplied by more than one state".to_string(),
                    });
                }
                found = Some(value);
            }
        }
        let value = match found {
            Some(value) => value.clone(),
            None => return Err(GraphError::MissingLeaf { path: leaf_path }),
        };
        arena.replace_leaf_value(id, name, value);
        consumed.insert(leaf_path);
    }

    // Populate children: recurse on first visits, resolve back-references
    // against the cache.
    for (name, child) in &def.children {
        let child_id = match child {
            ChildDef::Node(child_def) => {
                path.push(name);
                let child_id = build_node(child_def, arena, states, cache, consumed, path)?;
                path.pop();
                child_id
            }
            ChildDef::Reference(index) => match cache.get(index) {
                Some(child_id) => *child_id,
                None => return Err(GraphError::DanglingReference { index: *index }),
            },
        };
        arena.add_child(id, name, child_id)?;
    }

    Ok(id)
}
