//! Structural descriptors for flattened node graphs.
//!
//! A descriptor records everything about a graph except its leaf values:
//! constructor identities, static fields, leaf slots (name and tag only), and
//! child topology. Sharing and cycles are expressed through per-node indices
//! assigned in pre-order by the producing traversal: the first visit of a
//! node embeds a nested [`NodeDef`], every later reference is a bare
//! [`ChildDef::Reference`] back to that index. Descriptors are immutable
//! value objects once produced.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::{NodeArena, NodeId};
use crate::error::{GraphError, GraphResult};
use crate::path::Path;
use crate::state::State;
use crate::value::{StaticValue, Tag};

/// Structural description of one distinct node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Constructor/type identity of the node.
    pub kind: String,
    /// Identity index assigned at first visit by the producing traversal.
    pub index: usize,
    /// Opaque fields copied verbatim, in definition order.
    pub static_fields: Vec<(String, StaticValue)>,
    /// Leaf names and tags, in definition order; values live in states.
    pub leaf_slots: Vec<(String, Tag)>,
    /// Child references, in definition order.
    pub children: Vec<(String, ChildDef)>,
}

/// A child entry: a nested descriptor on first visit, or a back-reference to
/// the index of an already-described node (ancestors included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChildDef {
    Node(NodeDef),
    Reference(usize),
}

/// Stable structural digest of a descriptor, suitable as a cache key across
/// transformation boundaries. Leaf values never contribute to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphFingerprint(pub u128);

impl fmt::Display for GraphFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Errors surfaced by the in-memory wire helpers.
#[derive(Debug, Error)]
pub enum DescriptorSerdeError {
    #[error("descriptor JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("descriptor binary serialization failed: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("descriptor failed validation: {0}")]
    Invalid(#[from] GraphError),
}

/// Structural descriptor of a whole graph rooted at one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
    root: NodeDef,
    node_count: usize,
}

impl GraphDef {
    pub(crate) fn new(root: NodeDef, node_count: usize) -> Self {
        GraphDef { root, node_count }
    }

    pub fn root(&self) -> &NodeDef {
        &self.root
    }

    /// Number of distinct nodes described.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Every leaf path declared by the descriptor, in traversal order. The
    /// union of the paths of the states produced alongside this descriptor
    /// equals exactly this set.
    pub fn leaf_paths(&self) -> Vec<Path> {
        let mut out = Vec::new();
        let mut path = Path::root();
        collect_leaf_paths(&self.root, &mut path, &mut out);
        out
    }

    /// Checks the back-reference invariant: every index is described exactly
    /// once, and every reference names an index described at or before it in
    /// pre-order.
    pub fn validate(&self) -> GraphResult<()> {
        let mut described = HashSet::new();
        validate_node(&self.root, &mut described)
    }

    /// Reconstructs a live node graph into `arena` from this descriptor and
    /// the supplied states; see the crate-level operations for the contract.
    pub fn merge(&self, arena: &mut NodeArena, states: &[State]) -> GraphResult<NodeId> {
        crate::merge::merge_into(self, arena, states)
    }

    pub fn fingerprint(&self) -> GraphFingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"stategraph:graphdef:v1");
        hash_node(&self.root, &mut hasher);
        let hash = hasher.finalize();
        let raw: [u8; 16] = hash.as_bytes()[0..16]
            .try_into()
            .expect("blake3 hash prefix length mismatch");
        GraphFingerprint(u128::from_le_bytes(raw))
    }

    pub fn to_json_string(&self) -> Result<String, DescriptorSerdeError> {
        serde_json::to_string_pretty(self).map_err(DescriptorSerdeError::from)
    }

    /// Parses and validates a JSON rendering.
    pub fn from_json_str(src: &str) -> Result<Self, DescriptorSerdeError> {
        let def: GraphDef = serde_json::from_str(src).map_err(DescriptorSerdeError::from)?;
        def.validate()?;
        Ok(def)
    }

    pub fn to_bincode_bytes(&self) -> Result<Vec<u8>, DescriptorSerdeError> {
        bincode::serialize(self).map_err(DescriptorSerdeError::from)
    }

    /// Parses and validates a binary rendering.
    pub fn from_bincode_slice(bytes: &[u8]) -> Result<Self, DescriptorSerdeError> {
        let def: GraphDef = bincode::deserialize(bytes).map_err(DescriptorSerdeError::from)?;
        def.validate()?;
        Ok(def)
    }
}

fn collect_leaf_paths(def: &NodeDef, path: &mut Path, out: &mut Vec<Path>) {
    for (name, _tag) in &def.leaf_slots {
        out.push(path.child(name));
    }
    for (name, child) in &def.children {
        if let ChildDef::Node(node) = child {
            path.push(name);
            collect_leaf_paths(node, path, out);
            path.pop();
        }
    }
}

fn validate_node(def: &NodeDef, described: &mut HashSet<usize>) -> GraphResult<()> {
    if !described.insert(def.index) {
        return Err(GraphError::DanglingReference { index: def.index });
    }
    for (_name, child) in &def.children {
        match child {
            ChildDef::Node(node) => validate_node(node, described)?,
            ChildDef::Reference(index) => {
                if !described.contains(index) {
                    return Err(GraphError::DanglingReference { index: *index });
                }
            }
        }
    }
    Ok(())
}

fn hash_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_static(hasher: &mut blake3::Hasher, value: &StaticValue) {
    match value {
        StaticValue::Bool(b) => {
            hasher.update(&[0u8, *b as u8]);
        }
        StaticValue::Int(i) => {
            hasher.update(&[1u8]);
            hasher.update(&i.to_le_bytes());
        }
        StaticValue::Float(f) => {
            hasher.update(&[2u8]);
            hasher.update(&f.to_le_bytes());
        }
        StaticValue::Str(s) => {
            hasher.update(&[3u8]);
            hash_str(hasher, s);
        }
    }
}

fn hash_node(def: &NodeDef, hasher: &mut blake3::Hasher) {
    hash_str(hasher, &def.kind);
    hasher.update(&(def.index as u64).to_le_bytes());
    hasher.update(&(def.static_fields.len() as u64).to_le_bytes());
    for (name, value) in &def.static_fields {
        hash_str(hasher, name);
        hash_static(hasher, value);
    }
    hasher.update(&(def.leaf_slots.len() as u64).to_le_bytes());
    for (name, tag) in &def.leaf_slots {
        hash_str(hasher, name);
        hash_str(hasher, tag.as_str());
    }
    hasher.update(&(def.children.len() as u64).to_le_bytes());
    for (name, child) in &def.children {
        hash_str(hasher, name);
        match child {
            ChildDef::Node(node) => {
                hasher.update(&[0u8]);
                hash_node(node, hasher);
            }
            ChildDef::Reference(index) => {
                hasher.update(&[1u8]);
                hasher.update(&(*index as u64).to_le_bytes());
            }
        }
    }
}
