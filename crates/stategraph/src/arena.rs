//! Arena storage for live node graphs.
//!
//! A live graph is a set of [`NodeRecord`]s owned by a [`NodeArena`] and
//! addressed by stable [`NodeId`] handles. Child attributes store handles
//! rather than references, so several attributes (on the same or different
//! nodes, including a node's own attributes) may name the identical record.
//! Object identity is therefore handle equality, which is what the identity
//! registry and the reconstruction cache key on.
//!
//! Records are append-only for the lifetime of an arena: every handle an
//! arena has minted stays valid for it. Handles from a different arena are
//! detected where possible (out-of-range) and surface as classification
//! errors during traversal.

use crate::error::{GraphError, GraphResult};
use crate::path::{is_valid_segment, Path};
use crate::value::{Leaf, StaticValue, Tag, Value};

/// Stable handle to a node record within one [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// The closed set of attribute kinds a node may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Static,
    Leaf,
    Child,
}

/// One named attribute of a node record.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// Opaque value copied verbatim into descriptors, never traversed.
    Static(StaticValue),
    /// Tagged leaf value addressed by path in flattened states.
    Leaf(Leaf),
    /// Handle to another node record (or to the owning record itself).
    Child(NodeId),
}

impl Attr {
    pub fn kind(&self) -> AttrKind {
        match self {
            Attr::Static(_) => AttrKind::Static,
            Attr::Leaf(_) => AttrKind::Leaf,
            Attr::Child(_) => AttrKind::Child,
        }
    }
}

/// A mutable node: a constructor identity plus named attributes in stable
/// definition order.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    kind: String,
    attrs: Vec<(String, Attr)>,
}

impl NodeRecord {
    pub(crate) fn new(kind: impl Into<String>) -> Self {
        NodeRecord {
            kind: kind.into(),
            attrs: Vec::new(),
        }
    }

    /// Constructor/type identity recorded in descriptors.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// All attributes in definition order.
    pub fn attrs(&self) -> &[(String, Attr)] {
        &self.attrs
    }

    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attrs
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, attr)| attr)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Attr> {
        self.attrs
            .iter_mut()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, attr)| attr)
    }

    pub(crate) fn push_attr(&mut self, name: &str, attr: Attr) -> GraphResult<()> {
        if !is_valid_segment(name) {
            return Err(GraphError::Classification {
                at: Path::root(),
                detail: format!("invalid attribute name '{name}'"),
            });
        }
        if self.get(name).is_some() {
            return Err(GraphError::Classification {
                at: Path::root(),
                detail: format!("duplicate attribute name '{name}'"),
            });
        }
        self.attrs.push((name.to_string(), attr));
        Ok(())
    }
}

/// One node's attributes grouped by kind, in definition order within each
/// group. Produced by the classifier; traversals consume groups in the fixed
/// order statics, leaves, children.
pub(crate) struct ClassifiedAttrs<'a> {
    pub(crate) statics: Vec<(&'a str, &'a StaticValue)>,
    pub(crate) leaves: Vec<(&'a str, &'a Leaf)>,
    pub(crate) children: Vec<(&'a str, NodeId)>,
}

/// Owns the records of one live graph.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<NodeRecord>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        (id.0 as usize) < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.0 as usize)
    }

    /// Starts building a node of the given constructor identity. Attributes
    /// are validated as they are added; `finish` mints the handle.
    pub fn build(&mut self, kind: impl Into<String>) -> NodeBuilder<'_> {
        NodeBuilder {
            arena: self,
            record: NodeRecord::new(kind),
        }
    }

    /// Appends a child attribute to an existing node. This is how cyclic
    /// references are introduced: the child may be any live handle, including
    /// `node` itself.
    pub fn add_child(&mut self, node: NodeId, name: &str, child: NodeId) -> GraphResult<()> {
        if !self.contains(child) {
            return Err(GraphError::Classification {
                at: Path::root(),
                detail: format!("child attribute '{name}' references handle {child:?} outside this arena"),
            });
        }
        let record = self.expect_node_mut(node)?;
        record.push_attr(name, Attr::Child(child))
    }

    /// Looks up a leaf attribute by name.
    pub fn leaf(&self, node: NodeId, name: &str) -> Option<&Leaf> {
        match self.get(node)?.get(name)? {
            Attr::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Looks up a child attribute by name.
    pub fn child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        match self.get(node)?.get(name)? {
            Attr::Child(child) => Some(*child),
            _ => None,
        }
    }

    /// Looks up a static field by name.
    pub fn static_field(&self, node: NodeId, name: &str) -> Option<&StaticValue> {
        match self.get(node)?.get(name)? {
            Attr::Static(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn insert(&mut self, record: NodeRecord) -> NodeId {
        debug_assert!(self.nodes.len() < u32::MAX as usize);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(record);
        id
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub(crate) fn expect_node(&self, id: NodeId, at: &Path) -> GraphResult<&NodeRecord> {
        self.get(id).ok_or_else(|| GraphError::Classification {
            at: at.clone(),
            detail: format!("node handle {id:?} is not part of this arena"),
        })
    }

    fn expect_node_mut(&mut self, id: NodeId) -> GraphResult<&mut NodeRecord> {
        match self.nodes.get_mut(id.0 as usize) {
            Some(record) => Ok(record),
            None => Err(GraphError::Classification {
                at: Path::root(),
                detail: format!("node handle {id:?} is not part of this arena"),
            }),
        }
    }

    /// Classifies every attribute of `record`, validating child handles
    /// against this arena. `at` names the record's position for diagnostics.
    pub(crate) fn classify_node<'a>(
        &self,
        at: &Path,
        record: &'a NodeRecord,
    ) -> GraphResult<ClassifiedAttrs<'a>> {
        let mut statics = Vec::new();
        let mut leaves = Vec::new();
        let mut children = Vec::new();
        for (name, attr) in record.attrs() {
            match attr {
                Attr::Static(value) => statics.push((name.as_str(), value)),
                Attr::Leaf(leaf) => leaves.push((name.as_str(), leaf)),
                Attr::Child(child) => {
                    if !self.contains(*child) {
                        return Err(GraphError::Classification {
                            at: at.clone(),
                            detail: format!(
                                "child attribute '{name}' references handle {child:?} outside this arena"
                            ),
                        });
                    }
                    children.push((name.as_str(), *child));
                }
            }
        }
        Ok(ClassifiedAttrs {
            statics,
            leaves,
            children,
        })
    }

    /// Swaps a leaf's value, returning the previous one. Callers must have
    /// resolved the slot beforehand.
    pub(crate) fn replace_leaf_value(&mut self, node: NodeId, name: &str, value: Value) -> Value {
        let record = self
            .nodes
            .get_mut(node.0 as usize)
            .expect("leaf write against a handle outside this arena");
        match record.get_mut(name) {
            Some(Attr::Leaf(leaf)) => std::mem::replace(&mut leaf.value, value),
            _ => panic!("resolved attribute '{name}' is not a leaf"),
        }
    }
}

/// Incremental node constructor returned by [`NodeArena::build`].
pub struct NodeBuilder<'a> {
    arena: &'a mut NodeArena,
    record: NodeRecord,
}

impl<'a> NodeBuilder<'a> {
    /// Adds an opaque static field.
    pub fn static_field(mut self, name: &str, value: impl Into<StaticValue>) -> GraphResult<Self> {
        self.record.push_attr(name, Attr::Static(value.into()))?;
        Ok(self)
    }

    /// Adds a tagged leaf.
    pub fn leaf(mut self, name: &str, tag: impl Into<Tag>, value: Value) -> GraphResult<Self> {
        self.record
            .push_attr(name, Attr::Leaf(Leaf::new(tag, value)))?;
        Ok(self)
    }

    /// Adds a child reference to an already-built node. Self- and
    /// back-references to the node under construction are added after
    /// `finish` via [`NodeArena::add_child`].
    pub fn child(mut self, name: &str, child: NodeId) -> GraphResult<Self> {
        if !self.arena.contains(child) {
            return Err(GraphError::Classification {
                at: Path::root(),
                detail: format!("child attribute '{name}' references handle {child:?} outside this arena"),
            });
        }
        self.record.push_attr(name, Attr::Child(child))?;
        Ok(self)
    }

    /// Commits the record to the arena and returns its handle.
    pub fn finish(self) -> NodeId {
        self.arena.insert(self.record)
    }
}
