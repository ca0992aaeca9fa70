//! Per-call identity registry backing cycle and sharing detection.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::arena::NodeId;

/// Assigns dense non-negative indices to node identities in traversal order.
///
/// A registry is scoped to exactly one flatten or extraction call and is never
/// shared across calls; reconstruction uses an index-keyed cache as its
/// counterpart.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indices: HashMap<NodeId, usize>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        IndexRegistry::default()
    }

    /// Returns the index assigned to `node` and whether this call assigned it.
    /// The first registration of an identity receives the next unused index;
    /// later registrations return the same index with `false`.
    pub fn register(&mut self, node: NodeId) -> (usize, bool) {
        let next = self.indices.len();
        match self.indices.entry(node) {
            Entry::Occupied(entry) => (*entry.get(), false),
            Entry::Vacant(entry) => {
                entry.insert(next);
                (next, true)
            }
        }
    }

    /// Number of distinct identities registered so far.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_dense_indices_once() {
        let mut registry = IndexRegistry::new();
        assert_eq!(registry.register(NodeId(7)), (0, true));
        assert_eq!(registry.register(NodeId(3)), (1, true));
        assert_eq!(registry.register(NodeId(7)), (0, false));
        assert_eq!(registry.register(NodeId(3)), (1, false));
        assert_eq!(registry.len(), 2);
    }
}
