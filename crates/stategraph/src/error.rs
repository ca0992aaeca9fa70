//! Typed errors surfaced by the graph engine.

use thiserror::Error;

use crate::path::Path;

/// Engine error surfaced to the direct caller of the failing operation.
///
/// Every mutating operation is all-or-nothing: on error the live graph is
/// left exactly as it was, and no partial descriptor or node is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An attribute could not be classified as leaf, child, or static field
    /// during a traversal or while constructing a node record.
    #[error("cannot classify attributes at '{at}': {detail}")]
    Classification { at: Path, detail: String },

    /// Reconstruction required a leaf path that no supplied state contains.
    #[error("leaf '{path}' is required by the descriptor but missing from every supplied state")]
    MissingLeaf { path: Path },

    /// A supplied state entry does not correspond to an existing leaf slot,
    /// or its value disagrees structurally with the slot.
    #[error("state entry '{path}' does not match the graph structure: {detail}")]
    StructureMismatch { path: Path, detail: String },

    /// A descriptor index is inconsistent with the pre-order assignment made
    /// by the producing traversal (unresolvable back-reference or duplicate).
    #[error("back-reference to index {index} does not name a previously described node")]
    DanglingReference { index: usize },
}

pub type GraphResult<T> = Result<T, GraphError>;
