pub mod arena;
pub mod error;
pub mod filter;
pub mod graphdef;
pub mod path;
pub mod registry;
pub mod split;
pub mod state;
pub mod update;
pub mod value;
mod env;
mod merge;

pub use arena::{Attr, AttrKind, NodeArena, NodeBuilder, NodeId, NodeRecord};
pub use error::{GraphError, GraphResult};
pub use filter::Filter;
pub use graphdef::{ChildDef, DescriptorSerdeError, GraphDef, GraphFingerprint, NodeDef};
pub use path::Path;
pub use split::{clone_node, split};
pub use state::State;
pub use update::{pop, update};
pub use value::{Leaf, StaticValue, Tag, TensorValue, Value};
