//! Domain layer: entities and structural rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod graph;
pub mod tree_traits;

pub use arena::{DetachedNode, HierarchyTree, TreeNode};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use graph::{GraphSnapshot, RelationshipGraph};
pub use tree_traits::{TreeNodeConvert, TreeView};
