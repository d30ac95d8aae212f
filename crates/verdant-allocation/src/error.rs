//! Error types for allocation edits.

use thiserror::Error;
use verdant_hierarchy::EntityId;

/// Why an edit could not be applied. The tree is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// No node with this id in the tree
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The child is not among the parent's visible children
    #[error("{child} is not a visible child of {parent}")]
    NotAVisibleChild { parent: EntityId, child: EntityId },

    /// No flat-list item with this id
    #[error("Item not found: {0}")]
    ItemNotFound(EntityId),
}
