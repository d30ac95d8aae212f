//! Error types for hierarchy construction and validation.

use thiserror::Error;

use crate::{EntityId, EntityLevel};

/// Errors raised while parsing or validating a hierarchy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HierarchyError {
    /// Two nodes share an id
    #[error("Duplicate entity id: {0}")]
    DuplicateId(EntityId),

    /// Consumption or renewable energy below zero
    #[error("Negative {field} on {id}: {value}")]
    NegativeQuantity {
        id: EntityId,
        field: &'static str,
        value: f64,
    },

    /// NaN or infinite quantity
    #[error("Non-finite {field} on {id}")]
    NonFiniteQuantity { id: EntityId, field: &'static str },

    /// A child sits at or above its parent's level
    #[error("{child} ({child_level}) cannot sit under {parent} ({parent_level})")]
    LevelOrder {
        parent: EntityId,
        parent_level: EntityLevel,
        child: EntityId,
        child_level: EntityLevel,
    },

    /// Unrecognized level name
    #[error("Unknown entity level: {0}")]
    UnknownLevel(String),

    /// Unrecognized strategy name
    #[error("Unknown allocation strategy: {0}")]
    UnknownStrategy(String),
}
