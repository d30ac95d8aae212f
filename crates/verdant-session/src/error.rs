//! Error types for the allocation session.

use thiserror::Error;
use verdant_allocation::AllocationError;
use verdant_hierarchy::{EntityLevel, HierarchyError};

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur in session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The loaded tree breaks a structural invariant
    #[error("Invalid hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// An edit referenced something that does not exist
    #[error("Rejected edit: {0}")]
    Allocation(#[from] AllocationError),

    /// The level has no toggle (the company level is always visible)
    #[error("Level {0} cannot be toggled")]
    NoToggle(EntityLevel),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
