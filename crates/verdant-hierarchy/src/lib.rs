//! Verdant Organization Hierarchy
//!
//! The consumption hierarchy that renewable energy credits are allocated
//! across: company → region → country → state → city → facility → resource.
//!
//! # Data Model
//!
//! Each [`Entity`] carries a fixed `consumption` and a mutable
//! `renewable_energy`, both in kWh. A node with children also carries an
//! [`Allocation`] saying how its renewable pool relates to its children's:
//! balanced (one percentage pushed down), percentage or exact (manual
//! per-child values).
//!
//! # Visibility
//!
//! Levels can be hidden. A hidden level's nodes are elided from the visible
//! tree and their children spliced into the parent's visible list. The
//! stored tree never changes; [`LevelVisibility`] is passed explicitly to
//! every computation that depends on it.

mod coverage;
mod entity;
mod error;
mod level;
mod tree;
mod visible;

pub use coverage::{coverage, CoverageMode};
pub use entity::{percentage_of, Allocation, AllocationStrategy, AllocationValues, Entity, EntityId};
pub use error::HierarchyError;
pub use level::{EntityLevel, LevelToggle, LevelVisibility};
pub use tree::{Descendants, EntityIndex};
pub use visible::{has_visible_children, visible_child_ids, visible_children, visible_parent};

/// Maximum depth of a hierarchy (one node per level).
pub const MAX_DEPTH: usize = EntityLevel::ALL.len();

// A tree walk never needs more than one frame per level.
const _: () = assert!(MAX_DEPTH == 7);
