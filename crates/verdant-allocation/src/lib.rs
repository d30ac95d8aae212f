//! Renewable Energy Allocation
//!
//! Distributes a pool of renewable energy credits across a
//! [`verdant_hierarchy::Entity`] tree and across flat item lists.
//!
//! # Propagation
//!
//! A percentage change on one node sets its renewable energy and, when the
//! node is balanced, pushes the same percentage down its whole subtree.
//! Manual strategies (percentage, exact) stop the push: their children's
//! values are authoritative.
//!
//! # Reconciliation
//!
//! A manual strategy assigns energy to each visible child. The assigned
//! total is compared with the parent's own renewable energy and flagged as
//! over- or under-allocated when they differ by 1 kWh or more. Snap points
//! help the user land exactly on a value that closes that gap.
//!
//! # Usage
//!
//! ```
//! use verdant_allocation::{apply_renewable_change, reconcile};
//! use verdant_hierarchy::{Entity, EntityLevel, LevelVisibility};
//!
//! let tree = Entity::new("co", "Company", EntityLevel::Company, 1_000.0)
//!     .with_children(vec![Entity::new("eu", "Europe", EntityLevel::Region, 1_000.0)]);
//!
//! let tree = apply_renewable_change(tree, &"co".into(), 40.0);
//! assert_eq!(tree.renewable_energy, 400.0);
//! assert_eq!(tree.children[0].renewable_energy, 400.0);
//! assert!(reconcile(&tree, &LevelVisibility::all()).status.is_valid());
//! ```
//!
//! Every edit takes the tree by value and returns the new tree. Unknown ids
//! are a no-op; the `try_*` forms edit in place and report them instead.

mod edit;
mod error;
mod flat;
mod propagation;
mod reconcile;
mod snap;
mod strategy;

pub use edit::{
    set_child_percentage, set_child_value, try_set_child_percentage, try_set_child_value,
};
pub use error::AllocationError;
pub use flat::{
    apply_flat_change, flat_totals, try_apply_flat_change, FlatTotals, SimpleAllocationItem,
};
pub use propagation::{
    apply_renewable_change, apply_snapped_renewable_change, try_apply_renewable_change,
    try_apply_snapped_renewable_change,
};
pub use reconcile::{
    allocation_total, mismatches, reconcile, reconcile_tree, total_renewable, AllocationStatus,
    Reconciliation, RECONCILE_TOLERANCE,
};
pub use snap::{
    children_completion, indicator_points, sibling_completion, snap, snap_points, snap_target,
    SnapKind, SnapPoint, INDICATOR_EPSILON, SNAP_TOLERANCE,
};
pub use strategy::{
    set_allocation, set_strategy, transition_allocation, try_set_allocation, try_set_strategy,
};
