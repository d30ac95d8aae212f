//! Percentage change propagation.
//!
//! Setting a node to `p` percent stores `consumption * p / 100` on the node.
//! If the node's own strategy is balanced, the same percentage is pushed to
//! every descendant, whatever their own strategies are. Under a percentage
//! or exact strategy the descendants keep their manual allocations.
//!
//! Ancestors are never touched: an ancestor's renewable energy is its own
//! stored quantity, reconciled by the user through the allocation strategy
//! of that ancestor (see [`crate::reconcile`]).

use tracing::debug;
use verdant_hierarchy::{Entity, EntityId, LevelVisibility};

use crate::snap::{snap, snap_points};
use crate::AllocationError;

/// Set `id` to `percentage` of its consumption and propagate per strategy.
///
/// Unknown ids leave the tree unchanged. Percentages are not clamped.
pub fn apply_renewable_change(mut tree: Entity, id: &EntityId, percentage: f64) -> Entity {
    if let Err(err) = try_apply_renewable_change(&mut tree, id, percentage) {
        debug!(%err, "renewable change ignored");
    }
    tree
}

/// In-place form of [`apply_renewable_change`]. On error nothing is modified.
pub fn try_apply_renewable_change(
    tree: &mut Entity,
    id: &EntityId,
    percentage: f64,
) -> Result<(), AllocationError> {
    let node = tree
        .find_mut(id)
        .ok_or_else(|| AllocationError::EntityNotFound(id.clone()))?;
    push_percentage(node, percentage);
    Ok(())
}

/// Like [`apply_renewable_change`], but first snaps `percentage` to the
/// node's children-completion target when it lies within tolerance.
///
/// This is the path for a top-level row, whose control has no sibling
/// context.
pub fn apply_snapped_renewable_change(
    mut tree: Entity,
    id: &EntityId,
    percentage: f64,
    levels: &LevelVisibility,
) -> Entity {
    if let Err(err) = try_apply_snapped_renewable_change(&mut tree, id, percentage, levels) {
        debug!(%err, "snapped renewable change ignored");
    }
    tree
}

/// In-place form of [`apply_snapped_renewable_change`]. On error nothing is
/// modified.
pub fn try_apply_snapped_renewable_change(
    tree: &mut Entity,
    id: &EntityId,
    percentage: f64,
    levels: &LevelVisibility,
) -> Result<(), AllocationError> {
    let node = tree
        .find(id)
        .ok_or_else(|| AllocationError::EntityNotFound(id.clone()))?;
    let snapped = snap(percentage, &snap_points(node, None, levels));
    try_apply_renewable_change(tree, id, snapped)
}

/// Store `percentage` on `node` and, if it is balanced, on its whole subtree.
pub(crate) fn push_percentage(node: &mut Entity, percentage: f64) {
    node.renewable_energy = node.energy_at(percentage);
    if node.allocation.is_balanced() {
        node.for_each_descendant_mut(&mut |descendant| {
            descendant.renewable_energy = descendant.energy_at(percentage);
        });
    }
}
