//! Strategy transitions at one parent node.
//!
//! | from → to                 | new values                                   |
//! |---------------------------|----------------------------------------------|
//! | balanced → percentage     | each visible child's coverage percentage     |
//! | balanced → exact          | each visible child's renewable energy        |
//! | percentage → exact        | `child.consumption * value / 100`            |
//! | exact → percentage        | `value / child.consumption * 100`            |
//! | manual → balanced         | none; parent coverage pushed to each child   |
//! | same strategy             | carried over, missing entries as 0           |
//!
//! Only visible children get values; entries for children hidden by the
//! current level configuration are dropped.

use tracing::debug;
use verdant_hierarchy::{
    percentage_of, visible_child_ids, visible_children, Allocation, AllocationStrategy,
    AllocationValues, Entity, EntityId, LevelVisibility,
};

use crate::propagation::push_percentage;
use crate::AllocationError;

/// The allocation `parent` would hold after switching to `target`.
///
/// Pure; does not include the renewable push-down of a switch to balanced.
pub fn transition_allocation(
    parent: &Entity,
    target: AllocationStrategy,
    levels: &LevelVisibility,
) -> Allocation {
    use AllocationStrategy::{Balanced, Exact, Percentage};

    let children = visible_children(parent, levels);
    let seed = |value: &dyn Fn(&Entity) -> f64| -> AllocationValues {
        children
            .iter()
            .map(|child| (child.id.clone(), value(child)))
            .collect()
    };
    let stored = |child: &Entity| parent.allocation.value_for(&child.id);

    let values = match (parent.allocation.strategy(), target) {
        (_, Balanced) => return Allocation::Balanced,
        (Balanced, Percentage) => seed(&|child| child.coverage_percentage()),
        (Balanced, Exact) => seed(&|child| child.renewable_energy),
        (Percentage, Exact) => seed(&|child| child.energy_at(stored(child))),
        (Exact, Percentage) => seed(&|child| percentage_of(stored(child), child.consumption)),
        (Percentage, Percentage) | (Exact, Exact) => seed(&stored),
    };
    Allocation::from_parts(target, values)
}

/// Switch `id` to `strategy`. Unknown ids leave the tree unchanged.
pub fn set_strategy(
    mut tree: Entity,
    id: &EntityId,
    strategy: AllocationStrategy,
    levels: &LevelVisibility,
) -> Entity {
    if let Err(err) = try_set_strategy(&mut tree, id, strategy, levels) {
        debug!(%err, "strategy change ignored");
    }
    tree
}

/// In-place form of [`set_strategy`]. On error nothing is modified.
///
/// Leaving a manual strategy for balanced pushes the parent's own coverage
/// percentage down to every visible child, through the same path as
/// [`crate::apply_renewable_change`]. Reselecting balanced is a no-op.
pub fn try_set_strategy(
    tree: &mut Entity,
    id: &EntityId,
    strategy: AllocationStrategy,
    levels: &LevelVisibility,
) -> Result<(), AllocationError> {
    let node = tree
        .find_mut(id)
        .ok_or_else(|| AllocationError::EntityNotFound(id.clone()))?;

    let leaving_manual = node.allocation.strategy().is_manual();
    if strategy == AllocationStrategy::Balanced && leaving_manual {
        let percentage = node.coverage_percentage();
        for child_id in visible_child_ids(node, levels) {
            if let Some(child) = node.find_mut(&child_id) {
                push_percentage(child, percentage);
            }
        }
        debug!(%id, percentage, "switched to balanced");
    }

    node.allocation = transition_allocation(node, strategy, levels);
    Ok(())
}

/// Replace the allocation of `id` verbatim. Unknown ids leave the tree
/// unchanged.
pub fn set_allocation(mut tree: Entity, id: &EntityId, allocation: Allocation) -> Entity {
    if let Err(err) = try_set_allocation(&mut tree, id, allocation) {
        debug!(%err, "allocation replacement ignored");
    }
    tree
}

/// In-place form of [`set_allocation`]. On error nothing is modified.
pub fn try_set_allocation(
    tree: &mut Entity,
    id: &EntityId,
    allocation: Allocation,
) -> Result<(), AllocationError> {
    let node = tree
        .find_mut(id)
        .ok_or_else(|| AllocationError::EntityNotFound(id.clone()))?;
    node.allocation = allocation;
    Ok(())
}
