//! Per-child edits from a parent's allocation table.
//!
//! An edit stores the (snapped) value in the parent's allocation and pushes
//! the matching percentage to that one child through
//! [`crate::apply_renewable_change`]'s path. Other children's values and the
//! parent's own renewable energy are never touched.
//!
//! Editing a child of a balanced parent switches the parent to percentage
//! first: every visible sibling is seeded with its current coverage and the
//! edited child gets the new value. A balanced parent offers no snap
//! targets, so that first edit is taken as given.

use tracing::debug;
use verdant_hierarchy::{
    percentage_of, visible_children, Allocation, AllocationStrategy, Entity, EntityId,
    LevelVisibility,
};

use crate::propagation::push_percentage;
use crate::snap::{snap, snap_points};
use crate::strategy::transition_allocation;
use crate::AllocationError;

/// What the control reports for the edited child.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ChildInput {
    /// In the unit of the parent's strategy: percent, or kWh under exact.
    Value(f64),
    /// Always percent of the child's consumption (slider).
    Percentage(f64),
}

/// Set the allocation value of `child` under `parent`.
///
/// `raw` is in the unit of the parent's strategy: percent under percentage
/// (and balanced, which switches to percentage), kWh under exact. Unknown
/// ids, or a child that is not visible under `parent`, leave the tree
/// unchanged.
pub fn set_child_value(
    mut tree: Entity,
    parent: &EntityId,
    child: &EntityId,
    raw: f64,
    levels: &LevelVisibility,
) -> Entity {
    if let Err(err) = edit_child(&mut tree, parent, child, ChildInput::Value(raw), levels) {
        debug!(%err, "child value edit ignored");
    }
    tree
}

/// In-place form of [`set_child_value`]. On error nothing is modified.
pub fn try_set_child_value(
    tree: &mut Entity,
    parent: &EntityId,
    child: &EntityId,
    raw: f64,
    levels: &LevelVisibility,
) -> Result<(), AllocationError> {
    edit_child(tree, parent, child, ChildInput::Value(raw), levels)
}

/// Set `child` under `parent` from a percentage control.
///
/// Identical to [`set_child_value`] except under exact, where the snapped
/// percentage is converted to kWh before it is stored.
pub fn set_child_percentage(
    mut tree: Entity,
    parent: &EntityId,
    child: &EntityId,
    percentage: f64,
    levels: &LevelVisibility,
) -> Entity {
    let input = ChildInput::Percentage(percentage);
    if let Err(err) = edit_child(&mut tree, parent, child, input, levels) {
        debug!(%err, "child percentage edit ignored");
    }
    tree
}

/// In-place form of [`set_child_percentage`]. On error nothing is modified.
pub fn try_set_child_percentage(
    tree: &mut Entity,
    parent: &EntityId,
    child: &EntityId,
    percentage: f64,
    levels: &LevelVisibility,
) -> Result<(), AllocationError> {
    edit_child(tree, parent, child, ChildInput::Percentage(percentage), levels)
}

fn edit_child(
    tree: &mut Entity,
    parent_id: &EntityId,
    child_id: &EntityId,
    input: ChildInput,
    levels: &LevelVisibility,
) -> Result<(), AllocationError> {
    let not_found = || AllocationError::EntityNotFound(parent_id.clone());

    // Plan against the current tree, then commit.
    let (allocation, push) = {
        let parent = tree.find(parent_id).ok_or_else(not_found)?;
        let child = visible_children(parent, levels)
            .into_iter()
            .find(|c| c.id == *child_id)
            .ok_or_else(|| AllocationError::NotAVisibleChild {
                parent: parent_id.clone(),
                child: child_id.clone(),
            })?;
        plan_edit(parent, child, input, levels)
    };

    let parent = tree.find_mut(parent_id).ok_or_else(not_found)?;
    parent.allocation = allocation;
    if let Some(percentage) = push {
        if let Some(child) = parent.find_mut(child_id) {
            push_percentage(child, percentage);
        }
    }
    Ok(())
}

/// The parent's new allocation and the percentage to push to the child,
/// if any.
fn plan_edit(
    parent: &Entity,
    child: &Entity,
    input: ChildInput,
    levels: &LevelVisibility,
) -> (Allocation, Option<f64>) {
    let raw_percentage = match input {
        ChildInput::Value(v) | ChildInput::Percentage(v) => v,
    };

    match parent.allocation.strategy() {
        AllocationStrategy::Balanced => {
            let mut allocation =
                transition_allocation(parent, AllocationStrategy::Percentage, levels);
            if let Allocation::Percentage(values) = &mut allocation {
                values.insert(child.id.clone(), raw_percentage);
            }
            debug!(
                parent = %parent.id,
                child = %child.id,
                "balanced parent switched to percentage"
            );
            (allocation, Some(raw_percentage))
        }
        AllocationStrategy::Percentage => {
            let snapped = snap(raw_percentage, &snap_points(child, Some(parent), levels));
            (with_value(parent, child, snapped), Some(snapped))
        }
        AllocationStrategy::Exact => {
            let points = snap_points(child, Some(parent), levels);
            match input {
                ChildInput::Percentage(percentage) => {
                    let snapped = snap(percentage, &points);
                    (with_value(parent, child, child.energy_at(snapped)), Some(snapped))
                }
                ChildInput::Value(amount) => {
                    // Targets are percentages; snap in that space.
                    let percentage = percentage_of(amount, child.consumption);
                    let snapped = snap(percentage, &points);
                    let amount = if snapped == percentage {
                        amount
                    } else {
                        child.energy_at(snapped)
                    };
                    // A child without consumption keeps its renewable energy.
                    let push = (child.consumption > 0.0)
                        .then(|| percentage_of(amount, child.consumption));
                    (with_value(parent, child, amount), push)
                }
            }
        }
    }
}

/// The parent's allocation with `child` set to `value`.
fn with_value(parent: &Entity, child: &Entity, value: f64) -> Allocation {
    let mut allocation = parent.allocation.clone();
    if let Allocation::Percentage(values) | Allocation::Exact(values) = &mut allocation {
        values.insert(child.id.clone(), value);
    }
    allocation
}
