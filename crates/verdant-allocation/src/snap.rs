//! Snap points.
//!
//! While a control is being dragged, a value close to a derived target is
//! replaced by the target itself, so the user can land exactly on an
//! allocation that reconciles. Two targets exist, both in percent of the
//! edited node's own consumption:
//!
//! 1. **Sibling completion**: the value at which the parent's visible
//!    children, as allocated, add up to exactly the parent's pool.
//! 2. **Children completion**: the value at which the node's own pool
//!    equals what its manual allocation assigns to its visible children.
//!
//! Targets outside `[0, 100]` are dropped. The first target within
//! [`SNAP_TOLERANCE`] of the candidate wins, sibling completion first.

use tracing::debug;
use verdant_hierarchy::{percentage_of, visible_children, Allocation, Entity, LevelVisibility};

use crate::reconcile::allocation_total;

/// A candidate within this many percentage points of a target snaps to it.
pub const SNAP_TOLERANCE: f64 = 3.0;

/// Targets this close to the current value are not worth indicating.
///
/// Presentation-side only; independent of [`SNAP_TOLERANCE`].
pub const INDICATOR_EPSILON: f64 = 0.5;

/// Which reconciliation a snap target completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SnapKind {
    SiblingCompletion,
    ChildrenCompletion,
}

/// A snap target in percent of the node's own consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapPoint {
    pub kind: SnapKind,
    pub percentage: f64,
}

/// Snap targets for `node`, sibling completion first.
///
/// `parent` is the node's visible parent when the node is edited from its
/// parent's allocation table; pass `None` for a top-level row.
pub fn snap_points(
    node: &Entity,
    parent: Option<&Entity>,
    levels: &LevelVisibility,
) -> Vec<SnapPoint> {
    let sibling = parent
        .and_then(|parent| sibling_completion(node, parent, levels))
        .map(|percentage| SnapPoint {
            kind: SnapKind::SiblingCompletion,
            percentage,
        });
    let children = children_completion(node, levels).map(|percentage| SnapPoint {
        kind: SnapKind::ChildrenCompletion,
        percentage,
    });

    let points: Vec<_> = sibling.into_iter().chain(children).collect();
    if !points.is_empty() {
        debug!(id = %node.id, ?points, "snap points");
    }
    points
}

/// Percentage for `node` that makes `parent`'s visible children add up to
/// exactly `parent.renewable_energy`.
///
/// `None` when `parent` is balanced, when `node` is not one of its visible
/// children, or when the target falls outside `[0, 100]`.
pub fn sibling_completion(node: &Entity, parent: &Entity, levels: &LevelVisibility) -> Option<f64> {
    let allocation = &parent.allocation;
    if allocation.is_balanced() {
        return None;
    }
    let siblings = visible_children(parent, levels);
    if !siblings.iter().any(|s| s.id == node.id) {
        return None;
    }

    let others: f64 = siblings
        .iter()
        .filter(|s| s.id != node.id)
        .map(|s| match allocation {
            Allocation::Exact(_) => allocation.value_for(&s.id),
            _ => s.energy_at(allocation.value_for(&s.id)),
        })
        .sum();

    let remaining = parent.renewable_energy - others;
    in_range(percentage_of(remaining, node.consumption))
}

/// Percentage for `node` at which its own renewable energy equals what its
/// manual allocation assigns to its visible children.
///
/// `None` when `node` is a leaf, balanced, or the target is out of range.
pub fn children_completion(node: &Entity, levels: &LevelVisibility) -> Option<f64> {
    if node.is_leaf() || node.allocation.is_balanced() {
        return None;
    }
    let assigned = allocation_total(node, levels);
    in_range(percentage_of(assigned, node.consumption))
}

fn in_range(percentage: f64) -> Option<f64> {
    (0.0..=100.0).contains(&percentage).then_some(percentage)
}

/// The first target within [`SNAP_TOLERANCE`] of `candidate`.
pub fn snap_target(candidate: f64, points: &[SnapPoint]) -> Option<&SnapPoint> {
    points
        .iter()
        .find(|point| (candidate - point.percentage).abs() <= SNAP_TOLERANCE)
}

/// `candidate`, or the first target within tolerance of it.
pub fn snap(candidate: f64, points: &[SnapPoint]) -> f64 {
    snap_target(candidate, points).map_or(candidate, |point| point.percentage)
}

/// Targets worth drawing next to a control currently at `current`.
pub fn indicator_points(current: f64, points: &[SnapPoint]) -> Vec<SnapPoint> {
    points
        .iter()
        .filter(|point| (current - point.percentage).abs() >= INDICATOR_EPSILON)
        .copied()
        .collect()
}
