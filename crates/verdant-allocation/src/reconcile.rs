//! Allocation totals and over/under-allocation detection.
//!
//! Under a manual strategy, a parent's stored values imply an amount of
//! energy for its visible children. When that total drifts from the parent's
//! own renewable energy by a full kWh or more, the parent is flagged. A
//! mismatch is advisory: it never blocks further edits.

use verdant_hierarchy::{
    visible_children, Allocation, AllocationStrategy, Entity, EntityId, LevelVisibility,
};

/// A total within this many kWh of the pool is valid.
pub const RECONCILE_TOLERANCE: f64 = 1.0;

/// Energy the allocation of `node` assigns to its visible children.
///
/// - balanced: the children's actual renewable energy
/// - percentage: `Σ child.consumption * value / 100`
/// - exact: `Σ value`
pub fn allocation_total(node: &Entity, levels: &LevelVisibility) -> f64 {
    let children = visible_children(node, levels);
    match &node.allocation {
        Allocation::Balanced => children.iter().map(|c| c.renewable_energy).sum(),
        Allocation::Percentage(_) => children
            .iter()
            .map(|c| c.energy_at(node.allocation.value_for(&c.id)))
            .sum(),
        Allocation::Exact(_) => children
            .iter()
            .map(|c| node.allocation.value_for(&c.id))
            .sum(),
    }
}

/// Outcome of comparing an allocation total against the parent's pool.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum AllocationStatus {
    /// Total within tolerance of the pool, or the parent is balanced
    Valid,
    /// Children are promised more than the parent holds
    OverAllocated { excess: f64 },
    /// Part of the parent's pool is unassigned
    UnderAllocated { shortfall: f64 },
}

impl AllocationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// The reconciliation state of one parent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reconciliation {
    pub entity: EntityId,
    pub strategy: AllocationStrategy,
    /// Energy assigned to the visible children
    pub total: f64,
    /// The parent's own renewable energy
    pub pool: f64,
    pub status: AllocationStatus,
}

/// Reconcile one node's allocation against its renewable pool.
pub fn reconcile(node: &Entity, levels: &LevelVisibility) -> Reconciliation {
    let total = allocation_total(node, levels);
    let pool = node.renewable_energy;
    let strategy = node.allocation.strategy();

    let status = if !strategy.is_manual() || (total - pool).abs() < RECONCILE_TOLERANCE {
        AllocationStatus::Valid
    } else if total > pool {
        AllocationStatus::OverAllocated { excess: total - pool }
    } else {
        AllocationStatus::UnderAllocated { shortfall: pool - total }
    };

    Reconciliation {
        entity: node.id.clone(),
        strategy,
        total,
        pool,
        status,
    }
}

/// Reconcile every node of the visible tree that has visible children,
/// in pre-order starting at `root`.
pub fn reconcile_tree(root: &Entity, levels: &LevelVisibility) -> Vec<Reconciliation> {
    fn visit(node: &Entity, levels: &LevelVisibility, out: &mut Vec<Reconciliation>) {
        let children = visible_children(node, levels);
        if children.is_empty() {
            return;
        }
        out.push(reconcile(node, levels));
        for child in children {
            visit(child, levels, out);
        }
    }

    let mut out = Vec::new();
    visit(root, levels, &mut out);
    out
}

/// Only the over- and under-allocated entries of [`reconcile_tree`].
pub fn mismatches(root: &Entity, levels: &LevelVisibility) -> Vec<Reconciliation> {
    reconcile_tree(root, levels)
        .into_iter()
        .filter(|r| !r.status.is_valid())
        .collect()
}

/// Sum of the renewable energy of the given top-level rows.
pub fn total_renewable(rows: &[Entity]) -> f64 {
    rows.iter().map(|row| row.renewable_energy).sum()
}
