//! Flat allocation lists (customers, products, custom properties).
//!
//! Items are independent: a percentage change on one item affects only
//! that item. There is no strategy and no propagation.

use tracing::debug;
use verdant_hierarchy::{percentage_of, EntityId};

use crate::AllocationError;

/// One entry of a flat allocation list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SimpleAllocationItem {
    pub id: EntityId,
    pub name: String,
    pub consumption: f64,
    pub renewable_energy: f64,
}

impl SimpleAllocationItem {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, consumption: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            consumption,
            renewable_energy: 0.0,
        }
    }

    pub fn with_renewable(mut self, renewable_energy: f64) -> Self {
        self.renewable_energy = renewable_energy;
        self
    }

    pub fn coverage_percentage(&self) -> f64 {
        percentage_of(self.renewable_energy, self.consumption)
    }
}

/// Set item `id` to `percentage` of its consumption. Unknown ids leave the
/// list unchanged.
pub fn apply_flat_change(
    mut items: Vec<SimpleAllocationItem>,
    id: &EntityId,
    percentage: f64,
) -> Vec<SimpleAllocationItem> {
    if let Err(err) = try_apply_flat_change(&mut items, id, percentage) {
        debug!(%err, "flat change ignored");
    }
    items
}

/// In-place form of [`apply_flat_change`]. Every item carrying `id` is
/// updated.
pub fn try_apply_flat_change(
    items: &mut [SimpleAllocationItem],
    id: &EntityId,
    percentage: f64,
) -> Result<(), AllocationError> {
    let mut matched = false;
    for item in items.iter_mut().filter(|item| item.id == *id) {
        item.renewable_energy = item.consumption * percentage / 100.0;
        matched = true;
    }
    if matched {
        Ok(())
    } else {
        Err(AllocationError::ItemNotFound(id.clone()))
    }
}

/// Aggregate consumption and coverage of a flat list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FlatTotals {
    pub consumption: f64,
    pub renewable_energy: f64,
}

impl FlatTotals {
    pub fn coverage_percentage(&self) -> f64 {
        percentage_of(self.renewable_energy, self.consumption)
    }
}

pub fn flat_totals(items: &[SimpleAllocationItem]) -> FlatTotals {
    items.iter().fold(FlatTotals::default(), |acc, item| FlatTotals {
        consumption: acc.consumption + item.consumption,
        renewable_energy: acc.renewable_energy + item.renewable_energy,
    })
}
