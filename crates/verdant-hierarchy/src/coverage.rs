//! Coverage percentages relative to different bases.

use crate::entity::percentage_of;
use crate::Entity;

/// The base a coverage percentage is expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CoverageMode {
    /// Share of the whole tree's renewable energy.
    Total,
    /// Share of the parent's renewable pool.
    Parent,
    /// Share of the entity's own consumption.
    #[default]
    Consumption,
}

/// Coverage of `entity` in percent under `mode`.
///
/// `parent` is only read in `Parent` mode and `root` only in `Total` mode;
/// a missing parent or a zero base yields 0.
pub fn coverage(
    entity: &Entity,
    mode: CoverageMode,
    parent: Option<&Entity>,
    root: &Entity,
) -> f64 {
    match mode {
        CoverageMode::Consumption => entity.coverage_percentage(),
        CoverageMode::Parent => parent
            .map(|p| percentage_of(entity.renewable_energy, p.renewable_energy))
            .unwrap_or(0.0),
        CoverageMode::Total => percentage_of(entity.renewable_energy, root.renewable_energy),
    }
}
