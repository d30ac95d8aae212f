//! Entities, identifiers and per-node allocation state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{EntityLevel, HierarchyError};

/// Stable, globally unique entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a parent distributes its renewable pool among its visible children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AllocationStrategy {
    /// Uniform percentage pushed down the whole subtree.
    #[default]
    Balanced,
    /// Each child gets an independent share of its own consumption, in percent.
    Percentage,
    /// Each child gets an independent absolute amount, in kWh.
    Exact,
}

impl AllocationStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Percentage => "percentage",
            Self::Exact => "exact",
        }
    }

    /// Percentage and exact strategies carry manual per-child values.
    pub const fn is_manual(self) -> bool {
        !matches!(self, Self::Balanced)
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationStrategy {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "percentage" => Ok(Self::Percentage),
            "exact" => Ok(Self::Exact),
            _ => Err(HierarchyError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Per-child allocation values, keyed by child id.
///
/// The unit depends on the strategy that owns the map: percentage points of
/// the child's own consumption, or kWh.
pub type AllocationValues = BTreeMap<EntityId, f64>;

/// A node's allocation: the strategy together with the values it needs.
///
/// A node without an explicit allocation behaves as `Balanced`. On the wire
/// it is `{"strategy": .., "values": {..}}`; `values` may be omitted, null
/// or empty for any strategy and is ignored under `balanced`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawAllocation", into = "RawAllocation"))]
pub enum Allocation {
    #[default]
    Balanced,
    Percentage(AllocationValues),
    Exact(AllocationValues),
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawAllocation {
    strategy: AllocationStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<AllocationValues>,
}

#[cfg(feature = "serde")]
impl From<RawAllocation> for Allocation {
    fn from(raw: RawAllocation) -> Self {
        Self::from_parts(raw.strategy, raw.values.unwrap_or_default())
    }
}

#[cfg(feature = "serde")]
impl From<Allocation> for RawAllocation {
    fn from(allocation: Allocation) -> Self {
        let strategy = allocation.strategy();
        let values = match allocation {
            Allocation::Balanced => None,
            Allocation::Percentage(values) | Allocation::Exact(values) => Some(values),
        };
        Self { strategy, values }
    }
}

impl Allocation {
    /// Assemble an allocation from a strategy and a value map. The values
    /// are dropped for `Balanced`.
    pub fn from_parts(strategy: AllocationStrategy, values: AllocationValues) -> Self {
        match strategy {
            AllocationStrategy::Balanced => Self::Balanced,
            AllocationStrategy::Percentage => Self::Percentage(values),
            AllocationStrategy::Exact => Self::Exact(values),
        }
    }

    pub fn strategy(&self) -> AllocationStrategy {
        match self {
            Self::Balanced => AllocationStrategy::Balanced,
            Self::Percentage(_) => AllocationStrategy::Percentage,
            Self::Exact(_) => AllocationStrategy::Exact,
        }
    }

    pub fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }

    /// The stored values, `None` under `Balanced`.
    pub fn values(&self) -> Option<&AllocationValues> {
        match self {
            Self::Balanced => None,
            Self::Percentage(values) | Self::Exact(values) => Some(values),
        }
    }

    /// Stored value for one child; missing entries read as 0.
    pub fn value_for(&self, child: &EntityId) -> f64 {
        self.values()
            .and_then(|values| values.get(child))
            .copied()
            .unwrap_or(0.0)
    }
}

/// One node of the consumption hierarchy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub level: EntityLevel,
    /// Fixed energy demand in kWh. Never changed by allocation edits.
    pub consumption: f64,
    /// Portion of `consumption` covered by renewable credits, in kWh.
    #[cfg_attr(feature = "serde", serde(default))]
    pub renewable_energy: f64,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub children: Vec<Entity>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub allocation: Allocation,
}

impl Entity {
    /// A leaf with no renewable coverage and a balanced allocation.
    pub fn new(
        id: impl Into<EntityId>,
        name: impl Into<String>,
        level: EntityLevel,
        consumption: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            consumption,
            renewable_energy: 0.0,
            children: Vec::new(),
            allocation: Allocation::Balanced,
        }
    }

    pub fn with_renewable(mut self, renewable_energy: f64) -> Self {
        self.renewable_energy = renewable_energy;
        self
    }

    pub fn with_children(mut self, children: Vec<Entity>) -> Self {
        self.children = children;
        self
    }

    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Share of own consumption covered by renewables, in percent.
    pub fn coverage_percentage(&self) -> f64 {
        percentage_of(self.renewable_energy, self.consumption)
    }

    /// Energy implied by covering `percentage` of this entity's consumption.
    pub fn energy_at(&self, percentage: f64) -> f64 {
        self.consumption * percentage / 100.0
    }
}

/// `amount / base * 100`, with 0 substituted when `base` is 0.
pub fn percentage_of(amount: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        amount / base * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_handles_zero_consumption() {
        let idle = Entity::new("idle", "Idle site", EntityLevel::Facility, 0.0)
            .with_renewable(10.0);
        assert_eq!(idle.coverage_percentage(), 0.0);

        let busy = Entity::new("busy", "Busy site", EntityLevel::Facility, 2_000.0)
            .with_renewable(500.0);
        assert_eq!(busy.coverage_percentage(), 25.0);
        assert_eq!(busy.energy_at(40.0), 800.0);
    }

    #[test]
    fn missing_values_read_as_zero() {
        let mut values = AllocationValues::new();
        values.insert(EntityId::from("a"), 30.0);
        let allocation = Allocation::Percentage(values);

        assert_eq!(allocation.value_for(&EntityId::from("a")), 30.0);
        assert_eq!(allocation.value_for(&EntityId::from("b")), 0.0);
        assert_eq!(Allocation::Balanced.value_for(&EntityId::from("a")), 0.0);
    }

    #[test]
    fn from_parts_drops_values_for_balanced() {
        let mut values = AllocationValues::new();
        values.insert(EntityId::from("a"), 1.0);
        assert_eq!(
            Allocation::from_parts(AllocationStrategy::Balanced, values.clone()),
            Allocation::Balanced
        );
        assert_eq!(
            Allocation::from_parts(AllocationStrategy::Exact, values.clone()).strategy(),
            AllocationStrategy::Exact
        );
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("Exact".parse::<AllocationStrategy>().unwrap(), AllocationStrategy::Exact);
        assert!("weighted".parse::<AllocationStrategy>().is_err());
        assert!(AllocationStrategy::Percentage.is_manual());
        assert!(!AllocationStrategy::Balanced.is_manual());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn allocation_values_are_optional_on_the_wire() {
        let parse = |json: &str| serde_json::from_str::<Allocation>(json).unwrap();

        assert_eq!(parse(r#"{"strategy":"balanced"}"#), Allocation::Balanced);
        assert_eq!(parse(r#"{"strategy":"balanced","values":{}}"#), Allocation::Balanced);
        assert_eq!(
            parse(r#"{"strategy":"balanced","values":{"a":40.0}}"#),
            Allocation::Balanced
        );
        assert_eq!(
            parse(r#"{"strategy":"percentage"}"#),
            Allocation::Percentage(AllocationValues::new())
        );
        assert_eq!(
            parse(r#"{"strategy":"exact","values":null}"#),
            Allocation::Exact(AllocationValues::new())
        );
        let exact = parse(r#"{"strategy":"exact","values":{"a":1.0}}"#);
        assert_eq!(exact.value_for(&"a".into()), 1.0);
        assert!(serde_json::from_str::<Allocation>(r#"{"strategy":"weighted"}"#).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn allocation_serializes_without_balanced_values() {
        let balanced = serde_json::to_value(Allocation::Balanced).unwrap();
        assert_eq!(balanced, serde_json::json!({"strategy": "balanced"}));

        let mut values = AllocationValues::new();
        values.insert("a".into(), 25.0);
        let exact = serde_json::to_value(Allocation::Exact(values)).unwrap();
        assert_eq!(exact, serde_json::json!({"strategy": "exact", "values": {"a": 25.0}}));
    }
}
