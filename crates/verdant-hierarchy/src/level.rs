//! Hierarchy levels and the level visibility configuration.
//!
//! The hierarchy has a fixed order from `Company` down to `Resource`. Any
//! level except the company can be hidden from the visible tree; hiding a
//! level never alters the stored tree, it only changes which nodes appear
//! as visible children (see [`crate::visible_children`]).

use std::fmt;
use std::str::FromStr;

use crate::HierarchyError;

/// One level of the organization hierarchy, ordered from the root down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntityLevel {
    Company,
    Region,
    Country,
    State,
    City,
    Facility,
    Resource,
}

impl EntityLevel {
    /// All levels in hierarchy order.
    pub const ALL: [Self; 7] = [
        Self::Company,
        Self::Region,
        Self::Country,
        Self::State,
        Self::City,
        Self::Facility,
        Self::Resource,
    ];

    /// Distance from the company level (company = 0).
    pub const fn depth(self) -> usize {
        self as usize
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Region => "region",
            Self::Country => "country",
            Self::State => "state",
            Self::City => "city",
            Self::Facility => "facility",
            Self::Resource => "resource",
        }
    }

    /// Human-readable label used by level toggles.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Region => "Region",
            Self::Country => "Country",
            Self::State => "State/Province",
            Self::City => "City",
            Self::Facility => "Facility",
            Self::Resource => "Resource",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLevel {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| HierarchyError::UnknownLevel(s.to_string()))
    }
}

/// A single user-facing visibility switch for one level.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelToggle {
    pub level: EntityLevel,
    pub enabled: bool,
    pub label: String,
}

impl LevelToggle {
    /// Create a toggle labelled with the level's default label.
    pub fn new(level: EntityLevel, enabled: bool) -> Self {
        Self {
            level,
            enabled,
            label: level.label().to_string(),
        }
    }

    /// The toggles an operator starts with: state and city hidden.
    ///
    /// The company level has no toggle; it is always visible.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(EntityLevel::Region, true),
            Self::new(EntityLevel::Country, true),
            Self::new(EntityLevel::State, false),
            Self::new(EntityLevel::City, false),
            Self::new(EntityLevel::Facility, true),
            Self::new(EntityLevel::Resource, true),
        ]
    }
}

/// The set of enabled levels, threaded explicitly through every
/// visibility-dependent computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelVisibility {
    mask: u8,
}

impl LevelVisibility {
    /// Every level visible.
    pub const fn all() -> Self {
        Self { mask: 0b0111_1111 }
    }

    /// Only the company level visible.
    pub const fn company_only() -> Self {
        Self {
            mask: EntityLevel::Company.bit(),
        }
    }

    /// Build from a toggle list. Levels without a toggle stay visible.
    pub fn from_toggles(toggles: &[LevelToggle]) -> Self {
        let mut visibility = Self::all();
        for toggle in toggles {
            visibility.set(toggle.level, toggle.enabled);
        }
        visibility
    }

    /// Build from an explicit list of enabled levels. The company level is
    /// always added.
    pub fn from_levels<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = EntityLevel>,
    {
        let mut visibility = Self::company_only();
        for level in levels {
            visibility.set(level, true);
        }
        visibility
    }

    /// Whether nodes at `level` appear in the visible tree.
    pub const fn is_enabled(&self, level: EntityLevel) -> bool {
        self.mask & level.bit() != 0
    }

    /// Enable or disable a level. The company level cannot be disabled.
    pub fn set(&mut self, level: EntityLevel, enabled: bool) {
        if level == EntityLevel::Company {
            return;
        }
        if enabled {
            self.mask |= level.bit();
        } else {
            self.mask &= !level.bit();
        }
    }

    /// Return a copy with `level` disabled.
    pub fn without(mut self, level: EntityLevel) -> Self {
        self.set(level, false);
        self
    }

    /// Enabled levels in hierarchy order.
    pub fn enabled_levels(&self) -> impl Iterator<Item = EntityLevel> + '_ {
        EntityLevel::ALL
            .into_iter()
            .filter(|level| self.is_enabled(*level))
    }

    /// Number of enabled levels, company included.
    pub fn enabled_count(&self) -> usize {
        self.mask.count_ones() as usize
    }
}

impl Default for LevelVisibility {
    fn default() -> Self {
        Self::from_toggles(&LevelToggle::defaults())
    }
}
