//! Edit events that drive a session.
//!
//! Each event corresponds to one control interaction. Events serialize with
//! an internal `type` tag so a recorded session is a plain JSON array.

use serde::{Deserialize, Serialize};
use verdant_hierarchy::{Allocation, AllocationStrategy, EntityId, EntityLevel};

/// Which flat list a [`AllocationEvent::FlatItemChanged`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatList {
    Customers,
    Products,
    CustomProperties,
}

impl FlatList {
    pub const ALL: [FlatList; 3] = [
        FlatList::Customers,
        FlatList::Products,
        FlatList::CustomProperties,
    ];
}

/// A single edit applied to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationEvent {
    /// A row's coverage slider moved. With `snap`, the value first snaps to
    /// the row's children-completion target.
    RenewableChanged {
        entity: EntityId,
        percentage: f64,
        #[serde(default)]
        snap: bool,
    },

    /// A parent switched allocation strategy.
    StrategyChanged {
        entity: EntityId,
        strategy: AllocationStrategy,
    },

    /// A parent's allocation was replaced wholesale.
    AllocationReplaced {
        entity: EntityId,
        allocation: Allocation,
    },

    /// A child value was typed into the parent's allocation table, in the
    /// unit of the parent's strategy.
    ChildValueChanged {
        parent: EntityId,
        child: EntityId,
        value: f64,
    },

    /// A child's percentage slider moved inside the parent's table.
    ChildPercentageChanged {
        parent: EntityId,
        child: EntityId,
        percentage: f64,
    },

    /// A flat list item's coverage slider moved.
    FlatItemChanged {
        list: FlatList,
        item: EntityId,
        percentage: f64,
    },

    /// A level toggle was flipped.
    LevelToggled { level: EntityLevel },

    /// A level toggle was set explicitly.
    LevelSet { level: EntityLevel, enabled: bool },
}

impl AllocationEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationEvent::RenewableChanged { .. } => "renewable_changed",
            AllocationEvent::StrategyChanged { .. } => "strategy_changed",
            AllocationEvent::AllocationReplaced { .. } => "allocation_replaced",
            AllocationEvent::ChildValueChanged { .. } => "child_value_changed",
            AllocationEvent::ChildPercentageChanged { .. } => "child_percentage_changed",
            AllocationEvent::FlatItemChanged { .. } => "flat_item_changed",
            AllocationEvent::LevelToggled { .. } => "level_toggled",
            AllocationEvent::LevelSet { .. } => "level_set",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_type_tag() {
        let json = r#"[
            {"type": "renewable_changed", "entity": "eu", "percentage": 40.0},
            {"type": "strategy_changed", "entity": "eu", "strategy": "exact"},
            {"type": "child_value_changed", "parent": "eu", "child": "de", "value": 1200.0},
            {"type": "flat_item_changed", "list": "custom_properties", "item": "x",
             "percentage": 10.0},
            {"type": "level_toggled", "level": "state"}
        ]"#;
        let events: Vec<AllocationEvent> = serde_json::from_str(json).unwrap();

        assert_eq!(
            events[0],
            AllocationEvent::RenewableChanged {
                entity: "eu".into(),
                percentage: 40.0,
                snap: false,
            }
        );
        assert_eq!(
            events[1],
            AllocationEvent::StrategyChanged {
                entity: "eu".into(),
                strategy: AllocationStrategy::Exact,
            }
        );
        assert_eq!(events[2].kind(), "child_value_changed");
        assert!(matches!(
            events[3],
            AllocationEvent::FlatItemChanged { list: FlatList::CustomProperties, .. }
        ));
        assert_eq!(events[4], AllocationEvent::LevelToggled { level: EntityLevel::State });
    }

    #[test]
    fn allocation_replacement_carries_values() {
        let json = r#"{
            "type": "allocation_replaced",
            "entity": "eu",
            "allocation": {"strategy": "percentage", "values": {"de": 30.0, "fr": 70.0}}
        }"#;
        let event: AllocationEvent = serde_json::from_str(json).unwrap();
        let AllocationEvent::AllocationReplaced { allocation, .. } = event else {
            panic!("wrong variant");
        };
        assert_eq!(allocation.strategy(), AllocationStrategy::Percentage);
        assert_eq!(allocation.value_for(&"fr".into()), 70.0);
    }
}
