//! Single-writer allocation session.
//!
//! The session owns the hierarchy, the three flat lists and the level
//! toggles. Every edit goes through [`AllocationSession::apply`]; a rejected
//! edit leaves the state exactly as it was.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use verdant_allocation::{
    flat_totals, reconcile_tree, total_renewable, try_apply_flat_change,
    try_apply_renewable_change, try_apply_snapped_renewable_change, try_set_allocation,
    try_set_child_percentage, try_set_child_value, try_set_strategy, FlatTotals,
    Reconciliation, SimpleAllocationItem,
};
use verdant_hierarchy::{AllocationStrategy, Entity, EntityLevel, LevelToggle, LevelVisibility};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::events::{AllocationEvent, FlatList};

/// The initial state of a session as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSeed {
    pub tree: Entity,
    #[serde(default)]
    pub customers: Vec<SimpleAllocationItem>,
    #[serde(default)]
    pub products: Vec<SimpleAllocationItem>,
    #[serde(default)]
    pub custom_properties: Vec<SimpleAllocationItem>,
}

impl SessionSeed {
    /// Read a seed from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Read an event script (a JSON array of events).
pub fn load_events(path: impl AsRef<Path>) -> Result<Vec<AllocationEvent>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Per-list totals of the flat allocation lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSummary {
    pub customers: FlatTotals,
    pub products: FlatTotals,
    pub custom_properties: FlatTotals,
}

/// Everything a caller needs to render the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub tree: Entity,
    pub customers: Vec<SimpleAllocationItem>,
    pub products: Vec<SimpleAllocationItem>,
    pub custom_properties: Vec<SimpleAllocationItem>,
    pub toggles: Vec<LevelToggle>,
    /// One entry per visible parent, pre-order
    pub reconciliations: Vec<Reconciliation>,
    /// Renewable energy of the top-level rows
    pub total_renewable: f64,
    pub flat_totals: FlatSummary,
}

/// Outcome of [`AllocationSession::replay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

/// The mutable state behind one allocation screen.
#[derive(Debug, Clone)]
pub struct AllocationSession {
    tree: Entity,
    customers: Vec<SimpleAllocationItem>,
    products: Vec<SimpleAllocationItem>,
    custom_properties: Vec<SimpleAllocationItem>,
    toggles: Vec<LevelToggle>,
    config: SessionConfig,
}

impl AllocationSession {
    /// Start a session over `tree`. The tree is validated first.
    pub fn new(tree: Entity, config: SessionConfig) -> Result<Self> {
        tree.validate()?;
        info!(
            root = %tree.id,
            nodes = tree.node_count(),
            clamp_inputs = config.input_policy.clamp_inputs,
            "session started"
        );
        Ok(Self {
            tree,
            customers: Vec::new(),
            products: Vec::new(),
            custom_properties: Vec::new(),
            toggles: config.toggles.clone(),
            config,
        })
    }

    /// Start a session from a loaded seed.
    pub fn from_seed(seed: SessionSeed, config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(seed.tree, config)?;
        session.customers = seed.customers;
        session.products = seed.products;
        session.custom_properties = seed.custom_properties;
        Ok(session)
    }

    pub fn tree(&self) -> &Entity {
        &self.tree
    }

    /// The top-level rows: the root's direct children.
    pub fn rows(&self) -> &[Entity] {
        &self.tree.children
    }

    pub fn toggles(&self) -> &[LevelToggle] {
        &self.toggles
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current level visibility, derived from the toggles.
    pub fn levels(&self) -> LevelVisibility {
        LevelVisibility::from_toggles(&self.toggles)
    }

    pub fn flat(&self, list: FlatList) -> &[SimpleAllocationItem] {
        match list {
            FlatList::Customers => &self.customers,
            FlatList::Products => &self.products,
            FlatList::CustomProperties => &self.custom_properties,
        }
    }

    fn flat_mut(&mut self, list: FlatList) -> &mut Vec<SimpleAllocationItem> {
        match list {
            FlatList::Customers => &mut self.customers,
            FlatList::Products => &mut self.products,
            FlatList::CustomProperties => &mut self.custom_properties,
        }
    }

    /// Apply one edit. On error the session is unchanged.
    pub fn apply(&mut self, event: AllocationEvent) -> Result<()> {
        let levels = self.levels();
        let policy = self.config.input_policy;
        debug!(kind = event.kind(), "applying event");

        match event {
            AllocationEvent::RenewableChanged {
                entity,
                percentage,
                snap: snapped,
            } => {
                let percentage = policy.percentage(percentage);
                if snapped {
                    let tree = &mut self.tree;
                    try_apply_snapped_renewable_change(tree, &entity, percentage, &levels)?;
                } else {
                    try_apply_renewable_change(&mut self.tree, &entity, percentage)?;
                }
            }
            AllocationEvent::StrategyChanged { entity, strategy } => {
                try_set_strategy(&mut self.tree, &entity, strategy, &levels)?;
            }
            AllocationEvent::AllocationReplaced { entity, allocation } => {
                try_set_allocation(&mut self.tree, &entity, allocation)?;
            }
            AllocationEvent::ChildValueChanged { parent, child, value } => {
                let value = match self.tree.find(&parent).map(|p| p.allocation.strategy()) {
                    Some(AllocationStrategy::Exact) => {
                        let consumption = self.tree.find(&child).map_or(0.0, |c| c.consumption);
                        policy.amount(value, consumption)
                    }
                    _ => policy.percentage(value),
                };
                try_set_child_value(&mut self.tree, &parent, &child, value, &levels)?;
            }
            AllocationEvent::ChildPercentageChanged {
                parent,
                child,
                percentage,
            } => {
                let percentage = policy.percentage(percentage);
                try_set_child_percentage(&mut self.tree, &parent, &child, percentage, &levels)?;
            }
            AllocationEvent::FlatItemChanged {
                list,
                item,
                percentage,
            } => {
                let percentage = policy.percentage(percentage);
                try_apply_flat_change(self.flat_mut(list), &item, percentage)?;
            }
            AllocationEvent::LevelToggled { level } => {
                let toggle = self.toggle_mut(level)?;
                toggle.enabled = !toggle.enabled;
            }
            AllocationEvent::LevelSet { level, enabled } => {
                self.toggle_mut(level)?.enabled = enabled;
            }
        }
        Ok(())
    }

    fn toggle_mut(&mut self, level: EntityLevel) -> Result<&mut LevelToggle> {
        self.toggles
            .iter_mut()
            .find(|t| t.level == level)
            .ok_or(SessionError::NoToggle(level))
    }

    /// Apply events in order. Rejected events are logged and skipped.
    pub fn replay<I>(&mut self, events: I) -> ReplaySummary
    where
        I: IntoIterator<Item = AllocationEvent>,
    {
        let mut summary = ReplaySummary::default();
        for (index, event) in events.into_iter().enumerate() {
            let kind = event.kind();
            match self.apply(event) {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    warn!(index, kind, error = %e, "event rejected");
                    summary.rejected += 1;
                }
            }
        }
        info!(applied = summary.applied, rejected = summary.rejected, "replay complete");
        summary
    }

    /// Reconciliation of every visible parent.
    pub fn reconciliations(&self) -> Vec<Reconciliation> {
        reconcile_tree(&self.tree, &self.levels())
    }

    /// Log every over- or under-allocated parent. Returns how many there were.
    pub fn report_mismatches(&self) -> usize {
        let mut count = 0;
        for r in self.reconciliations().iter().filter(|r| !r.status.is_valid()) {
            warn!(
                entity = %r.entity,
                strategy = r.strategy.as_str(),
                total = r.total,
                pool = r.pool,
                status = ?r.status,
                "allocation does not match renewable pool"
            );
            count += 1;
        }
        count
    }

    pub fn total_renewable(&self) -> f64 {
        total_renewable(self.rows())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tree: self.tree.clone(),
            customers: self.customers.clone(),
            products: self.products.clone(),
            custom_properties: self.custom_properties.clone(),
            toggles: self.toggles.clone(),
            reconciliations: self.reconciliations(),
            total_renewable: self.total_renewable(),
            flat_totals: FlatSummary {
                customers: flat_totals(&self.customers),
                products: flat_totals(&self.products),
                custom_properties: flat_totals(&self.custom_properties),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use verdant_allocation::{AllocationError, AllocationStatus};
    use verdant_hierarchy::{Allocation, EntityId};

    fn tree() -> Entity {
        Entity::new("co", "Acme", EntityLevel::Company, 20_000.0).with_children(vec![
            Entity::new("eu", "Europe", EntityLevel::Region, 12_000.0).with_children(vec![
                Entity::new("de", "Germany", EntityLevel::Country, 8_000.0).with_children(vec![
                    Entity::new("by", "Bavaria", EntityLevel::State, 8_000.0).with_children(vec![
                        Entity::new("muc", "Munich", EntityLevel::City, 8_000.0).with_children(
                            vec![
                                Entity::new("plant", "Plant 1", EntityLevel::Facility, 5_000.0),
                                Entity::new("office", "Office", EntityLevel::Facility, 3_000.0),
                            ],
                        ),
                    ]),
                ]),
                Entity::new("fr", "France", EntityLevel::Country, 4_000.0),
            ]),
            Entity::new("na", "North America", EntityLevel::Region, 8_000.0),
        ])
    }

    fn session() -> AllocationSession {
        AllocationSession::new(tree(), SessionConfig::default()).unwrap()
    }

    fn id(s: &str) -> EntityId {
        s.into()
    }

    #[test]
    fn rejects_invalid_tree() {
        let mut bad = tree();
        bad.children[1].id = id("eu");
        assert!(matches!(
            AllocationSession::new(bad, SessionConfig::default()),
            Err(SessionError::Hierarchy(_))
        ));
    }

    #[test]
    fn balanced_change_propagates() {
        let mut session = session();
        session
            .apply(AllocationEvent::RenewableChanged {
                entity: id("eu"),
                percentage: 50.0,
                snap: false,
            })
            .unwrap();

        let tree = session.tree();
        assert_eq!(tree.find(&id("eu")).unwrap().renewable_energy, 6_000.0);
        assert_eq!(tree.find(&id("plant")).unwrap().renewable_energy, 2_500.0);
        assert_eq!(tree.find(&id("na")).unwrap().renewable_energy, 0.0);
        assert_eq!(session.total_renewable(), 6_000.0);
    }

    #[test]
    fn inputs_are_clamped_at_the_boundary() {
        let mut session = session();
        session
            .apply(AllocationEvent::RenewableChanged {
                entity: id("na"),
                percentage: 140.0,
                snap: false,
            })
            .unwrap();
        assert_eq!(session.tree().find(&id("na")).unwrap().renewable_energy, 8_000.0);

        session
            .apply(AllocationEvent::StrategyChanged {
                entity: id("eu"),
                strategy: AllocationStrategy::Exact,
            })
            .unwrap();
        session
            .apply(AllocationEvent::ChildValueChanged {
                parent: id("eu"),
                child: id("fr"),
                value: 9_999.0,
            })
            .unwrap();
        let eu = session.tree().find(&id("eu")).unwrap();
        assert_eq!(eu.allocation.value_for(&id("fr")), 4_000.0);
    }

    #[test]
    fn hidden_levels_expose_facilities() {
        let mut session = session();
        // State and city are hidden by default.
        session
            .apply(AllocationEvent::StrategyChanged {
                entity: id("de"),
                strategy: AllocationStrategy::Percentage,
            })
            .unwrap();
        let de = session.tree().find(&id("de")).unwrap();
        let values = de.allocation.values().unwrap();
        assert_eq!(values.keys().cloned().collect::<Vec<_>>(), vec![id("office"), id("plant")]);

        session
            .apply(AllocationEvent::ChildPercentageChanged {
                parent: id("de"),
                child: id("plant"),
                percentage: 40.0,
            })
            .unwrap();
        assert_eq!(session.tree().find(&id("plant")).unwrap().renewable_energy, 2_000.0);
    }

    #[test]
    fn rejected_edit_leaves_state_untouched() {
        let mut session = session();
        let before = session.snapshot();

        let err = session
            .apply(AllocationEvent::ChildValueChanged {
                parent: id("eu"),
                child: id("plant"),
                value: 10.0,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Allocation(AllocationError::NotAVisibleChild { .. })
        ));

        assert!(session
            .apply(AllocationEvent::RenewableChanged {
                entity: id("atlantis"),
                percentage: 10.0,
                snap: true,
            })
            .is_err());
        assert!(matches!(
            session.apply(AllocationEvent::LevelToggled { level: EntityLevel::Company }),
            Err(SessionError::NoToggle(EntityLevel::Company))
        ));

        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn toggling_changes_visible_parents() {
        let mut session = session();
        let parents = |s: &AllocationSession| -> Vec<EntityId> {
            s.reconciliations().into_iter().map(|r| r.entity).collect()
        };
        assert_eq!(parents(&session), vec![id("co"), id("eu"), id("de")]);

        session
            .apply(AllocationEvent::LevelToggled { level: EntityLevel::State })
            .unwrap();
        assert_eq!(parents(&session), vec![id("co"), id("eu"), id("de"), id("by")]);

        session
            .apply(AllocationEvent::LevelSet {
                level: EntityLevel::Country,
                enabled: false,
            })
            .unwrap();
        assert_eq!(parents(&session), vec![id("co"), id("eu"), id("by")]);
    }

    #[test]
    fn snapped_row_change_lands_on_children_total() {
        let mut session = session();
        session
            .apply(AllocationEvent::AllocationReplaced {
                entity: id("eu"),
                allocation: Allocation::Exact(
                    [(id("de"), 2_000.0), (id("fr"), 1_000.0)].into_iter().collect(),
                ),
            })
            .unwrap();
        // 3_000 of 12_000 is 25%; 27% is within tolerance.
        session
            .apply(AllocationEvent::RenewableChanged {
                entity: id("eu"),
                percentage: 27.0,
                snap: true,
            })
            .unwrap();

        let eu = session.tree().find(&id("eu")).unwrap();
        assert_eq!(eu.renewable_energy, 3_000.0);
        assert_eq!(session.report_mismatches(), 0);
    }

    #[test]
    fn replay_counts_and_flags_mismatches() {
        let mut session = session();
        let summary = session.replay(vec![
            AllocationEvent::RenewableChanged {
                entity: id("eu"),
                percentage: 50.0,
                snap: false,
            },
            AllocationEvent::StrategyChanged {
                entity: id("eu"),
                strategy: AllocationStrategy::Percentage,
            },
            AllocationEvent::ChildValueChanged {
                parent: id("eu"),
                child: id("fr"),
                value: 100.0,
            },
            AllocationEvent::StrategyChanged {
                entity: id("nowhere"),
                strategy: AllocationStrategy::Exact,
            },
        ]);
        assert_eq!(summary, ReplaySummary { applied: 3, rejected: 1 });

        // de 50% of 8_000 plus fr 100% of 4_000 against a 6_000 pool.
        let eu = session
            .reconciliations()
            .into_iter()
            .find(|r| r.entity == id("eu"))
            .unwrap();
        assert_eq!(eu.total, 8_000.0);
        assert_eq!(eu.status, AllocationStatus::OverAllocated { excess: 2_000.0 });
        assert_eq!(session.report_mismatches(), 1);
    }

    #[test]
    fn flat_lists_are_independent() {
        let seed = SessionSeed {
            tree: tree(),
            customers: vec![SimpleAllocationItem::new("acme", "Acme", 1_000.0)],
            products: vec![SimpleAllocationItem::new("widget", "Widget", 400.0)],
            custom_properties: Vec::new(),
        };
        let mut session = AllocationSession::from_seed(seed, SessionConfig::default()).unwrap();
        session
            .apply(AllocationEvent::FlatItemChanged {
                list: FlatList::Products,
                item: id("widget"),
                percentage: 25.0,
            })
            .unwrap();
        assert!(session
            .apply(AllocationEvent::FlatItemChanged {
                list: FlatList::Customers,
                item: id("widget"),
                percentage: 25.0,
            })
            .is_err());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.products[0].renewable_energy, 100.0);
        assert_eq!(snapshot.customers[0].renewable_energy, 0.0);
        assert_eq!(snapshot.flat_totals.products.coverage_percentage(), 25.0);
    }

    #[test]
    fn loads_seed_and_events_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("tree.json");
        let events_path = dir.path().join("events.json");

        let seed = SessionSeed {
            tree: tree(),
            customers: Vec::new(),
            products: Vec::new(),
            custom_properties: Vec::new(),
        };
        std::fs::write(&seed_path, serde_json::to_string(&seed).unwrap()).unwrap();
        let mut file = std::fs::File::create(&events_path).unwrap();
        writeln!(
            file,
            r#"[{{"type": "renewable_changed", "entity": "na", "percentage": 25.0}}]"#
        )
        .unwrap();

        let loaded = SessionSeed::load(&seed_path).unwrap();
        assert_eq!(loaded, seed);
        let events = load_events(&events_path).unwrap();

        let mut session = AllocationSession::from_seed(loaded, SessionConfig::default()).unwrap();
        assert_eq!(session.replay(events).applied, 1);
        assert_eq!(session.total_renewable(), 2_000.0);

        assert!(matches!(
            SessionSeed::load(dir.path().join("missing.json")),
            Err(SessionError::Io(_))
        ));
        std::fs::write(&events_path, "not json").unwrap();
        assert!(matches!(load_events(&events_path), Err(SessionError::Serialization(_))));
    }

    #[test]
    fn loads_tree_with_partial_allocations() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("tree.json");
        std::fs::write(
            &seed_path,
            r#"{"tree": {
                "id": "acme", "name": "Acme", "level": "company", "consumption": 1000.0,
                "allocation": {"strategy": "balanced", "values": {}},
                "children": [
                    {"id": "eu", "name": "Europe", "level": "region", "consumption": 600.0,
                     "renewableEnergy": 0.0, "allocation": {"strategy": "percentage"},
                     "children": [
                        {"id": "de", "name": "Germany", "level": "country",
                         "consumption": 600.0}
                     ]},
                    {"id": "na", "name": "Americas", "level": "region", "consumption": 400.0,
                     "allocation": {"strategy": "exact", "values": null}}
                ]
            }}"#,
        )
        .unwrap();

        let seed = SessionSeed::load(&seed_path).unwrap();
        let mut session = AllocationSession::from_seed(seed, SessionConfig::default()).unwrap();
        let strategy = |s: &AllocationSession, entity: &str| {
            s.tree().find(&id(entity)).unwrap().allocation.strategy()
        };
        assert_eq!(strategy(&session, "acme"), AllocationStrategy::Balanced);
        assert_eq!(strategy(&session, "eu"), AllocationStrategy::Percentage);
        assert_eq!(strategy(&session, "na"), AllocationStrategy::Exact);
        assert_eq!(strategy(&session, "de"), AllocationStrategy::Balanced);

        session
            .apply(AllocationEvent::RenewableChanged {
                entity: id("acme"),
                percentage: 50.0,
                snap: false,
            })
            .unwrap();
        let energy = |s: &AllocationSession, entity: &str| {
            s.tree().find(&id(entity)).unwrap().renewable_energy
        };
        assert_eq!(energy(&session, "eu"), 300.0);
        assert_eq!(energy(&session, "de"), 300.0);
        assert_eq!(energy(&session, "na"), 200.0);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(session().snapshot()).unwrap();
        assert!(json.get("totalRenewable").is_some());
        assert!(json.get("customProperties").is_some());
        assert_eq!(json["tree"]["renewableEnergy"], 0.0);
    }
}
