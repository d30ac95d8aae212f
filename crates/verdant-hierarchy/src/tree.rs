//! Id-keyed tree search, traversal and validation.
//!
//! Ids are assumed globally unique. Every lookup is a pre-order depth-first
//! walk (a node, then its children left to right, then its siblings), so the
//! first match wins if that assumption is ever broken. [`Entity::validate`]
//! reports duplicates.
//!
//! Trees are small (at most seven levels, a few hundred nodes), so a plain
//! walk per lookup is fine. [`EntityIndex`] trades one walk for O(depth)
//! lookups when many edits hit the same tree.

use std::collections::{HashMap, HashSet};

use crate::{Entity, EntityId, HierarchyError};

impl Entity {
    /// Find a node by id, this node included.
    pub fn find(&self, id: &EntityId) -> Option<&Entity> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Mutable variant of [`Entity::find`].
    pub fn find_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// The raw (not visibility-adjusted) parent of a node.
    pub fn find_parent(&self, id: &EntityId) -> Option<&Entity> {
        for child in &self.children {
            if child.id == *id {
                return Some(self);
            }
            if let Some(parent) = child.find_parent(id) {
                return Some(parent);
            }
        }
        None
    }

    /// Ancestors of a node from this root down to its raw parent.
    ///
    /// Empty when `id` is this node; `None` when it is absent.
    pub fn ancestors_of(&self, id: &EntityId) -> Option<Vec<&Entity>> {
        if self.id == *id {
            return Some(Vec::new());
        }
        for child in &self.children {
            if let Some(mut chain) = child.ancestors_of(id) {
                chain.insert(0, self);
                return Some(chain);
            }
        }
        None
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.find(id).is_some()
    }

    /// Pre-order iterator over all descendants, excluding this node.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Entity> {
        std::iter::once(self).chain(self.descendants())
    }

    /// Apply `f` to every descendant, excluding this node.
    pub fn for_each_descendant_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Entity),
    {
        for child in &mut self.children {
            f(child);
            child.for_each_descendant_mut(f);
        }
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Check the structural invariants of this subtree: unique ids,
    /// finite non-negative quantities, strictly deepening levels.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        let mut seen = HashSet::new();
        validate_node(self, &mut seen)
    }
}

fn validate_node<'a>(
    node: &'a Entity,
    seen: &mut HashSet<&'a EntityId>,
) -> Result<(), HierarchyError> {
    if !seen.insert(&node.id) {
        return Err(HierarchyError::DuplicateId(node.id.clone()));
    }

    for (field, value) in [
        ("consumption", node.consumption),
        ("renewableEnergy", node.renewable_energy),
    ] {
        if !value.is_finite() {
            return Err(HierarchyError::NonFiniteQuantity {
                id: node.id.clone(),
                field,
            });
        }
        if value < 0.0 {
            return Err(HierarchyError::NegativeQuantity {
                id: node.id.clone(),
                field,
                value,
            });
        }
    }

    for child in &node.children {
        if child.level <= node.level {
            return Err(HierarchyError::LevelOrder {
                parent: node.id.clone(),
                parent_level: node.level,
                child: child.id.clone(),
                child_level: child.level,
            });
        }
        validate_node(child, seen)?;
    }

    Ok(())
}

/// Pre-order descendant iterator, see [`Entity::descendants`].
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Entity>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Entity;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(entity) => {
                    self.stack.push(entity.children.iter());
                    return Some(entity);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Id → child-index path, built in one walk.
///
/// Allocation edits never add or remove nodes, so an index built once stays
/// valid for every tree derived from the same source by those edits.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    paths: HashMap<EntityId, Vec<usize>>,
}

impl EntityIndex {
    pub fn build(root: &Entity) -> Self {
        let mut index = Self::default();
        let mut path = Vec::new();
        index.insert(root, &mut path);
        index
    }

    fn insert(&mut self, node: &Entity, path: &mut Vec<usize>) {
        // First match wins, as with `Entity::find`.
        self.paths
            .entry(node.id.clone())
            .or_insert_with(|| path.clone());
        for (i, child) in node.children.iter().enumerate() {
            path.push(i);
            self.insert(child, path);
            path.pop();
        }
    }

    /// Child-index path from the root to `id`.
    pub fn path(&self, id: &EntityId) -> Option<&[usize]> {
        self.paths.get(id).map(Vec::as_slice)
    }

    pub fn get<'a>(&self, root: &'a Entity, id: &EntityId) -> Option<&'a Entity> {
        let path = self.path(id)?;
        path.iter()
            .try_fold(root, |node, &i| node.children.get(i))
    }

    pub fn get_mut<'a>(&self, root: &'a mut Entity, id: &EntityId) -> Option<&'a mut Entity> {
        let path = self.path(id)?;
        path.iter()
            .try_fold(root, |node, &i| node.children.get_mut(i))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityLevel;

    fn sample() -> Entity {
        Entity::new("co", "Company", EntityLevel::Company, 100.0).with_children(vec![
            Entity::new("eu", "Europe", EntityLevel::Region, 60.0).with_children(vec![
                Entity::new("de", "Germany", EntityLevel::Country, 40.0),
                Entity::new("fr", "France", EntityLevel::Country, 20.0),
            ]),
            Entity::new("us", "Americas", EntityLevel::Region, 40.0).with_children(vec![
                Entity::new("ca", "California", EntityLevel::State, 40.0),
            ]),
        ])
    }

    #[test]
    fn find_locates_nested_nodes() {
        let tree = sample();
        assert_eq!(tree.find(&"co".into()).map(|e| e.consumption), Some(100.0));
        assert_eq!(tree.find(&"fr".into()).map(|e| e.name.as_str()), Some("France"));
        assert!(tree.find(&"jp".into()).is_none());
    }

    #[test]
    fn find_prefers_first_match_in_pre_order() {
        let tree = Entity::new("root", "Root", EntityLevel::Company, 0.0).with_children(vec![
            Entity::new("a", "A", EntityLevel::Region, 0.0).with_children(vec![Entity::new(
                "dup",
                "deep",
                EntityLevel::Country,
                1.0,
            )]),
            Entity::new("dup", "shallow", EntityLevel::Region, 2.0),
        ]);
        assert_eq!(tree.find(&"dup".into()).map(|e| e.name.as_str()), Some("deep"));
        assert_eq!(
            tree.validate(),
            Err(HierarchyError::DuplicateId("dup".into()))
        );
    }

    #[test]
    fn find_parent_and_ancestors() {
        let tree = sample();
        assert_eq!(tree.find_parent(&"ca".into()).map(|e| e.id.as_str()), Some("us"));
        assert!(tree.find_parent(&"co".into()).is_none());

        let chain: Vec<_> = tree
            .ancestors_of(&"de".into())
            .unwrap()
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(chain, vec!["co", "eu"]);
        assert_eq!(tree.ancestors_of(&"co".into()).map(|c| c.len()), Some(0));
        assert!(tree.ancestors_of(&"jp".into()).is_none());
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = sample();
        let ids: Vec<_> = tree.descendants().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["eu", "de", "fr", "us", "ca"]);
        assert_eq!(tree.node_count(), 6);
    }

    #[test]
    fn find_mut_edits_in_place() {
        let mut tree = sample();
        tree.find_mut(&"de".into()).unwrap().renewable_energy = 12.0;
        assert_eq!(tree.find(&"de".into()).unwrap().renewable_energy, 12.0);
    }

    #[test]
    fn index_matches_walk() {
        let mut tree = sample();
        let index = EntityIndex::build(&tree);
        assert_eq!(index.len(), 6);
        for node in tree.walk() {
            assert_eq!(index.get(&tree, &node.id).map(|e| &e.id), Some(&node.id));
        }
        assert_eq!(index.path(&"ca".into()), Some(&[1, 0][..]));

        index.get_mut(&mut tree, &"fr".into()).unwrap().renewable_energy = 5.0;
        assert_eq!(tree.find(&"fr".into()).unwrap().renewable_energy, 5.0);
        assert!(index.get(&tree, &"jp".into()).is_none());
    }

    #[test]
    fn validate_rejects_bad_quantities_and_levels() {
        assert!(sample().validate().is_ok());

        let negative = Entity::new("x", "X", EntityLevel::City, -1.0);
        assert!(matches!(
            negative.validate(),
            Err(HierarchyError::NegativeQuantity { field: "consumption", .. })
        ));

        let nan = Entity::new("x", "X", EntityLevel::City, 1.0)
            .with_renewable(f64::NAN);
        assert!(matches!(
            nan.validate(),
            Err(HierarchyError::NonFiniteQuantity { field: "renewableEnergy", .. })
        ));

        let inverted = Entity::new("c", "City", EntityLevel::City, 1.0)
            .with_children(vec![Entity::new("r", "Region", EntityLevel::Region, 1.0)]);
        assert!(matches!(
            inverted.validate(),
            Err(HierarchyError::LevelOrder { .. })
        ));
    }
}
