//! Visible-child resolution.
//!
//! A child whose level is disabled is skipped and its own visible children
//! are spliced in at its position, recursively. Every visibility-dependent
//! computation (strategy transitions, snap points, totals) goes through
//! [`visible_children`], so hiding a level neither orphans nor double-counts
//! any node.

use crate::{Entity, EntityId, LevelVisibility};

/// Visible children of `node`, in left-to-right order across skipped levels.
pub fn visible_children<'a>(node: &'a Entity, levels: &LevelVisibility) -> Vec<&'a Entity> {
    let mut visible = Vec::new();
    collect_visible(&node.children, levels, &mut visible);
    visible
}

fn collect_visible<'a>(
    children: &'a [Entity],
    levels: &LevelVisibility,
    out: &mut Vec<&'a Entity>,
) {
    for child in children {
        if levels.is_enabled(child.level) {
            out.push(child);
        } else {
            collect_visible(&child.children, levels, out);
        }
    }
}

/// Whether `node` has at least one visible child.
pub fn has_visible_children(node: &Entity, levels: &LevelVisibility) -> bool {
    fn any_visible(children: &[Entity], levels: &LevelVisibility) -> bool {
        children
            .iter()
            .any(|child| levels.is_enabled(child.level) || any_visible(&child.children, levels))
    }
    any_visible(&node.children, levels)
}

/// Ids of the visible children of `node`.
pub fn visible_child_ids(node: &Entity, levels: &LevelVisibility) -> Vec<EntityId> {
    visible_children(node, levels)
        .into_iter()
        .map(|child| child.id.clone())
        .collect()
}

/// The nearest ancestor of `id` whose visible children include it.
///
/// `None` for the root, for unknown ids, and for nodes whose own level is
/// hidden (they appear in no visible list).
pub fn visible_parent<'a>(
    root: &'a Entity,
    id: &EntityId,
    levels: &LevelVisibility,
) -> Option<&'a Entity> {
    let ancestors = root.ancestors_of(id)?;
    ancestors.into_iter().rev().find(|ancestor| {
        visible_children(ancestor, levels)
            .iter()
            .any(|child| child.id == *id)
    })
}
