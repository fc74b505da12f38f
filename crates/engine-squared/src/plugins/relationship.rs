//! Parent/child links between entities.
//!
//! Each linked entity carries a [`Relationship`]. A parent points at its
//! first child; siblings form a doubly linked list through `prev`/`next`:
//!
//! ```text
//! parent { first: c2, children: 3 }
//!          c2 ⇄ c1 ⇄ c0        (newest child first)
//! ```

use serde::{Deserialize, Serialize};

use crate::core::Core;
use crate::ecs::Entity;
use crate::plugin::Plugin;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub children: usize,
    pub first: Entity,
    pub prev: Entity,
    pub next: Entity,
    pub parent: Entity,
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            children: 0,
            first: Entity::NULL,
            prev: Entity::NULL,
            next: Entity::NULL,
            parent: Entity::NULL,
        }
    }
}

fn links(core: &Core, entity: Entity) -> Relationship {
    entity
        .try_get_component::<Relationship>(core)
        .copied()
        .unwrap_or_default()
}

fn links_mut(core: &mut Core, entity: Entity) -> &mut Relationship {
    entity.add_component_if_not_exists(core, Relationship::default)
}

/// Make `child` the first child of `parent`, detaching it from any
/// previous parent. Links that would create a cycle are refused.
pub fn set_child_of(core: &mut Core, child: Entity, parent: Entity) {
    if child == parent || is_ancestor_of(core, child, parent) {
        log::warn!("Entity {child} cannot become a child of its descendant {parent}");
        return;
    }
    let current = links(core, child).parent;
    if current == parent {
        log::warn!("Entity {child} is already a child of the parent {parent}");
        return;
    }
    if !current.is_null() {
        remove_parent(core, child);
    }

    let parent_links = links_mut(core, parent);
    parent_links.children += 1;
    let old_first = std::mem::replace(&mut parent_links.first, child);
    if !old_first.is_null() {
        match old_first.try_get_component_mut::<Relationship>(core) {
            Some(first) => first.prev = child,
            None => log::error!("Entity {old_first} is not a valid child of the parent {parent}"),
        }
    }

    let child_links = links_mut(core, child);
    child_links.parent = parent;
    child_links.prev = Entity::NULL;
    child_links.next = old_first;
}

/// Unlink `child` from its parent and siblings. Its own children stay.
pub fn remove_parent(core: &mut Core, child: Entity) {
    let linked = links(core, child);
    if linked.parent.is_null() {
        log::warn!("Entity {child} has no parent");
        return;
    }

    if linked.prev.is_null() {
        if let Some(parent) = linked.parent.try_get_component_mut::<Relationship>(core) {
            parent.first = linked.next;
        }
    } else if let Some(prev) = linked.prev.try_get_component_mut::<Relationship>(core) {
        prev.next = linked.next;
    }
    if !linked.next.is_null() {
        if let Some(next) = linked.next.try_get_component_mut::<Relationship>(core) {
            next.prev = linked.prev;
        }
    }
    if let Some(parent) = linked.parent.try_get_component_mut::<Relationship>(core) {
        parent.children = parent.children.saturating_sub(1);
    }

    let child_links = links_mut(core, child);
    child_links.parent = Entity::NULL;
    child_links.prev = Entity::NULL;
    child_links.next = Entity::NULL;
}

pub fn is_child_of(core: &Core, child: Entity, parent: Entity) -> bool {
    !parent.is_null() && links(core, child).parent == parent
}

pub fn parent_of(core: &Core, child: Entity) -> Option<Entity> {
    let parent = links(core, child).parent;
    (!parent.is_null()).then_some(parent)
}

/// True if `ancestor` appears anywhere above `entity`.
pub fn is_ancestor_of(core: &Core, ancestor: Entity, entity: Entity) -> bool {
    let mut current = links(core, entity).parent;
    while !current.is_null() {
        if current == ancestor {
            return true;
        }
        current = links(core, current).parent;
    }
    false
}

/// Children of `parent`, newest first.
pub fn children_of(core: &Core, parent: Entity) -> Vec<Entity> {
    let linked = links(core, parent);
    let mut children = Vec::with_capacity(linked.children);
    let mut current = linked.first;
    while !current.is_null() && children.len() < linked.children {
        children.push(current);
        current = links(core, current).next;
    }
    children
}

/// Cut every link `entity` takes part in: it leaves its parent's child list
/// and its children become roots. Called before an entity is killed.
pub(crate) fn unlink(core: &mut Core, entity: Entity) {
    let Some(linked) = entity.try_get_component::<Relationship>(core).copied() else {
        return;
    };
    if !linked.parent.is_null() {
        remove_parent(core, entity);
    }
    for child in children_of(core, entity) {
        if let Some(child_links) = child.try_get_component_mut::<Relationship>(core) {
            child_links.parent = Entity::NULL;
            child_links.prev = Entity::NULL;
            child_links.next = Entity::NULL;
        }
    }
    if let Some(own) = entity.try_get_component_mut::<Relationship>(core) {
        own.first = Entity::NULL;
        own.children = 0;
    }
}

#[derive(Default)]
pub struct RelationshipPlugin;

impl Plugin for RelationshipPlugin {
    fn bind(&self, _: &mut Core) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> (Core, Entity, [Entity; 3]) {
        let mut core = Core::new();
        let parent = core.create_entity();
        let kids = [core.create_entity(), core.create_entity(), core.create_entity()];
        for kid in kids {
            set_child_of(&mut core, kid, parent);
        }
        (core, parent, kids)
    }

    #[test]
    fn children_are_listed_newest_first() {
        let (core, parent, [a, b, c]) = family();
        assert_eq!(children_of(&core, parent), [c, b, a]);
        assert!(is_child_of(&core, a, parent));
        assert_eq!(parent_of(&core, b), Some(parent));
        assert_eq!(parent_of(&core, parent), None);
    }

    #[test]
    fn removing_a_middle_child_relinks_siblings() {
        let (mut core, parent, [a, b, c]) = family();
        remove_parent(&mut core, b);
        assert_eq!(children_of(&core, parent), [c, a]);
        assert_eq!(links(&core, c).next, a);
        assert_eq!(links(&core, a).prev, c);
        assert_eq!(links(&core, parent).children, 2);
        assert!(!is_child_of(&core, b, parent));
    }

    #[test]
    fn removing_the_first_child_moves_the_head() {
        let (mut core, parent, [a, b, c]) = family();
        remove_parent(&mut core, c);
        assert_eq!(links(&core, parent).first, b);
        assert_eq!(children_of(&core, parent), [b, a]);
    }

    #[test]
    fn reparenting_detaches_from_the_old_parent() {
        let (mut core, parent, [a, b, c]) = family();
        let other = core.create_entity();
        set_child_of(&mut core, b, other);
        assert_eq!(children_of(&core, parent), [c, a]);
        assert_eq!(children_of(&core, other), [b]);
        set_child_of(&mut core, b, other);
        assert_eq!(links(&core, other).children, 1);
    }

    #[test]
    fn cycles_are_refused() {
        let (mut core, parent, [a, ..]) = family();
        let grandchild = core.create_entity();
        set_child_of(&mut core, grandchild, a);
        assert!(is_ancestor_of(&core, parent, grandchild));

        set_child_of(&mut core, parent, grandchild);
        set_child_of(&mut core, parent, parent);
        assert_eq!(parent_of(&core, parent), None);
    }

    #[test]
    fn killing_a_child_keeps_its_siblings_listed() {
        let (mut core, parent, [a, b, c]) = family();
        assert!(core.kill_entity(c));
        assert_eq!(children_of(&core, parent), [b, a]);
        assert!(core.kill_entity(a));
        assert_eq!(children_of(&core, parent), [b]);
        assert_eq!(links(&core, parent).children, 1);
    }

    #[test]
    fn killing_a_parent_orphans_its_children() {
        let (mut core, parent, [a, b, c]) = family();
        assert!(core.kill_entity(parent));
        for kid in [a, b, c] {
            assert_eq!(parent_of(&core, kid), None);
            assert_eq!(links(&core, kid).next, Entity::NULL);
        }
    }
}
