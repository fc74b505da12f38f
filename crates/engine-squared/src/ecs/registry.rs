//! # Registry — Entities and Their Components
//!
//! The registry owns the entity allocator and every archetype table. It is
//! the storage half of the [`Core`](crate::core::Core); schedulers, systems
//! and resources live on the core itself.
//!
//! ```text
//! Registry
//! ├── allocator   generational slots
//! ├── archetypes  [ [] , [Transform] , [Transform, Velocity] , .. ]
//! └── locations   entity index → (archetype, row)
//! ```
//!
//! Archetype 0 is always the empty signature, so every live entity has a
//! location, including one created without components.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use super::archetype::{Archetype, Signature, signature};
use super::bundle::ComponentBundle;
use super::component::{BoxedComponent, Component};
use super::entity::{Entity, EntityAllocator};
use super::query::{QueryFilter, QueryParam, assert_unique};

#[derive(Clone, Copy, Debug)]
struct Location {
    archetype: usize,
    row: usize,
}

/// Allocator counters reported to diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityPoolStats {
    pub total_slots: u32,
    pub free_count: usize,
    pub alive_count: usize,
}

pub struct Registry {
    allocator: EntityAllocator,
    archetypes: Vec<Archetype>,
    archetype_index: HashMap<Signature, usize>,
    locations: Vec<Option<Location>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let mut registry = Self {
            allocator: EntityAllocator::new(),
            archetypes: Vec::new(),
            archetype_index: HashMap::new(),
            locations: Vec::new(),
        };
        registry.archetype_for(Vec::new(), &HashMap::new());
        registry
    }

    // ── Entity lifecycle ─────────────────────────────────────────────

    /// Create an entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.place(entity, 0, Vec::new());
        entity
    }

    /// Create an entity holding every component of `bundle`.
    ///
    /// # Panics
    ///
    /// Panics if the bundle names the same component type twice.
    pub fn spawn<B: ComponentBundle>(&mut self, bundle: B) -> Entity {
        let types = B::type_ids();
        let sig = signature(types.clone());
        if sig.len() != types.len() {
            panic!("bundle `{}` contains a component type twice", type_name::<B>());
        }
        let names = types.into_iter().zip(B::type_names()).collect();
        let archetype = self.archetype_for(sig, &names);
        let entity = self.allocator.allocate();
        self.place(entity, archetype, bundle.into_components());
        entity
    }

    /// Destroy an entity and drop its components. Returns `false` for dead or
    /// null handles.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        let Some(loc) = self.location(entity) else {
            return false;
        };
        self.detach(entity, loc);
        self.allocator.deallocate(entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Destroy every entity. Archetype tables are kept for reuse.
    pub fn clear(&mut self) {
        for archetype in &mut self.archetypes {
            archetype.clear();
        }
        self.locations.clear();
        self.allocator.reset();
    }

    // ── Components ───────────────────────────────────────────────────

    /// Add `component` to `entity`, replacing any existing `T`, and return it.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> &mut T {
        let Some(loc) = self.location(entity) else {
            panic!("insert `{}` on dead entity {entity:?}", type_name::<T>());
        };
        let tid = TypeId::of::<T>();
        if let Some(column) = self.archetypes[loc.archetype].column_mut(tid) {
            column.replace(loc.row, Box::new(component));
        } else {
            let mut names = self.archetypes[loc.archetype].names().clone();
            names.insert(tid, type_name::<T>());
            let mut types = self.archetypes[loc.archetype].signature().clone();
            types.push(tid);
            let target = self.archetype_for(signature(types), &names);

            let mut values = self.detach(entity, loc);
            values.push((tid, Box::new(component)));
            self.place(entity, target, values);
        }
        self.get_mut::<T>(entity)
            .unwrap_or_else(|| panic!("`{}` missing right after insert", type_name::<T>()))
    }

    /// Detach `T` from `entity` and hand it back.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let loc = self.location(entity)?;
        let tid = TypeId::of::<T>();
        let source = &self.archetypes[loc.archetype];
        if !source.has(tid) {
            return None;
        }
        let mut names = source.names().clone();
        names.remove(&tid);
        let types = source.signature().iter().copied().filter(|t| *t != tid).collect();
        let target = self.archetype_for(types, &names);

        let mut values = self.detach(entity, loc);
        let position = values.iter().position(|(t, _)| *t == tid)?;
        let (_, removed) = values.swap_remove(position);
        self.place(entity, target, values);
        removed.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let loc = self.location(entity)?;
        let column = self.archetypes[loc.archetype].column(TypeId::of::<T>())?;
        Some(column.get::<T>(loc.row))
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let loc = self.location(entity)?;
        let column = self.archetypes[loc.archetype].column_mut(TypeId::of::<T>())?;
        Some(column.get_mut::<T>(loc.row))
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_all(entity, &[TypeId::of::<T>()])
    }

    /// `true` when `entity` is alive and carries every type in `types`.
    pub fn has_all(&self, entity: Entity, types: &[TypeId]) -> bool {
        self.location(entity)
            .is_some_and(|loc| self.archetypes[loc.archetype].has_all(types))
    }

    /// Type-erased read used by diagnostics formatting.
    pub fn get_any(&self, entity: Entity, tid: TypeId) -> Option<&dyn Any> {
        let loc = self.location(entity)?;
        let column = self.archetypes[loc.archetype].column(tid)?;
        Some(column.get_any(loc.row))
    }

    /// Remove `T` from every entity that has it. Returns how many were
    /// stripped.
    pub fn clear_component<T: Component>(&mut self) -> usize {
        let holders = self.entities_with::<T>();
        for &entity in &holders {
            self.remove::<T>(entity);
        }
        holders.len()
    }

    /// Type names of every component `entity` carries, sorted.
    pub fn component_names(&self, entity: Entity) -> Vec<&'static str> {
        let Some(loc) = self.location(entity) else {
            return Vec::new();
        };
        let archetype = &self.archetypes[loc.archetype];
        let mut names: Vec<_> = archetype
            .signature()
            .iter()
            .map(|tid| archetype.type_name(*tid))
            .collect();
        names.sort_unstable();
        names
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Visit every entity that has all components named by `Q`.
    pub fn query<Q: QueryParam>(&mut self, f: impl FnMut(Entity, Q::Item<'_>)) {
        self.query_filtered::<Q, ()>(f);
    }

    /// Like [`query`](Self::query), restricted to archetypes accepted by `F`.
    pub fn query_filtered<Q: QueryParam, F: QueryFilter>(
        &mut self,
        mut f: impl FnMut(Entity, Q::Item<'_>),
    ) {
        assert_unique::<Q>();
        let wanted = Q::type_ids();
        for archetype in &mut self.archetypes {
            if archetype.len() == 0 || !archetype.has_all(&wanted) || !F::matches(archetype) {
                continue;
            }
            let mut columns = Q::take_columns(archetype);
            for row in 0..archetype.entities.len() {
                f(archetype.entities[row], Q::fetch(&mut columns, row));
            }
            Q::restore_columns(columns, archetype);
        }
    }

    /// Run `f` on the only entity matching `Q`. Returns `None` when nothing
    /// matches.
    ///
    /// # Panics
    ///
    /// Panics if more than one entity matches.
    pub fn query_single<Q: QueryParam, R>(
        &mut self,
        f: impl FnOnce(Entity, Q::Item<'_>) -> R,
    ) -> Option<R> {
        assert_unique::<Q>();
        let wanted = Q::type_ids();
        let mut matching = self
            .archetypes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.len() > 0 && a.has_all(&wanted));
        let (index, archetype) = matching.next()?;
        if archetype.len() > 1 || matching.next().is_some() {
            panic!("query_single: more than one entity matches `{}`", type_name::<Q>());
        }

        let archetype = &mut self.archetypes[index];
        let entity = archetype.entities[0];
        let mut columns = Q::take_columns(archetype);
        let result = f(entity, Q::fetch(&mut columns, 0));
        Q::restore_columns(columns, archetype);
        Some(result)
    }

    /// Every live entity carrying `T`.
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        let tid = TypeId::of::<T>();
        self.archetypes
            .iter()
            .filter(|a| a.has(tid))
            .flat_map(|a| a.entities.iter().copied())
            .collect()
    }

    /// Every live entity, in storage order.
    pub fn entities(&self) -> Vec<Entity> {
        self.archetypes
            .iter()
            .flat_map(|a| a.entities.iter().copied())
            .collect()
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Number of archetypes that currently hold at least one entity.
    pub fn archetype_count(&self) -> usize {
        self.archetypes.iter().filter(|a| a.len() > 0).count()
    }

    pub fn pool_stats(&self) -> EntityPoolStats {
        EntityPoolStats {
            total_slots: self.allocator.total_slots(),
            free_count: self.allocator.free_count(),
            alive_count: self.allocator.alive_count(),
        }
    }

    /// `(entity count, sorted component names)` per non-empty archetype.
    pub fn archetype_summaries(&self) -> Vec<(usize, Vec<&'static str>)> {
        self.archetypes
            .iter()
            .filter(|a| a.len() > 0)
            .map(|a| {
                let mut names: Vec<_> = a.signature().iter().map(|t| a.type_name(*t)).collect();
                names.sort_unstable();
                (a.len(), names)
            })
            .collect()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn location(&self, entity: Entity) -> Option<Location> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.locations.get(entity.index as usize).copied().flatten()
    }

    fn archetype_for(&mut self, sig: Signature, names: &HashMap<TypeId, &'static str>) -> usize {
        if let Some(&index) = self.archetype_index.get(&sig) {
            return index;
        }
        let names = sig
            .iter()
            .map(|tid| (*tid, names.get(tid).copied().unwrap_or("<unknown>")))
            .collect();
        self.archetypes.push(Archetype::new(sig.clone(), names));
        let index = self.archetypes.len() - 1;
        self.archetype_index.insert(sig, index);
        index
    }

    fn place(&mut self, entity: Entity, archetype: usize, values: Vec<(TypeId, BoxedComponent)>) {
        let row = self.archetypes[archetype].push_row(entity, values);
        let slot = entity.index as usize;
        if self.locations.len() <= slot {
            self.locations.resize(slot + 1, None);
        }
        self.locations[slot] = Some(Location { archetype, row });
    }

    /// Pull the entity's row out of its archetype and re-point whichever
    /// entity was swapped into the hole.
    fn detach(&mut self, entity: Entity, loc: Location) -> Vec<(TypeId, BoxedComponent)> {
        let removed = self.archetypes[loc.archetype].remove_row(loc.row);
        if let Some(moved) = removed.moved {
            self.locations[moved.index as usize] = Some(loc);
        }
        self.locations[entity.index as usize] = None;
        removed.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::query::{With, Without};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Player;

    #[test]
    fn create_and_destroy() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        assert!(reg.is_alive(e));
        assert_eq!(reg.entity_count(), 1);
        assert!(reg.destroy(e));
        assert!(!reg.is_alive(e));
        assert!(!reg.destroy(e));
        assert_eq!(reg.entity_count(), 0);
    }

    #[test]
    fn spawn_bundle_and_get() {
        let mut reg = Registry::new();
        let e = reg.spawn((Position { x: 1.0, y: 2.0 }, Velocity { dx: 3.0, dy: 4.0 }));
        assert_eq!(reg.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(reg.get::<Velocity>(e).map(|v| v.dx), Some(3.0));
        assert!(reg.get::<Player>(e).is_none());
    }

    #[test]
    #[should_panic(expected = "twice")]
    fn spawn_duplicate_types_panics() {
        let mut reg = Registry::new();
        reg.spawn((1u32, 2u32));
    }

    #[test]
    fn insert_migrates_and_replaces() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        reg.insert(e, Position { x: 0.0, y: 0.0 });
        reg.insert(e, Velocity { dx: 1.0, dy: 0.0 });
        assert!(reg.has::<Position>(e));
        assert!(reg.has::<Velocity>(e));

        reg.insert(e, Position { x: 5.0, y: 5.0 }).x += 1.0;
        assert_eq!(reg.get::<Position>(e).unwrap().x, 6.0);
        assert_eq!(reg.component_names(e).len(), 2);
    }

    #[test]
    fn remove_returns_component_and_keeps_others() {
        let mut reg = Registry::new();
        let e = reg.spawn((Position { x: 1.0, y: 1.0 }, Velocity { dx: 2.0, dy: 2.0 }));
        let removed = reg.remove::<Velocity>(e);
        assert_eq!(removed, Some(Velocity { dx: 2.0, dy: 2.0 }));
        assert!(!reg.has::<Velocity>(e));
        assert_eq!(reg.get::<Position>(e).unwrap().x, 1.0);
        assert_eq!(reg.remove::<Velocity>(e), None);
    }

    #[test]
    fn swap_remove_keeps_other_entities_addressable() {
        let mut reg = Registry::new();
        let a = reg.spawn((Position { x: 1.0, y: 0.0 },));
        let b = reg.spawn((Position { x: 2.0, y: 0.0 },));
        let c = reg.spawn((Position { x: 3.0, y: 0.0 },));

        reg.destroy(a);
        assert_eq!(reg.get::<Position>(b).unwrap().x, 2.0);
        assert_eq!(reg.get::<Position>(c).unwrap().x, 3.0);

        reg.insert(b, Player);
        assert_eq!(reg.get::<Position>(c).unwrap().x, 3.0);
        assert_eq!(reg.get::<Position>(b).unwrap().x, 2.0);
    }

    #[test]
    fn query_reads_and_writes() {
        let mut reg = Registry::new();
        reg.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 2.0 }));
        reg.spawn((Position { x: 10.0, y: 0.0 }, Velocity { dx: -1.0, dy: 0.0 }, Player));
        reg.spawn((Position { x: 99.0, y: 99.0 },));

        reg.query::<(&mut Position, &Velocity)>(|_, (pos, vel)| {
            pos.x += vel.dx;
            pos.y += vel.dy;
        });

        let mut xs = Vec::new();
        reg.query::<(&Position,)>(|_, (pos,)| xs.push(pos.x));
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs, vec![1.0, 9.0, 99.0]);
    }

    #[test]
    fn filters_narrow_archetypes() {
        let mut reg = Registry::new();
        let player = reg.spawn((Position { x: 1.0, y: 0.0 }, Player));
        reg.spawn((Position { x: 2.0, y: 0.0 },));

        let mut with = Vec::new();
        reg.query_filtered::<&Position, With<Player>>(|e, _| with.push(e));
        assert_eq!(with, vec![player]);

        let mut without = 0;
        reg.query_filtered::<&Position, (Without<Player>,)>(|_, _| without += 1);
        assert_eq!(without, 1);
    }

    #[test]
    fn query_single_cases() {
        let mut reg = Registry::new();
        assert_eq!(reg.query_single::<&Player, _>(|_, _| ()), None);
        let p = reg.spawn((Player, Position { x: 4.0, y: 0.0 }));
        let found = reg.query_single::<(&Player, &Position), _>(|e, (_, pos)| (e, pos.x));
        assert_eq!(found, Some((p, 4.0)));
    }

    #[test]
    #[should_panic(expected = "more than one entity")]
    fn query_single_panics_on_many() {
        let mut reg = Registry::new();
        reg.spawn((Player,));
        reg.spawn((Player,));
        reg.query_single::<&Player, _>(|_, _| ());
    }

    #[test]
    fn clear_component_and_clear() {
        let mut reg = Registry::new();
        let a = reg.spawn((Player, Position { x: 0.0, y: 0.0 }));
        let b = reg.spawn((Player,));
        reg.spawn((Position { x: 0.0, y: 0.0 },));

        assert_eq!(reg.clear_component::<Player>(), 2);
        assert!(!reg.has::<Player>(a));
        assert!(reg.is_alive(b));
        assert_eq!(reg.entities_with::<Position>().len(), 2);

        reg.clear();
        assert_eq!(reg.entity_count(), 0);
        assert!(!reg.is_alive(a));
        assert_eq!(reg.archetype_count(), 0);
        let fresh = reg.create_entity();
        assert!(reg.is_alive(fresh));
        assert!(!reg.has::<Player>(fresh));
    }

    #[test]
    fn pool_stats_track_recycling() {
        let mut reg = Registry::new();
        let a = reg.create_entity();
        reg.create_entity();
        reg.destroy(a);
        assert_eq!(
            reg.pool_stats(),
            EntityPoolStats {
                total_slots: 2,
                free_count: 1,
                alive_count: 1,
            }
        );
    }
}
