//! Component helpers on [`Entity`] that go through a [`Core`].
//!
//! ```ignore
//! let player = Entity::create(&mut core);
//! player.add_component(&mut core, Health(100));
//! player.add_temporary_component(&mut core, JustSpawned);
//! if player.has_components::<(Health, JustSpawned)>(&core) { .. }
//! ```

use std::any::{TypeId, type_name};

use super::Core;
use crate::ecs::{Component, ComponentBundle, Entity, Registry};

impl Entity {
    pub fn create(core: &mut Core) -> Entity {
        core.create_entity()
    }

    /// Insert `component`, replacing any existing one of the same type.
    pub fn add_component<T: Component>(self, core: &mut Core, component: T) -> &mut T {
        log::debug!("[EntityID:{self}] AddComponent: {}", type_name::<T>());
        core.registry_mut().insert(self, component)
    }

    /// Insert the component built by `make` unless the entity already has
    /// one. Either way, return the stored component.
    pub fn add_component_if_not_exists<T: Component>(
        self,
        core: &mut Core,
        make: impl FnOnce() -> T,
    ) -> &mut T {
        if core.registry().has::<T>(self) {
            return self.get_component_mut(core);
        }
        self.add_component(core, make())
    }

    /// Insert a component that [`remove_temporary_components`] strips from
    /// every entity.
    pub fn add_temporary_component<T: Component>(self, core: &mut Core, component: T) -> &mut T {
        core.temporary_components
            .entry(TypeId::of::<T>())
            .or_insert((
                type_name::<T>(),
                Registry::clear_component::<T> as fn(&mut Registry) -> usize,
            ));
        self.add_component(core, component)
    }

    pub fn remove_component<T: Component>(self, core: &mut Core) -> Option<T> {
        log::debug!("[EntityID:{self}] RemoveComponent: {}", type_name::<T>());
        core.registry_mut().remove(self)
    }

    pub fn has_component<T: Component>(self, core: &Core) -> bool {
        core.registry().has::<T>(self)
    }

    /// True if the entity has every component in the tuple `B`.
    pub fn has_components<B: ComponentBundle>(self, core: &Core) -> bool {
        core.registry().has_all(self, &B::type_ids())
    }

    /// # Panics
    ///
    /// If the entity has no `T`.
    pub fn get_component<T: Component>(self, core: &Core) -> &T {
        core.registry()
            .get(self)
            .unwrap_or_else(|| missing_component::<T>(self))
    }

    /// # Panics
    ///
    /// If the entity has no `T`.
    pub fn get_component_mut<T: Component>(self, core: &mut Core) -> &mut T {
        core.registry_mut()
            .get_mut(self)
            .unwrap_or_else(|| missing_component::<T>(self))
    }

    pub fn try_get_component<T: Component>(self, core: &Core) -> Option<&T> {
        core.registry().get(self)
    }

    pub fn try_get_component_mut<T: Component>(self, core: &mut Core) -> Option<&mut T> {
        core.registry_mut().get_mut(self)
    }

    pub fn destroy(self, core: &mut Core) -> bool {
        core.kill_entity(self)
    }

    pub fn is_alive(self, core: &Core) -> bool {
        core.is_entity_valid(self)
    }
}

fn missing_component<T>(entity: Entity) -> ! {
    panic!("Entity {entity} has no component `{}`", type_name::<T>())
}

/// Strip every temporary component type from every entity, then forget the
/// recorded types.
pub fn remove_temporary_components(core: &mut Core) {
    if core.temporary_components.is_empty() {
        return;
    }
    for (_, (name, clear)) in std::mem::take(&mut core.temporary_components) {
        let removed = clear(core.registry_mut());
        log::debug!("RemoveTemporaryComponent: {name} ({removed} removed)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    struct Clicked;
    struct Hovered;

    #[test]
    fn add_get_remove() {
        let mut core = Core::new();
        let entity = Entity::create(&mut core);
        entity.add_component(&mut core, Health(10)).0 += 5;
        assert_eq!(entity.get_component::<Health>(&core), &Health(15));
        assert!(entity.has_component::<Health>(&core));

        assert_eq!(entity.remove_component::<Health>(&mut core), Some(Health(15)));
        assert!(entity.try_get_component::<Health>(&core).is_none());
        assert!(entity.remove_component::<Health>(&mut core).is_none());
    }

    #[test]
    fn add_if_not_exists_keeps_the_existing_value() {
        let mut core = Core::new();
        let entity = Entity::create(&mut core);
        entity.add_component_if_not_exists(&mut core, || Health(1));
        let health = entity.add_component_if_not_exists(&mut core, || Health(99));
        assert_eq!(health, &Health(1));
    }

    #[test]
    fn has_components_needs_all_of_them() {
        let mut core = Core::new();
        let entity = Entity::create(&mut core);
        entity.add_component(&mut core, Health(1));
        assert!(!entity.has_components::<(Health, Clicked)>(&core));
        entity.add_component(&mut core, Clicked);
        assert!(entity.has_components::<(Health, Clicked)>(&core));
    }

    #[test]
    #[should_panic(expected = "has no component")]
    fn get_missing_component_panics() {
        let mut core = Core::new();
        let entity = Entity::create(&mut core);
        entity.get_component::<Health>(&core);
    }

    #[test]
    fn temporary_components_are_stripped_by_the_system() {
        let mut core = Core::new();
        core.register_system(remove_temporary_components);
        let a = Entity::create(&mut core);
        let b = Entity::create(&mut core);
        a.add_temporary_component(&mut core, Clicked);
        b.add_temporary_component(&mut core, Hovered);
        b.add_component(&mut core, Health(3));

        core.run_systems().unwrap();
        assert!(!a.has_component::<Clicked>(&core));
        assert!(!b.has_component::<Hovered>(&core));
        assert!(b.has_component::<Health>(&core));
        assert!(core.temporary_components.is_empty());

        a.add_component(&mut core, Clicked);
        core.run_systems().unwrap();
        assert!(a.has_component::<Clicked>(&core));
    }

    #[test]
    fn destroy_through_the_entity() {
        let mut core = Core::new();
        let entity = Entity::create(&mut core);
        assert!(entity.is_alive(&core));
        assert!(entity.destroy(&mut core));
        assert!(!entity.is_alive(&core));
    }
}
