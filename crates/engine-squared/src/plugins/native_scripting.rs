//! Per-entity behaviour written as plain Rust types.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Spinner { turns: u32 }
//!
//! impl ScriptableEntity for Spinner {
//!     fn on_update(&mut self, core: &mut Core, entity: Entity) { self.turns += 1; }
//! }
//!
//! entity.add_component(&mut core, NativeScripting::bound::<Spinner>());
//! ```
//!
//! The instance is created on the first [`update_scripts`] run that sees the
//! entity, right before its first `on_update`.

use std::any::type_name;

use crate::core::Core;
use crate::ecs::Entity;
use crate::plugin::Plugin;
use crate::scheduler::Update;

pub trait ScriptableEntity: Send + Sync + 'static {
    fn on_create(&mut self, _core: &mut Core, _entity: Entity) {}
    fn on_update(&mut self, _core: &mut Core, _entity: Entity) {}
    fn on_destroy(&mut self, _core: &mut Core, _entity: Entity) {}
}

fn instantiate<T: ScriptableEntity + Default>() -> Box<dyn ScriptableEntity> {
    Box::new(T::default())
}

/// Component holding a script binding and, once created, its instance.
#[derive(Default)]
pub struct NativeScripting {
    instance: Option<Box<dyn ScriptableEntity>>,
    instantiate: Option<fn() -> Box<dyn ScriptableEntity>>,
    script_name: &'static str,
}

impl NativeScripting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound<T: ScriptableEntity + Default>() -> Self {
        let mut scripting = Self::new();
        scripting.bind::<T>();
        scripting
    }

    /// Bind script type `T`, dropping any existing instance.
    pub fn bind<T: ScriptableEntity + Default>(&mut self) -> &mut Self {
        self.instance = None;
        self.instantiate = Some(instantiate::<T>);
        self.script_name = type_name::<T>();
        self
    }

    pub fn is_bound(&self) -> bool {
        self.instantiate.is_some()
    }

    pub fn is_instantiated(&self) -> bool {
        self.instance.is_some()
    }

    pub fn script_name(&self) -> &'static str {
        self.script_name
    }
}

/// Create missing instances (calling `on_create`), then call `on_update`
/// on every scripted entity.
pub fn update_scripts(core: &mut Core) {
    let scripted = core.registry().entities_with::<NativeScripting>();
    for entity in scripted {
        let Some(scripting) = entity.try_get_component_mut::<NativeScripting>(core) else {
            continue;
        };
        let name = scripting.script_name;
        let (mut instance, created) = match (scripting.instance.take(), scripting.instantiate) {
            (Some(instance), _) => (instance, false),
            (None, Some(make)) => (make(), true),
            (None, None) => continue,
        };

        if created {
            log::debug!("[EntityID:{entity}] Instantiating script `{name}`");
            instance.on_create(core, entity);
        }
        instance.on_update(core, entity);

        if let Some(scripting) = entity.try_get_component_mut::<NativeScripting>(core) {
            if scripting.script_name == name && scripting.instance.is_none() {
                scripting.instance = Some(instance);
            }
        }
    }
}

/// Call `on_destroy` on the entity's script instance and drop it. The
/// binding stays, so a later [`update_scripts`] creates a fresh instance.
pub fn destroy_script(core: &mut Core, entity: Entity) {
    let Some(mut instance) = entity
        .try_get_component_mut::<NativeScripting>(core)
        .and_then(|scripting| scripting.instance.take())
    else {
        log::warn!("Entity {entity} has no script instance to destroy");
        return;
    };
    instance.on_destroy(core, entity);
}

/// Registers [`update_scripts`] on `Update`.
#[derive(Default)]
pub struct NativeScriptingPlugin;

impl Plugin for NativeScriptingPlugin {
    fn bind(&self, core: &mut Core) {
        core.systems::<Update>().add(update_scripts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Calls(Vec<&'static str>);

    struct Speed(f32);

    #[derive(Default)]
    struct SpeedManager;

    impl ScriptableEntity for SpeedManager {
        fn on_create(&mut self, core: &mut Core, _: Entity) {
            core.resource_mut::<Calls>().0.push("create");
        }

        fn on_update(&mut self, core: &mut Core, entity: Entity) {
            core.resource_mut::<Calls>().0.push("update");
            entity.get_component_mut::<Speed>(core).0 = 3.0;
        }

        fn on_destroy(&mut self, core: &mut Core, _: Entity) {
            core.resource_mut::<Calls>().0.push("destroy");
        }
    }

    fn scripted_core() -> (Core, Entity) {
        let mut core = Core::new();
        core.add_plugin(NativeScriptingPlugin);
        core.register_resource(Calls::default());
        let player = core.create_entity();
        player.add_component(&mut core, Speed(1.0));
        player.add_component(&mut core, NativeScripting::bound::<SpeedManager>());
        (core, player)
    }

    #[test]
    fn scripts_are_created_once_and_updated_every_frame() {
        let (mut core, player) = scripted_core();
        core.run_systems().unwrap();
        core.run_systems().unwrap();

        assert_eq!(core.resource::<Calls>().0, ["create", "update", "update"]);
        assert_eq!(player.get_component::<Speed>(&core).0, 3.0);
        assert!(player.get_component::<NativeScripting>(&core).is_instantiated());
    }

    #[test]
    fn destroyed_scripts_are_recreated() {
        let (mut core, player) = scripted_core();
        core.run_systems().unwrap();
        destroy_script(&mut core, player);
        assert!(!player.get_component::<NativeScripting>(&core).is_instantiated());
        core.run_systems().unwrap();

        assert_eq!(
            core.resource::<Calls>().0,
            ["create", "update", "destroy", "create", "update"]
        );
    }

    #[test]
    fn unbound_components_are_skipped() {
        let mut core = Core::new();
        let entity = core.create_entity();
        entity.add_component(&mut core, NativeScripting::new());
        update_scripts(&mut core);
        assert!(!entity.get_component::<NativeScripting>(&core).is_bound());
    }
}
