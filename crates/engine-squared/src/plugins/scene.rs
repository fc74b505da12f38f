//! Named scenes with load/unload hooks.
//!
//! ```ignore
//! core.add_plugin(ScenePlugin);
//! let scenes = core.resource_mut::<SceneManager>();
//! scenes.register_scene("menu", MenuScene::default());
//! scenes.set_next_scene("menu");
//! // the next `update_scene` run loads it
//! ```

use std::collections::HashMap;

use crate::core::Core;
use crate::plugin::Plugin;
use crate::scheduler::Update;

pub trait Scene: 'static {
    fn load(&mut self, core: &mut Core);
    fn unload(&mut self, core: &mut Core);
}

#[derive(Default)]
pub struct SceneManager {
    scenes: HashMap<String, Box<dyn Scene>>,
    current: Option<String>,
    next: Option<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `scene` under `name`. A name that is already taken keeps its
    /// first scene.
    pub fn register_scene(&mut self, name: impl Into<String>, scene: impl Scene) {
        let name = name.into();
        if self.scenes.contains_key(&name) {
            log::warn!("Scene `{name}` already registered");
            return;
        }
        self.scenes.insert(name, Box::new(scene));
    }

    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Queue `name` to be loaded by the next [`update`](Self::update).
    pub fn set_next_scene(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.scenes.contains_key(&name) {
            log::error!("Scene not found: {name}");
            return;
        }
        self.next = Some(name);
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn next_scene(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Unload the current scene, then load the next one.
    pub fn update(core: &mut Core) {
        let manager = core.resource_mut::<SceneManager>();
        let Some(next) = manager.next.clone() else {
            log::warn!("Unable to load next scene: no next scene provided");
            return;
        };
        if !manager.scenes.contains_key(&next) {
            log::error!("Scene not found: {next}");
            manager.next = None;
            return;
        }

        if let Some(current) = manager.current.take() {
            log::info!("Unloading scene: {current}");
            with_scene(core, &current, |scene, core| scene.unload(core));
        }
        log::info!("Loading scene: {next}");
        with_scene(core, &next, |scene, core| scene.load(core));

        let manager = core.resource_mut::<SceneManager>();
        manager.current = Some(next);
        manager.next = None;
    }
}

/// Run `f` on scene `name` with the scene detached from the manager.
fn with_scene(core: &mut Core, name: &str, f: impl FnOnce(&mut dyn Scene, &mut Core)) {
    let Some(mut scene) = core.resource_mut::<SceneManager>().scenes.remove(name) else {
        log::error!("Scene not found: {name}");
        return;
    };
    f(scene.as_mut(), core);
    core.resource_mut::<SceneManager>()
        .scenes
        .entry(name.to_owned())
        .or_insert(scene);
}

/// Load the next scene if one is queued.
pub fn update_scene(core: &mut Core) {
    if core.resource::<SceneManager>().next.is_some() {
        SceneManager::update(core);
    }
}

#[derive(Default)]
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn bind(&self, core: &mut Core) {
        core.register_resource(SceneManager::new());
        core.systems::<Update>().add(update_scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Journal(Vec<String>);

    struct Named(&'static str);

    impl Scene for Named {
        fn load(&mut self, core: &mut Core) {
            core.resource_mut::<Journal>().0.push(format!("load {}", self.0));
        }

        fn unload(&mut self, core: &mut Core) {
            core.resource_mut::<Journal>().0.push(format!("unload {}", self.0));
        }
    }

    fn core_with_scenes() -> Core {
        let mut core = Core::new();
        core.add_plugin(ScenePlugin);
        core.register_resource(Journal::default());
        let scenes = core.resource_mut::<SceneManager>();
        scenes.register_scene("menu", Named("menu"));
        scenes.register_scene("level", Named("level"));
        core
    }

    #[test]
    fn switching_unloads_then_loads() {
        let mut core = core_with_scenes();
        core.resource_mut::<SceneManager>().set_next_scene("menu");
        core.run_systems().unwrap();
        core.resource_mut::<SceneManager>().set_next_scene("level");
        core.run_systems().unwrap();
        core.run_systems().unwrap();

        assert_eq!(
            core.resource::<Journal>().0,
            ["load menu", "unload menu", "load level"]
        );
        let scenes = core.resource::<SceneManager>();
        assert_eq!(scenes.current_scene(), Some("level"));
        assert_eq!(scenes.next_scene(), None);
    }

    #[test]
    fn unknown_scenes_are_rejected() {
        let mut core = core_with_scenes();
        core.resource_mut::<SceneManager>().set_next_scene("credits");
        assert_eq!(core.resource::<SceneManager>().next_scene(), None);
        SceneManager::update(&mut core);
        assert!(core.resource::<Journal>().0.is_empty());
    }

    #[test]
    fn missing_next_scene_keeps_the_current_one() {
        let mut core = core_with_scenes();
        core.resource_mut::<SceneManager>().set_next_scene("menu");
        SceneManager::update(&mut core);

        core.resource_mut::<SceneManager>().next = Some("ghost".to_owned());
        SceneManager::update(&mut core);
        let scenes = core.resource::<SceneManager>();
        assert_eq!(scenes.current_scene(), Some("menu"));
        assert_eq!(scenes.next_scene(), None);
        assert_eq!(core.resource::<Journal>().0, ["load menu"]);
    }

    #[test]
    fn duplicate_names_keep_the_first_scene() {
        let mut core = core_with_scenes();
        core.resource_mut::<SceneManager>()
            .register_scene("menu", Named("other"));
        core.resource_mut::<SceneManager>().set_next_scene("menu");
        SceneManager::update(&mut core);
        assert_eq!(core.resource::<Journal>().0, ["load menu"]);
    }
}
