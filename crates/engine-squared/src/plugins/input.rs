//! Keyboard and mouse input state.
//!
//! The [`InputManager`] resource is fed by whatever owns the window (one call
//! per event) and read by systems. "Just" states last until the end of the
//! frame: [`clear_frame_input`] runs in `Presentation`.

use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

use super::rendering_pipeline::{Presentation, RenderingPipelinePlugin};
use crate::core::Core;
use crate::plugin::Plugin;

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame
/// - `just_released`: released this frame
#[derive(Clone, Debug)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    pub fn any_pressed(&self) -> bool {
        !self.pressed.is_empty()
    }

    /// Repeated presses of a held input are ignored.
    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    pub fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct InputManager {
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    cursor_position: Vec2,
    cursor_delta: Vec2,
    scroll: Vec2,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Feeding ──────────────────────────────────────────────────────

    pub fn key_event(&mut self, key: KeyCode, pressed: bool) {
        log::debug!("Key {key:?} {}", if pressed { "pressed" } else { "released" });
        if pressed {
            self.keys.press(key);
        } else {
            self.keys.release(key);
        }
    }

    pub fn mouse_button_event(&mut self, button: MouseButton, pressed: bool) {
        log::debug!(
            "Mouse button {button:?} {}",
            if pressed { "pressed" } else { "released" }
        );
        if pressed {
            self.mouse.press(button);
        } else {
            self.mouse.release(button);
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        log::debug!("Cursor moved to {position}");
        self.cursor_delta += position - self.cursor_position;
        self.cursor_position = position;
    }

    pub fn scrolled(&mut self, delta: Vec2) {
        log::debug!("Scrolled {delta}");
        self.scroll += delta;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed(key)
    }

    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys.just_pressed(key)
    }

    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.keys.just_released(key)
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse.pressed(button)
    }

    pub fn is_mouse_button_just_pressed(&self, button: MouseButton) -> bool {
        self.mouse.just_pressed(button)
    }

    pub fn is_mouse_button_just_released(&self, button: MouseButton) -> bool {
        self.mouse.just_released(button)
    }

    pub fn cursor_position(&self) -> Vec2 {
        self.cursor_position
    }

    /// Cursor movement since the last clear.
    pub fn cursor_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    /// Scroll accumulated since the last clear.
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// Drop per-frame state. Held inputs and the cursor position stay.
    pub fn end_frame(&mut self) {
        self.keys.clear_just();
        self.mouse.clear_just();
        self.cursor_delta = Vec2::ZERO;
        self.scroll = Vec2::ZERO;
    }
}

pub fn clear_frame_input(core: &mut Core) {
    if let Some(input) = core.get_resource_mut::<InputManager>() {
        input.end_frame();
    }
}

/// Registers the [`InputManager`] and clears it in `Presentation`.
#[derive(Default)]
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn bind(&self, core: &mut Core) {
        core.require_plugin::<RenderingPipelinePlugin>();
        core.register_resource(InputManager::new());
        core.systems::<Presentation>().add(clear_frame_input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Update;

    #[test]
    fn press_release_cycle() {
        let mut input = Input::<KeyCode>::new();
        input.press(KeyCode::Space);
        assert!(input.pressed(KeyCode::Space));
        assert!(input.just_pressed(KeyCode::Space));

        input.clear_just();
        input.press(KeyCode::Space);
        assert!(!input.just_pressed(KeyCode::Space));

        input.release(KeyCode::Space);
        assert!(!input.pressed(KeyCode::Space));
        assert!(input.just_released(KeyCode::Space));
        input.release(KeyCode::Space);
        input.clear_just();
        assert!(!input.just_released(KeyCode::Space));
    }

    #[test]
    fn cursor_and_scroll_accumulate_until_cleared() {
        let mut manager = InputManager::new();
        manager.cursor_moved(Vec2::new(10.0, 5.0));
        manager.cursor_moved(Vec2::new(12.0, 5.0));
        manager.scrolled(Vec2::Y);
        manager.scrolled(Vec2::Y);
        assert_eq!(manager.cursor_delta(), Vec2::new(12.0, 5.0));
        assert_eq!(manager.scroll(), Vec2::new(0.0, 2.0));

        manager.end_frame();
        assert_eq!(manager.cursor_position(), Vec2::new(12.0, 5.0));
        assert_eq!(manager.cursor_delta(), Vec2::ZERO);
        assert_eq!(manager.scroll(), Vec2::ZERO);
    }

    #[test]
    fn just_pressed_lasts_one_frame() {
        #[derive(Default)]
        struct Seen(Vec<bool>);

        let mut core = Core::new();
        core.add_plugin(InputPlugin);
        assert!(core.has_plugin::<RenderingPipelinePlugin>());
        core.register_resource(Seen::default());
        core.systems::<Update>().add(|core: &mut Core| {
            let jumped = core.resource::<InputManager>().is_key_just_pressed(KeyCode::Space);
            core.resource_mut::<Seen>().0.push(jumped);
        });

        core.resource_mut::<InputManager>()
            .key_event(KeyCode::Space, true);
        core.run_systems().unwrap();
        core.run_systems().unwrap();
        assert_eq!(core.resource::<Seen>().0, [true, false]);
        assert!(core.resource::<InputManager>().is_key_pressed(KeyCode::Space));
    }
}
