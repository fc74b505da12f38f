//! Built-in plugins.
//!
//! | Plugin                    | Provides                                      |
//! |---------------------------|-----------------------------------------------|
//! | [`EventPlugin`]           | `EventManager`, queued event processing       |
//! | [`RelationshipPlugin`]    | parent/child links                            |
//! | [`ObjectPlugin`]          | `Transform` → `GlobalTransform` propagation   |
//! | [`ScenePlugin`]           | `SceneManager`, scene switching               |
//! | [`NativeScriptingPlugin`] | per-entity Rust scripts                       |
//! | [`RenderingPipelinePlugin`] | frame stage schedulers                      |
//! | [`InputPlugin`]           | `InputManager`                                |

pub mod event;
pub mod input;
pub mod native_scripting;
pub mod object;
pub mod relationship;
pub mod rendering_pipeline;
pub mod scene;

pub use event::EventPlugin;
pub use input::InputPlugin;
pub use native_scripting::NativeScriptingPlugin;
pub use object::ObjectPlugin;
pub use relationship::RelationshipPlugin;
pub use rendering_pipeline::RenderingPipelinePlugin;
pub use scene::ScenePlugin;
