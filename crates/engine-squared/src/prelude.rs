//! Convenience re-exports — `use engine_squared::prelude::*` for the common items.

pub use crate::config::{CoreConfig, DefaultScheduler};
pub use crate::core::{Core, remove_temporary_components};
pub use crate::ecs::{Component, ComponentBundle, Entity, Registry, With, Without};
pub use crate::error::{EngineError, SystemError, SystemResult};
pub use crate::id::{Id, StringId};
pub use crate::plugin::{Plugin, PluginGroup};
pub use crate::plugins::event::{CallbackId, EventManager, process_events};
pub use crate::plugins::input::{Input, InputManager, KeyCode, MouseButton};
pub use crate::plugins::native_scripting::{NativeScripting, ScriptableEntity};
pub use crate::plugins::object::{GlobalTransform, Mesh, MeshFaces, Transform, shape};
pub use crate::plugins::relationship::{Relationship, children_of, parent_of, set_child_of};
pub use crate::plugins::scene::{Scene, SceneManager};
pub use crate::plugins::{
    EventPlugin, InputPlugin, NativeScriptingPlugin, ObjectPlugin, RelationshipPlugin,
    RenderingPipelinePlugin, ScenePlugin,
};
pub use crate::scheduler::{
    ErrorPolicy, FixedTimeUpdate, RelativeTimeUpdate, Scheduler, Shutdown, Startup, Update,
};
pub use crate::system::{IntoSystem, System, SystemId};
pub use crate::time::{Time, TimeSource};
pub use glam::{Mat4, Quat, Vec2, Vec3};
#[cfg(feature = "diagnostics")]
pub use crate::diag::{DiagnosticsPlugin, init_logger};
