//! # EngineSquared — Entity-Component-System Engine Core
//!
//! An archetype ECS with a scheduler-driven frame loop. A [`Core`](crate::core::Core)
//! owns the entities, the resources and an ordered set of schedulers; every
//! frame it runs each scheduler's systems zero, one or several times.
//!
//! Start with `use engine_squared::prelude::*`.
//!
//! ```ignore
//! use engine_squared::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut core = Core::new();
//!     core.add_plugins((EventPlugin, ScenePlugin));
//!     core.systems::<Startup>().add(spawn_world);
//!     core.register_system(move_things);
//!     core.run_core()
//! }
//! ```

pub mod config;
pub mod core;
pub mod ecs;
pub mod error;
pub mod id;
pub mod plugin;
pub mod plugins;
pub mod prelude;
pub mod scheduler;
pub mod system;
pub mod time;

#[cfg(feature = "diagnostics")]
pub mod diag;
