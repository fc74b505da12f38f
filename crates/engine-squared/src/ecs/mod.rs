//! # ECS Storage
//!
//! Archetype-based entity/component storage. [`Registry`](registry::Registry)
//! is the entry point; the other modules are its building blocks.

pub(crate) mod archetype;
pub mod bundle;
pub mod component;
pub mod entity;
pub mod query;
pub mod registry;

pub use bundle::ComponentBundle;
pub use component::Component;
pub use entity::Entity;
pub use query::{QueryFilter, QueryParam, With, Without};
pub use registry::{EntityPoolStats, Registry};
