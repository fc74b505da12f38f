//! # System — Units of Per-Frame Work
//!
//! A system is anything that can run against the [`Core`]. Plain functions
//! and closures qualify directly:
//!
//! ```text
//! fn movement(core: &mut Core) { .. }                       // infallible
//! fn load(core: &mut Core) -> Result<(), MyError> { .. }    // fallible
//! ```
//!
//! [`IntoSystem`] converts either shape into a boxed [`System`]; the `Marker`
//! parameter only exists so the two blanket impls do not overlap. Fallible
//! systems hand their error to the owning scheduler, which applies its
//! [`ErrorPolicy`](crate::scheduler::ErrorPolicy).
//!
//! Every system has a [`SystemId`] derived from the concrete Rust type of the
//! callable. Each function item and each closure has its own type, so
//! registering the same function twice is detected as a duplicate.

mod container;
mod set;

pub use container::SystemContainer;
pub use set::{SingleSystem, SystemSet};

use std::any::{TypeId, type_name};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::core::Core;
use crate::error::{SystemError, SystemResult};

/// Identifier of a registered system.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(u64);

impl SystemId {
    /// Id of the system whose callable has type `T`.
    pub fn of<T: 'static>() -> Self {
        let mut hasher = DefaultHasher::new();
        TypeId::of::<T>().hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemId({:016x})", self.0)
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A unit of work run by a scheduler.
pub trait System: 'static {
    fn id(&self) -> SystemId;
    fn name(&self) -> &str;
    fn run(&mut self, core: &mut Core) -> SystemResult;
}

/// Conversion into a [`System`].
pub trait IntoSystem<Marker> {
    type System: System;
    fn into_system(self) -> Self::System;
}

/// Marker for values that already implement [`System`].
pub struct IsSystem;

impl<S: System> IntoSystem<IsSystem> for S {
    type System = S;

    fn into_system(self) -> S {
        self
    }
}

/// A system backed by a function or closure. `Out` is its return type.
pub struct FunctionSystem<F, Out> {
    func: F,
    name: String,
    _out: PhantomData<fn() -> Out>,
}

impl<F: 'static, Out> FunctionSystem<F, Out> {
    fn new(func: F) -> Self {
        Self {
            func,
            name: short_system_name(type_name::<F>()),
            _out: PhantomData,
        }
    }
}

impl<F> System for FunctionSystem<F, ()>
where
    F: FnMut(&mut Core) + 'static,
{
    fn id(&self) -> SystemId {
        SystemId::of::<F>()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, core: &mut Core) -> SystemResult {
        (self.func)(core);
        Ok(())
    }
}

impl<F, E> System for FunctionSystem<F, Result<(), E>>
where
    F: FnMut(&mut Core) -> Result<(), E> + 'static,
    E: Into<SystemError> + 'static,
{
    fn id(&self) -> SystemId {
        SystemId::of::<F>()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, core: &mut Core) -> SystemResult {
        (self.func)(core).map_err(Into::into)
    }
}

impl<F> IntoSystem<fn(&mut Core)> for F
where
    F: FnMut(&mut Core) + 'static,
{
    type System = FunctionSystem<F, ()>;

    fn into_system(self) -> Self::System {
        FunctionSystem::new(self)
    }
}

impl<F, E> IntoSystem<fn(&mut Core) -> Result<(), E>> for F
where
    F: FnMut(&mut Core) -> Result<(), E> + 'static,
    E: Into<SystemError> + 'static,
{
    type System = FunctionSystem<F, Result<(), E>>;

    fn into_system(self) -> Self::System {
        FunctionSystem::new(self)
    }
}

/// A system paired with an error callback.
///
/// When the inner system fails, `on_error` runs first and the error is then
/// passed on unchanged, so the scheduler's policy still applies.
pub struct WrappedSystem<S, H> {
    system: S,
    on_error: H,
}

/// Attach an error callback to a system.
pub fn with_error_handler<M, S, H>(system: S, on_error: H) -> WrappedSystem<S::System, H>
where
    S: IntoSystem<M>,
    H: FnMut(&mut Core, &SystemError) + 'static,
{
    WrappedSystem {
        system: system.into_system(),
        on_error,
    }
}

impl<S, H> System for WrappedSystem<S, H>
where
    S: System,
    H: FnMut(&mut Core, &SystemError) + 'static,
{
    fn id(&self) -> SystemId {
        self.system.id()
    }

    fn name(&self) -> &str {
        self.system.name()
    }

    fn run(&mut self, core: &mut Core) -> SystemResult {
        self.system.run(core).inspect_err(|err| (self.on_error)(core, err))
    }
}

/// `my_crate::systems::movement` → `movement`,
/// `my_crate::setup::{{closure}}` → `setup::{closure}`.
fn short_system_name(full: &str) -> String {
    let mut segments = full.rsplit("::");
    let last = segments.next().unwrap_or(full);
    if last.contains("closure") {
        match segments.find(|s| !s.contains("closure")) {
            Some(parent) => format!("{parent}::{{closure}}"),
            None => "{closure}".to_string(),
        }
    } else {
        last.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(core: &mut Core) {
        *core.resource_mut::<u32>() += 1;
    }

    fn fails(_: &mut Core) -> Result<(), String> {
        Err("boom".into())
    }

    fn boxed<M>(s: impl IntoSystem<M>) -> Box<dyn System> {
        Box::new(s.into_system())
    }

    #[test]
    fn function_names_are_shortened() {
        assert_eq!(boxed(tick).name(), "tick");
        let closure = boxed(|_: &mut Core| {});
        assert_eq!(closure.name(), "function_names_are_shortened::{closure}");
    }

    #[test]
    fn ids_follow_the_callable_type() {
        assert_eq!(boxed(tick).id(), boxed(tick).id());
        assert_ne!(boxed(tick).id(), boxed(fails).id());
    }

    #[test]
    fn infallible_and_fallible_systems_run() {
        let mut core = Core::new();
        core.register_resource(0u32);
        let mut sys = boxed(tick);
        assert!(sys.run(&mut core).is_ok());
        assert_eq!(*core.resource::<u32>(), 1);

        let err = boxed(fails).run(&mut core).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn wrapped_system_calls_handler_then_propagates() {
        let mut core = Core::new();
        core.register_resource(Vec::<String>::new());
        let mut sys = with_error_handler(fails, |core: &mut Core, err: &SystemError| {
            core.resource_mut::<Vec<String>>().push(err.to_string());
        });
        assert!(sys.run(&mut core).is_err());
        assert_eq!(core.resource::<Vec<String>>().as_slice(), ["boom"]);
        assert_eq!(sys.id(), boxed(fails).id());
    }

    #[test]
    fn short_names() {
        assert_eq!(short_system_name("a::b::movement"), "movement");
        assert_eq!(short_system_name("a::setup::{{closure}}"), "setup::{closure}");
        assert_eq!(short_system_name("plain"), "plain");
    }
}
