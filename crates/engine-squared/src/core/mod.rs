//! # Core — The Engine Runtime
//!
//! A [`Core`] owns everything a running game needs:
//!
//! ```text
//! Core
//! ├── Registry            entities and their components
//! ├── Resources           one value per type (Time, EventManager, ...)
//! ├── SchedulerContainer  ordered schedulers, each with its systems
//! └── plugins             which plugin types are already bound
//! ```
//!
//! Each call to [`Core::run_systems`] is one frame: update [`Time`], order the
//! schedulers, run them, then apply deferred scheduler deletions.
//!
//! ## Example
//!
//! ```ignore
//! let mut core = Core::new();
//! core.register_resource(Score(0));
//! core.register_system(|core: &mut Core| core.resource_mut::<Score>().0 += 1);
//! core.systems::<Startup>().add(spawn_level);
//! core.run_core()?;
//! ```

mod entity;
mod resources;

pub use entity::remove_temporary_components;
pub use resources::Resources;

use std::any::{TypeId, type_name};
use std::collections::{HashMap, HashSet};

use crate::config::{CoreConfig, DefaultScheduler};
use crate::ecs::{Entity, Registry};
use crate::error::{EngineError, SystemError};
use crate::plugin::{Plugin, PluginGroup};
use crate::plugins::relationship;
use crate::scheduler::{
    ErrorPolicy, FixedTimeUpdate, RelativeTimeUpdate, Scheduler, SchedulerContainer, Shutdown,
    Startup, Systems, Update,
};
use crate::system::{IntoSystem, SystemId, SystemSet};
use crate::time::{Time, TimeSource};

#[cfg(feature = "diagnostics")]
use crate::diag::SchedulerTiming;

/// Clears one temporary component type from the registry.
type TemporaryCleaner = (&'static str, fn(&mut Registry) -> usize);

/// What the frame does after a scheduler finishes.
enum Flow {
    Continue,
    SkipRest,
}

pub struct Core {
    registry: Registry,
    resources: Resources,
    schedulers: SchedulerContainer,
    default_scheduler: TypeId,
    plugins: HashSet<TypeId>,
    plugin_names: Vec<&'static str>,
    temporary_components: HashMap<TypeId, TemporaryCleaner>,
    time_source: TimeSource,
    running: bool,
    in_frame: bool,
    #[cfg(feature = "diagnostics")]
    timings: Vec<SchedulerTiming>,
    #[cfg(feature = "diagnostics")]
    last_timings: Vec<SchedulerTiming>,
}

impl Core {
    /// A core on the real clock, with the default schedulers.
    pub fn new() -> Self {
        Self::with_time_source(TimeSource::real())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        let mut core = Self::new();
        core.configure(&config);
        core
    }

    /// A core driven by `time_source`. Tests use [`TimeSource::manual`].
    pub fn with_time_source(time_source: TimeSource) -> Self {
        let mut core = Self {
            registry: Registry::new(),
            resources: Resources::new(),
            schedulers: SchedulerContainer::new(),
            default_scheduler: TypeId::of::<Update>(),
            plugins: HashSet::new(),
            plugin_names: Vec::new(),
            temporary_components: HashMap::new(),
            running: false,
            in_frame: false,
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
            #[cfg(feature = "diagnostics")]
            last_timings: Vec::new(),
            time_source,
        };
        core.register_resource(Time::new(core.time_source.now()));

        core.register_scheduler(Startup::default());
        core.register_scheduler(FixedTimeUpdate::default());
        core.register_scheduler(RelativeTimeUpdate::default());
        core.register_scheduler(Update);
        core.register_scheduler(Shutdown);
        core.set_scheduler_before::<Startup, FixedTimeUpdate>();
        core.set_scheduler_before::<Startup, RelativeTimeUpdate>();
        core.set_scheduler_before::<Startup, Update>();
        core
    }

    /// Apply tick rates, error policy and default scheduler from `config`.
    pub fn configure(&mut self, config: &CoreConfig) {
        if let Some(fixed) = self.get_scheduler_mut::<FixedTimeUpdate>() {
            fixed.set_tick_rate(config.fixed_tick_rate());
        }
        if let Some(relative) = self.get_scheduler_mut::<RelativeTimeUpdate>() {
            relative.set_target_tick_rate(config.relative_tick_rate());
        }
        self.set_error_policy_for_all_schedulers(config.error_policy);
        match config.default_scheduler {
            DefaultScheduler::Update => self.set_default_scheduler::<Update>(),
            DefaultScheduler::FixedTimeUpdate => self.set_default_scheduler::<FixedTimeUpdate>(),
            DefaultScheduler::RelativeTimeUpdate => {
                self.set_default_scheduler::<RelativeTimeUpdate>()
            }
        }
    }

    pub fn time_source(&self) -> &TimeSource {
        &self.time_source
    }

    // ── Entities ─────────────────────────────────────────────────────

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn create_entity(&mut self) -> Entity {
        let entity = self.registry.create_entity();
        log::debug!("[EntityID:{entity}] Created");
        entity
    }

    /// Destroy `entity` and its components. Returns false if it was not
    /// alive.
    pub fn kill_entity(&mut self, entity: Entity) -> bool {
        if self.registry.is_alive(entity) {
            relationship::unlink(self, entity);
        }
        let killed = self.registry.destroy(entity);
        if killed {
            log::debug!("[EntityID:{entity}] Killed");
        } else {
            log::warn!("Cannot kill entity {entity}: not alive");
        }
        killed
    }

    pub fn is_entity_valid(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    pub fn clear_entities(&mut self) {
        self.registry.clear();
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Store a resource, replacing any previous one of the same type.
    pub fn register_resource<R: 'static>(&mut self, resource: R) -> &mut R {
        self.resources.insert(resource)
    }

    /// # Panics
    ///
    /// If `R` was never registered.
    pub fn resource<R: 'static>(&self) -> &R {
        self.resources
            .get()
            .unwrap_or_else(|| missing_resource::<R>())
    }

    /// # Panics
    ///
    /// If `R` was never registered.
    pub fn resource_mut<R: 'static>(&mut self) -> &mut R {
        self.resources
            .get_mut()
            .unwrap_or_else(|| missing_resource::<R>())
    }

    pub fn get_resource<R: 'static>(&self) -> Option<&R> {
        self.resources.get()
    }

    pub fn get_resource_mut<R: 'static>(&mut self) -> Option<&mut R> {
        self.resources.get_mut()
    }

    pub fn has_resource<R: 'static>(&self) -> bool {
        self.resources.contains::<R>()
    }

    pub fn delete_resource<R: 'static>(&mut self) -> Option<R> {
        self.resources.remove()
    }

    // ── Schedulers ───────────────────────────────────────────────────

    /// Register a scheduler. Every scheduler except [`Shutdown`] is ordered
    /// before `Shutdown`.
    pub fn register_scheduler<S: Scheduler>(&mut self, mut scheduler: S) -> &mut S {
        scheduler.on_register(&self.time_source);
        self.schedulers.insert(scheduler);
        if TypeId::of::<S>() != TypeId::of::<Shutdown>() {
            self.schedulers
                .add_edge(TypeId::of::<S>(), TypeId::of::<Shutdown>());
        }
        self.scheduler_mut::<S>()
    }

    /// # Panics
    ///
    /// If `S` is not registered.
    pub fn scheduler<S: Scheduler>(&self) -> &S {
        self.schedulers
            .get()
            .unwrap_or_else(|| missing_scheduler::<S>())
    }

    /// # Panics
    ///
    /// If `S` is not registered.
    pub fn scheduler_mut<S: Scheduler>(&mut self) -> &mut S {
        self.schedulers
            .get_mut()
            .unwrap_or_else(|| missing_scheduler::<S>())
    }

    pub fn get_scheduler<S: Scheduler>(&self) -> Option<&S> {
        self.schedulers.get()
    }

    pub fn get_scheduler_mut<S: Scheduler>(&mut self) -> Option<&mut S> {
        self.schedulers.get_mut()
    }

    pub fn has_scheduler<S: Scheduler>(&self) -> bool {
        self.schedulers.contains(TypeId::of::<S>())
    }

    /// Remove a scheduler and its systems. Inside a frame the removal waits
    /// until the frame ends.
    pub fn delete_scheduler<S: Scheduler>(&mut self) {
        let tid = TypeId::of::<S>();
        if !self.schedulers.contains(tid) {
            log::warn!("Cannot delete scheduler `{}`: not registered", type_name::<S>());
            return;
        }
        if tid == self.default_scheduler {
            log::warn!("Deleting the default scheduler `{}`", type_name::<S>());
        }
        if self.in_frame {
            self.schedulers.remove_later(tid);
        } else {
            self.schedulers.remove(tid);
        }
    }

    /// `A` runs before `B`.
    pub fn set_scheduler_before<A: Scheduler, B: Scheduler>(&mut self) {
        self.schedulers.add_edge(TypeId::of::<A>(), TypeId::of::<B>());
    }

    /// `A` runs after `B`.
    pub fn set_scheduler_after<A: Scheduler, B: Scheduler>(&mut self) {
        self.schedulers.add_edge(TypeId::of::<B>(), TypeId::of::<A>());
    }

    /// Drop the "`A` before `B`" constraint.
    pub fn remove_dependency_after<A: Scheduler, B: Scheduler>(&mut self) {
        self.schedulers
            .remove_edge(TypeId::of::<A>(), TypeId::of::<B>());
    }

    /// Drop the "`B` before `A`" constraint.
    pub fn remove_dependency_before<A: Scheduler, B: Scheduler>(&mut self) {
        self.schedulers
            .remove_edge(TypeId::of::<B>(), TypeId::of::<A>());
    }

    /// Scheduler that [`register_system`](Self::register_system) targets.
    pub fn set_default_scheduler<S: Scheduler>(&mut self) {
        if !self.has_scheduler::<S>() {
            log::warn!(
                "Cannot make `{}` the default scheduler: not registered",
                type_name::<S>()
            );
            return;
        }
        self.default_scheduler = TypeId::of::<S>();
    }

    pub fn set_error_policy_for_all_schedulers(&mut self, policy: ErrorPolicy) {
        self.schedulers.set_error_policy_for_all(policy);
    }

    /// Scheduler names in the order the next frame will run them.
    pub fn scheduler_order(&mut self) -> Result<Vec<&'static str>, EngineError> {
        let order = self.schedulers.order()?.to_vec();
        Ok(order
            .into_iter()
            .filter_map(|tid| self.schedulers.name_of(tid))
            .collect())
    }

    // ── Systems ──────────────────────────────────────────────────────

    /// The systems of scheduler `S`.
    ///
    /// # Panics
    ///
    /// If `S` is not registered.
    pub fn systems<S: Scheduler>(&mut self) -> Systems<'_> {
        self.schedulers
            .systems(TypeId::of::<S>())
            .unwrap_or_else(|| missing_scheduler::<S>())
    }

    pub fn try_systems<S: Scheduler>(&mut self) -> Option<Systems<'_>> {
        self.schedulers.systems(TypeId::of::<S>())
    }

    fn default_systems(&mut self) -> Systems<'_> {
        let tid = self.default_scheduler;
        self.schedulers
            .systems(tid)
            .unwrap_or_else(|| panic!("The default scheduler is not registered"))
    }

    /// Add a system to the default scheduler.
    pub fn register_system<M>(&mut self, system: impl IntoSystem<M>) -> SystemId {
        self.default_systems().add(system)
    }

    /// Add several systems to the default scheduler, in order.
    pub fn register_systems<M>(&mut self, set: impl SystemSet<M>) -> Vec<SystemId> {
        self.default_systems().add_set(set)
    }

    pub fn register_system_with_error_handler<M>(
        &mut self,
        system: impl IntoSystem<M>,
        on_error: impl FnMut(&mut Core, &SystemError) + 'static,
    ) -> SystemId {
        self.default_systems()
            .add_with_error_handler(system, on_error)
    }

    // ── Frames ───────────────────────────────────────────────────────

    /// Run one frame.
    ///
    /// Fails on a scheduler cycle, or when a system fails under
    /// [`ErrorPolicy::Nothing`].
    pub fn run_systems(&mut self) -> Result<(), EngineError> {
        let order = self.schedulers.order()?.to_vec();
        let now = self.time_source.now();
        if let Some(time) = self.resources.get_mut::<Time>() {
            time.update(now);
        }

        self.in_frame = true;
        let result = self.run_schedulers(&order);
        self.in_frame = false;
        self.schedulers.apply_pending_removals();

        #[cfg(feature = "diagnostics")]
        {
            self.last_timings = std::mem::take(&mut self.timings);
        }
        result
    }

    fn run_schedulers(&mut self, order: &[TypeId]) -> Result<(), EngineError> {
        for &tid in order {
            if let Flow::SkipRest = self.run_scheduler(tid)? {
                break;
            }
        }
        Ok(())
    }

    fn run_scheduler(&mut self, tid: TypeId) -> Result<Flow, EngineError> {
        let Some(mut scheduler) = self.schedulers.take_scheduler(tid) else {
            return Ok(Flow::Continue);
        };
        let passes = scheduler.prepare(self);
        self.schedulers.restore_scheduler(tid, scheduler);
        if passes == 0 {
            return Ok(Flow::Continue);
        }
        let Some(run) = self.schedulers.begin_run(tid) else {
            return Ok(Flow::Continue);
        };
        let (name, policy, mut systems) = (run.name, run.policy, run.systems);

        #[cfg(feature = "diagnostics")]
        let mut timing = SchedulerTiming::new(name, passes);

        let mut flow = Flow::Continue;
        let mut failure = None;
        'passes: for pass in 0..passes {
            self.schedulers.begin_pass(tid, pass);
            for (index, system) in systems.iter_mut().enumerate() {
                #[cfg(feature = "diagnostics")]
                let started = std::time::Instant::now();
                let result = system.run(self);
                #[cfg(feature = "diagnostics")]
                timing.record_system(index, system.name(), started.elapsed());
                #[cfg(not(feature = "diagnostics"))]
                let _ = index;

                let Err(err) = result else {
                    continue;
                };
                match policy {
                    ErrorPolicy::Silent => {
                        log::debug!("System `{}` in `{name}` failed: {err}", system.name());
                    }
                    ErrorPolicy::LogAndContinue => {
                        log::error!("System `{}` in `{name}` failed: {err}", system.name());
                    }
                    ErrorPolicy::LogAndFinishScheduler => {
                        log::error!(
                            "System `{}` in `{name}` failed: {err}. Finishing `{name}`, skipping the rest of the frame",
                            system.name()
                        );
                        flow = Flow::SkipRest;
                    }
                    ErrorPolicy::LogAndStop => {
                        log::error!(
                            "System `{}` in `{name}` failed: {err}. Stopping the core",
                            system.name()
                        );
                        self.running = false;
                        break 'passes;
                    }
                    ErrorPolicy::Nothing => {
                        failure = Some(EngineError::SystemFailed {
                            scheduler: name,
                            system: system.name().to_owned(),
                            source: err,
                        });
                        break 'passes;
                    }
                }
            }
        }
        self.schedulers.end_run(tid, systems);

        #[cfg(feature = "diagnostics")]
        self.timings.push(timing);

        match failure {
            Some(err) => Err(err),
            None => Ok(flow),
        }
    }

    /// Run frames until [`stop`](Self::stop) is called. The frame that
    /// stops the core also runs [`Shutdown`].
    pub fn run_core(&mut self) -> Result<(), EngineError> {
        self.running = true;
        log::info!("Core running");
        while self.running {
            self.run_systems()?;
        }
        log::info!("Core stopped");
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Per-scheduler timings of the last finished frame.
    #[cfg(feature = "diagnostics")]
    pub fn frame_timings(&self) -> &[SchedulerTiming] {
        &self.last_timings
    }

    // ── Plugins ──────────────────────────────────────────────────────

    /// Bind `plugin`. A plugin type that is already bound is skipped.
    pub fn add_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        if !self.plugins.insert(TypeId::of::<P>()) {
            log::warn!("Plugin `{}` already added, skipping", plugin.name());
            return self;
        }
        log::info!("Binding plugin `{}`", plugin.name());
        self.plugin_names.push(plugin.name());
        plugin.bind(self);
        self
    }

    pub fn add_plugins(&mut self, plugins: impl PluginGroup) -> &mut Self {
        plugins.add_to(self);
        self
    }

    /// Bind `P` with its default value unless it is already bound.
    pub fn require_plugin<P: Plugin + Default>(&mut self) {
        if !self.has_plugin::<P>() {
            self.add_plugin(P::default());
        }
    }

    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugins.contains(&TypeId::of::<P>())
    }

    pub fn has_plugin_type(&self, tid: TypeId) -> bool {
        self.plugins.contains(&tid)
    }

    /// Names of bound plugins, in bind order.
    pub fn plugin_names(&self) -> &[&'static str] {
        &self.plugin_names
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_resource<R>() -> ! {
    panic!(
        "Resource `{}` not found. Did you forget to register it?",
        type_name::<R>()
    )
}

fn missing_scheduler<S>() -> ! {
    panic!(
        "Scheduler `{}` not found. Did you forget to register it?",
        type_name::<S>()
    )
}
