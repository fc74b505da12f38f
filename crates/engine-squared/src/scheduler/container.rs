//! Scheduler storage and ordering.
//!
//! Schedulers are ordered by "A before B" edges. The order is recomputed with
//! Kahn's algorithm only after registrations or edge changes; ties between
//! schedulers with no edge between them fall back to registration order, so
//! the result is deterministic.

use std::any::{TypeId, type_name};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::{ErrorPolicy, Scheduler, short_type_name};
use crate::error::{EngineError, SystemError};
use crate::system::{IntoSystem, SystemContainer, SystemId, SystemSet, with_error_handler};
use crate::core::Core;

#[derive(Clone, Copy, Debug)]
enum SystemCommand {
    Disable(SystemId),
    Enable(SystemId),
    Remove(SystemId),
}

pub(crate) struct SchedulerSlot {
    name: &'static str,
    registered_at: usize,
    scheduler: Option<Box<dyn Scheduler>>,
    enabled: SystemContainer,
    disabled: SystemContainer,
    registered: HashSet<SystemId>,
    error_policy: ErrorPolicy,
    running: bool,
    pending: Vec<SystemCommand>,
}

impl SchedulerSlot {
    fn new(name: &'static str, registered_at: usize, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            name,
            registered_at,
            scheduler: Some(scheduler),
            enabled: SystemContainer::new(),
            disabled: SystemContainer::new(),
            registered: HashSet::new(),
            error_policy: ErrorPolicy::default(),
            running: false,
            pending: Vec::new(),
        }
    }

    fn apply(&mut self, command: SystemCommand) {
        match command {
            SystemCommand::Disable(id) => {
                if self.disabled.contains(id) {
                    log::warn!("System {id} is already disabled in `{}`", self.name);
                } else if let Some(system) = self.enabled.take(id) {
                    self.disabled.add(system);
                } else {
                    log::warn!("System {id} not found in `{}`", self.name);
                }
            }
            SystemCommand::Enable(id) => {
                if self.enabled.contains(id) {
                    log::warn!("System {id} is already enabled in `{}`", self.name);
                } else if let Some(system) = self.disabled.take(id) {
                    self.enabled.add(system);
                } else {
                    log::warn!("System {id} not found in `{}`", self.name);
                }
            }
            SystemCommand::Remove(id) => {
                let removed = self.enabled.take(id).or_else(|| self.disabled.take(id));
                if removed.is_none() {
                    log::warn!("System {id} not found in `{}`", self.name);
                }
                self.registered.remove(&id);
            }
        }
    }

    fn command(&mut self, command: SystemCommand) {
        if self.running {
            self.pending.push(command);
        } else {
            self.apply(command);
        }
    }
}

/// Handle to the systems of one scheduler, from
/// [`Core::systems`](crate::core::Core::systems).
///
/// While the scheduler is running, `disable`, `enable` and `remove` are
/// queued and take effect once it finishes. Systems added while it runs are
/// appended after it.
pub struct Systems<'a> {
    slot: &'a mut SchedulerSlot,
}

impl Systems<'_> {
    /// Register one system. A system that is already registered is not added
    /// twice; its existing id is returned.
    pub fn add<M>(&mut self, system: impl IntoSystem<M>) -> SystemId {
        self.add_boxed(Box::new(system.into_system()))
    }

    /// Register several systems that run back to back, in order.
    pub fn add_set<M>(&mut self, set: impl SystemSet<M>) -> Vec<SystemId> {
        set.into_systems()
            .into_iter()
            .map(|system| self.add_boxed(system))
            .collect()
    }

    /// Register a system whose failures are first reported to `on_error`.
    pub fn add_with_error_handler<M>(
        &mut self,
        system: impl IntoSystem<M>,
        on_error: impl FnMut(&mut Core, &SystemError) + 'static,
    ) -> SystemId {
        self.add(with_error_handler(system, on_error))
    }

    fn add_boxed(&mut self, system: Box<dyn crate::system::System>) -> SystemId {
        let id = system.id();
        if !self.slot.registered.insert(id) {
            log::warn!(
                "System `{}` already registered in `{}`",
                system.name(),
                self.slot.name
            );
            return id;
        }
        self.slot.enabled.add(system)
    }

    pub fn disable(&mut self, id: SystemId) {
        self.slot.command(SystemCommand::Disable(id));
    }

    pub fn enable(&mut self, id: SystemId) {
        self.slot.command(SystemCommand::Enable(id));
    }

    /// Unregister a system, enabled or not. Returns whether it was known.
    pub fn remove(&mut self, id: SystemId) -> bool {
        let known = self.slot.registered.contains(&id);
        self.slot.command(SystemCommand::Remove(id));
        known
    }

    pub fn contains(&self, id: SystemId) -> bool {
        self.slot.registered.contains(&id)
    }

    pub fn is_enabled(&self, id: SystemId) -> bool {
        self.contains(id) && !self.slot.disabled.contains(id)
    }

    /// Registered systems, enabled or not.
    pub fn len(&self) -> usize {
        self.slot.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.registered.is_empty()
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.slot.error_policy
    }

    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.slot.error_policy = policy;
    }
}

/// Everything a running scheduler needs, detached from the container.
pub(crate) struct ActiveRun {
    pub name: &'static str,
    pub policy: ErrorPolicy,
    pub systems: SystemContainer,
}

#[derive(Default)]
pub struct SchedulerContainer {
    slots: HashMap<TypeId, SchedulerSlot>,
    next_registration: usize,
    /// `before → afters`.
    edges: HashMap<TypeId, HashSet<TypeId>>,
    order: Vec<TypeId>,
    dirty: bool,
    pending_removal: Vec<TypeId>,
}

impl SchedulerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `scheduler`. Re-registering a type swaps the timing policy
    /// but keeps its systems.
    pub(crate) fn insert<S: Scheduler>(&mut self, scheduler: S) {
        let tid = TypeId::of::<S>();
        if let Some(slot) = self.slots.get_mut(&tid) {
            log::warn!("Scheduler `{}` already registered, replacing it", slot.name);
            slot.scheduler = Some(Box::new(scheduler));
            return;
        }
        let name = short_type_name(type_name::<S>());
        let slot = SchedulerSlot::new(name, self.next_registration, Box::new(scheduler));
        self.next_registration += 1;
        self.slots.insert(tid, slot);
        self.dirty = true;
    }

    pub fn contains(&self, tid: TypeId) -> bool {
        self.slots.contains_key(&tid)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn name_of(&self, tid: TypeId) -> Option<&'static str> {
        self.slots.get(&tid).map(|slot| slot.name)
    }

    pub fn get<S: Scheduler>(&self) -> Option<&S> {
        let scheduler = self.slots.get(&TypeId::of::<S>())?.scheduler.as_deref()?;
        scheduler.as_any().downcast_ref()
    }

    pub fn get_mut<S: Scheduler>(&mut self) -> Option<&mut S> {
        let scheduler = self
            .slots
            .get_mut(&TypeId::of::<S>())?
            .scheduler
            .as_deref_mut()?;
        scheduler.as_any_mut().downcast_mut()
    }

    pub fn systems(&mut self, tid: TypeId) -> Option<Systems<'_>> {
        self.slots.get_mut(&tid).map(|slot| Systems { slot })
    }

    pub(crate) fn remove(&mut self, tid: TypeId) -> bool {
        let removed = self.slots.remove(&tid).is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub(crate) fn remove_later(&mut self, tid: TypeId) {
        self.pending_removal.push(tid);
    }

    pub(crate) fn apply_pending_removals(&mut self) {
        for tid in std::mem::take(&mut self.pending_removal) {
            self.remove(tid);
        }
    }

    /// `before` runs ahead of `after`.
    pub fn add_edge(&mut self, before: TypeId, after: TypeId) {
        if self.edges.entry(before).or_default().insert(after) {
            self.dirty = true;
        }
    }

    pub fn remove_edge(&mut self, before: TypeId, after: TypeId) {
        if self.edges.get_mut(&before).is_some_and(|afters| afters.remove(&after)) {
            self.dirty = true;
        }
    }

    pub fn has_edge(&self, before: TypeId, after: TypeId) -> bool {
        self.edges.get(&before).is_some_and(|afters| afters.contains(&after))
    }

    pub fn set_error_policy_for_all(&mut self, policy: ErrorPolicy) {
        for slot in self.slots.values_mut() {
            slot.error_policy = policy;
        }
    }

    /// Scheduler types in execution order. Edges naming an unregistered
    /// scheduler are ignored.
    pub fn order(&mut self) -> Result<&[TypeId], EngineError> {
        if self.dirty {
            self.order = self.sort()?;
            self.dirty = false;
        }
        Ok(&self.order)
    }

    fn sort(&self) -> Result<Vec<TypeId>, EngineError> {
        let mut in_degree: HashMap<TypeId, usize> = self.slots.keys().map(|t| (*t, 0)).collect();
        for (before, afters) in &self.edges {
            if !self.slots.contains_key(before) {
                continue;
            }
            for after in afters {
                if let Some(degree) = in_degree.get_mut(after) {
                    *degree += 1;
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<(usize, TypeId)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(tid, _)| Reverse((self.slots[tid].registered_at, *tid)))
            .collect();

        let mut order = Vec::with_capacity(self.slots.len());
        while let Some(Reverse((_, tid))) = ready.pop() {
            order.push(tid);
            let Some(afters) = self.edges.get(&tid) else {
                continue;
            };
            for after in afters {
                let Some(degree) = in_degree.get_mut(after) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((self.slots[after].registered_at, *after)));
                }
            }
        }

        if order.len() != self.slots.len() {
            return Err(EngineError::CyclicSchedulers);
        }
        Ok(order)
    }

    // ── Running ──────────────────────────────────────────────────────

    pub(crate) fn take_scheduler(&mut self, tid: TypeId) -> Option<Box<dyn Scheduler>> {
        self.slots.get_mut(&tid)?.scheduler.take()
    }

    pub(crate) fn restore_scheduler(&mut self, tid: TypeId, scheduler: Box<dyn Scheduler>) {
        if let Some(slot) = self.slots.get_mut(&tid) {
            slot.scheduler.get_or_insert(scheduler);
        }
    }

    pub(crate) fn begin_pass(&mut self, tid: TypeId, pass: usize) {
        if let Some(scheduler) = self.slots.get_mut(&tid).and_then(|s| s.scheduler.as_deref_mut()) {
            scheduler.begin_pass(pass);
        }
    }

    /// Detach the enabled systems for a run. Commands issued meanwhile are
    /// queued on the slot.
    pub(crate) fn begin_run(&mut self, tid: TypeId) -> Option<ActiveRun> {
        let slot = self.slots.get_mut(&tid)?;
        slot.running = true;
        Some(ActiveRun {
            name: slot.name,
            policy: slot.error_policy,
            systems: std::mem::take(&mut slot.enabled),
        })
    }

    /// Reattach the systems, append any added during the run, then apply the
    /// queued commands.
    pub(crate) fn end_run(&mut self, tid: TypeId, mut systems: SystemContainer) {
        let Some(slot) = self.slots.get_mut(&tid) else {
            return;
        };
        systems.append(&mut slot.enabled);
        slot.enabled = systems;
        slot.running = false;
        for command in std::mem::take(&mut slot.pending) {
            slot.apply(command);
        }
    }
}
