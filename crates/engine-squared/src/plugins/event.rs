//! # Events — Typed Publish/Subscribe
//!
//! Two kinds of listeners:
//!
//! - **direct** callbacks (`FnMut(&E)`) run inside [`EventManager::push_event`];
//! - **scheduled** callbacks (`FnMut(&mut Core, &E)`) run when the
//!   [`process_events::<S>`](process_events) system runs in scheduler `S`.
//!
//! Pushing an event queues one clone per scheduler that listens for its type.
//! [`EventPlugin`] processes the `Update` and `FixedTimeUpdate` queues; other
//! schedulers need `core.systems::<S>().add(process_events::<S>)`.

use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::Core;
use crate::id::Id;
use crate::plugin::Plugin;
use crate::scheduler::{FixedTimeUpdate, Scheduler, Update};

pub enum CallbackTag {}

/// Returned by the `register_*` methods; pass it back to unregister.
pub type CallbackId = Id<CallbackTag>;

type DirectCallback = Box<dyn FnMut(&dyn Any)>;
type ScheduledCallback = Box<dyn FnMut(&mut Core, &dyn Any)>;

/// Scheduled callbacks of one scheduler, keyed by event type.
type ScheduledListeners = HashMap<TypeId, Vec<(CallbackId, ScheduledCallback)>>;

/// Pending events of one scheduler, tagged with their event type.
type EventQueue = VecDeque<(TypeId, Box<dyn Any>)>;

#[derive(Default)]
pub struct EventManager {
    next_id: u32,
    direct: HashMap<TypeId, Vec<(CallbackId, DirectCallback)>>,
    scheduled: HashMap<TypeId, ScheduledListeners>,
    queues: HashMap<TypeId, EventQueue>,
    /// Event types of listeners detached while their scheduler processes.
    detached: HashMap<TypeId, HashSet<TypeId>>,
    /// Unregistrations aimed at detached listeners.
    pending_removals: Vec<(TypeId, TypeId, CallbackId)>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> CallbackId {
        let id = CallbackId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Call `callback` every time an `E` is pushed.
    pub fn register_callback<E: 'static>(
        &mut self,
        mut callback: impl FnMut(&E) + 'static,
    ) -> CallbackId {
        let id = self.next_id();
        let erased: DirectCallback = Box::new(move |event| {
            if let Some(event) = event.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.direct.entry(TypeId::of::<E>()).or_default().push((id, erased));
        id
    }

    /// Call `callback` for each queued `E` when scheduler `S` processes its
    /// events.
    pub fn register_scheduled_callback<E: 'static, S: Scheduler>(
        &mut self,
        mut callback: impl FnMut(&mut Core, &E) + 'static,
    ) -> CallbackId {
        let id = self.next_id();
        let erased: ScheduledCallback = Box::new(move |core, event| {
            if let Some(event) = event.downcast_ref::<E>() {
                callback(core, event);
            }
        });
        self.scheduled
            .entry(TypeId::of::<S>())
            .or_default()
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, erased));
        id
    }

    /// Run direct callbacks for `event` now and queue it for every scheduler
    /// listening for `E`.
    pub fn push_event<E: Clone + 'static>(&mut self, event: E) {
        let eid = TypeId::of::<E>();
        // A scheduler can be both detached and listening again when one of its
        // callbacks registers a new listener mid-processing.
        let mut listening: HashSet<TypeId> = self
            .scheduled
            .iter()
            .filter(|(_, listeners)| listeners.get(&eid).is_some_and(|l| !l.is_empty()))
            .map(|(sid, _)| *sid)
            .collect();
        listening.extend(
            self.detached
                .iter()
                .filter(|(_, types)| types.contains(&eid))
                .map(|(sid, _)| *sid),
        );
        for sid in listening {
            self.queues
                .entry(sid)
                .or_default()
                .push_back((eid, Box::new(event.clone())));
        }

        if let Some(callbacks) = self.direct.get_mut(&eid) {
            for (_, callback) in callbacks.iter_mut() {
                callback(&event);
            }
        }
    }

    pub fn unregister_callback<E: 'static>(&mut self, id: CallbackId) {
        let Some(callbacks) = self.direct.get_mut(&TypeId::of::<E>()) else {
            log::warn!("No callbacks registered for event `{}`", type_name::<E>());
            return;
        };
        let before = callbacks.len();
        callbacks.retain(|(cid, _)| *cid != id);
        if callbacks.len() == before {
            log::warn!("Callback {id} not found for event `{}`", type_name::<E>());
        }
    }

    pub fn unregister_scheduled_callback<E: 'static, S: Scheduler>(&mut self, id: CallbackId) {
        let (sid, eid) = (TypeId::of::<S>(), TypeId::of::<E>());
        if self.detached.get(&sid).is_some_and(|types| types.contains(&eid)) {
            self.pending_removals.push((sid, eid, id));
            return;
        }
        let Some(callbacks) = self.scheduled.get_mut(&sid).and_then(|l| l.get_mut(&eid)) else {
            log::warn!(
                "No callbacks registered for event `{}` in `{}`",
                type_name::<E>(),
                type_name::<S>()
            );
            return;
        };
        let before = callbacks.len();
        callbacks.retain(|(cid, _)| *cid != id);
        if callbacks.len() == before {
            log::warn!("Callback {id} not found for event `{}`", type_name::<E>());
        }
    }

    /// True if `id` is a live direct callback for `E`.
    pub fn has_callback<E: 'static>(&self, id: CallbackId) -> bool {
        self.direct
            .get(&TypeId::of::<E>())
            .is_some_and(|callbacks| callbacks.iter().any(|(cid, _)| *cid == id))
    }

    pub fn has_scheduled_callback<E: 'static, S: Scheduler>(&self, id: CallbackId) -> bool {
        self.scheduled
            .get(&TypeId::of::<S>())
            .and_then(|listeners| listeners.get(&TypeId::of::<E>()))
            .is_some_and(|callbacks| callbacks.iter().any(|(cid, _)| *cid == id))
    }

    /// Events waiting for scheduler `S`.
    pub fn queued<S: Scheduler>(&self) -> usize {
        self.queues.get(&TypeId::of::<S>()).map_or(0, VecDeque::len)
    }

    fn detach(&mut self, sid: TypeId) -> Option<(EventQueue, ScheduledListeners)> {
        let queue = self.queues.remove(&sid).filter(|q| !q.is_empty())?;
        let listeners = self.scheduled.remove(&sid).unwrap_or_default();
        self.detached.insert(sid, listeners.keys().copied().collect());
        Some((queue, listeners))
    }

    fn reattach(&mut self, sid: TypeId, mut listeners: ScheduledListeners) {
        self.detached.remove(&sid);
        if let Some(added) = self.scheduled.remove(&sid) {
            for (eid, callbacks) in added {
                listeners.entry(eid).or_default().extend(callbacks);
            }
        }
        let (mine, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_removals)
            .into_iter()
            .partition(|(s, _, _)| *s == sid);
        self.pending_removals = others;
        for (_, eid, id) in mine {
            if let Some(callbacks) = listeners.get_mut(&eid) {
                callbacks.retain(|(cid, _)| *cid != id);
            }
        }
        self.scheduled.insert(sid, listeners);
    }
}

/// Drain scheduler `S`'s queue in FIFO order, calling its callbacks.
pub fn process_events<S: Scheduler>(core: &mut Core) {
    let sid = TypeId::of::<S>();
    let Some((queue, mut listeners)) = core
        .get_resource_mut::<EventManager>()
        .and_then(|manager| manager.detach(sid))
    else {
        return;
    };

    for (eid, event) in queue {
        let Some(callbacks) = listeners.get_mut(&eid) else {
            continue;
        };
        for (_, callback) in callbacks.iter_mut() {
            callback(core, event.as_ref());
        }
    }

    if let Some(manager) = core.get_resource_mut::<EventManager>() {
        manager.reattach(sid, listeners);
    }
}

/// Registers the [`EventManager`] and processes `Update` and
/// `FixedTimeUpdate` queues.
#[derive(Default)]
pub struct EventPlugin;

impl Plugin for EventPlugin {
    fn bind(&self, core: &mut Core) {
        core.register_resource(EventManager::new());
        core.systems::<Update>().add(process_events::<Update>);
        core.systems::<FixedTimeUpdate>()
            .add(process_events::<FixedTimeUpdate>);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq)]
    struct Hit(u32);

    #[derive(Clone)]
    struct Other;

    #[derive(Default)]
    struct Seen(Vec<u32>);

    #[test]
    fn direct_callbacks_run_immediately_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut manager = EventManager::new();
        let (a, b) = (seen.clone(), seen.clone());
        manager.register_callback(move |hit: &Hit| a.borrow_mut().push(("a", hit.0)));
        manager.register_callback(move |hit: &Hit| b.borrow_mut().push(("b", hit.0)));

        manager.push_event(Hit(7));
        manager.push_event(Other);
        assert_eq!(*seen.borrow(), [("a", 7), ("b", 7)]);
        assert_eq!(manager.queued::<Update>(), 0);
    }

    #[test]
    fn unregistering_direct_callbacks() {
        let mut manager = EventManager::new();
        let id = manager.register_callback(|_: &Hit| {});
        assert!(manager.has_callback::<Hit>(id));
        manager.unregister_callback::<Hit>(id);
        assert!(!manager.has_callback::<Hit>(id));
        manager.unregister_callback::<Hit>(id);
        manager.unregister_callback::<Other>(id);
    }

    #[test]
    fn scheduled_callbacks_run_with_their_scheduler() {
        let mut core = Core::new();
        core.add_plugin(EventPlugin);
        core.register_resource(Seen::default());
        core.resource_mut::<EventManager>()
            .register_scheduled_callback::<Hit, Update>(|core, hit| {
                core.resource_mut::<Seen>().0.push(hit.0)
            });

        let manager = core.resource_mut::<EventManager>();
        manager.push_event(Hit(1));
        manager.push_event(Hit(2));
        manager.push_event(Other);
        assert_eq!(manager.queued::<Update>(), 2);

        core.run_systems().unwrap();
        assert_eq!(core.resource::<Seen>().0, [1, 2]);
        assert_eq!(core.resource::<EventManager>().queued::<Update>(), 0);
    }

    #[test]
    fn callbacks_may_push_and_unregister_while_processing() {
        #[derive(Default)]
        struct Ids(Vec<CallbackId>);

        let mut core = Core::new();
        core.add_plugin(EventPlugin);
        core.register_resource(Seen::default());
        core.register_resource(Ids::default());
        let id = core
            .resource_mut::<EventManager>()
            .register_scheduled_callback::<Hit, Update>(|core, hit| {
                core.resource_mut::<Seen>().0.push(hit.0);
                let id = core.resource::<Ids>().0[0];
                let manager = core.resource_mut::<EventManager>();
                manager.push_event(Hit(hit.0 + 10));
                manager.unregister_scheduled_callback::<Hit, Update>(id);
            });
        core.resource_mut::<Ids>().0.push(id);

        core.resource_mut::<EventManager>().push_event(Hit(1));
        core.run_systems().unwrap();
        assert_eq!(core.resource::<Seen>().0, [1]);

        let manager = core.resource::<EventManager>();
        assert!(!manager.has_scheduled_callback::<Hit, Update>(id));
        assert_eq!(manager.queued::<Update>(), 1);
    }

    #[test]
    fn listener_registered_while_processing_queues_once() {
        let mut core = Core::new();
        core.add_plugin(EventPlugin);
        core.register_resource(Seen::default());
        core.resource_mut::<EventManager>()
            .register_scheduled_callback::<Hit, Update>(|core, hit| {
                core.resource_mut::<Seen>().0.push(hit.0);
                if hit.0 == 1 {
                    let manager = core.resource_mut::<EventManager>();
                    manager.register_scheduled_callback::<Hit, Update>(|_, _| {});
                    manager.push_event(Hit(2));
                }
            });

        core.resource_mut::<EventManager>().push_event(Hit(1));
        core.run_systems().unwrap();
        assert_eq!(core.resource::<Seen>().0, [1]);
        assert_eq!(core.resource::<EventManager>().queued::<Update>(), 1);

        core.run_systems().unwrap();
        assert_eq!(core.resource::<Seen>().0, [1, 2]);
    }
}
