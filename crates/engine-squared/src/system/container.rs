use super::{System, SystemId};

/// Ordered list of systems. Systems run in insertion order.
#[derive(Default)]
pub struct SystemContainer {
    systems: Vec<Box<dyn System>>,
}

impl SystemContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system. A duplicate id is not added again; the existing id is
    /// returned.
    pub fn add(&mut self, system: Box<dyn System>) -> SystemId {
        let id = system.id();
        if self.contains(id) {
            log::warn!("System `{}` already registered ({id})", system.name());
            return id;
        }
        self.systems.push(system);
        id
    }

    /// Remove and return the system, warning when it is unknown.
    pub fn remove(&mut self, id: SystemId) -> Option<Box<dyn System>> {
        let removed = self.take(id);
        if removed.is_none() {
            log::warn!("System {id} not found");
        }
        removed
    }

    /// Remove and return the system without complaining when it is unknown.
    pub(crate) fn take(&mut self, id: SystemId) -> Option<Box<dyn System>> {
        let index = self.systems.iter().position(|s| s.id() == id)?;
        Some(self.systems.remove(index))
    }

    pub fn contains(&self, id: SystemId) -> bool {
        self.systems.iter().any(|s| s.id() == id)
    }

    pub fn ids(&self) -> Vec<SystemId> {
        self.systems.iter().map(|s| s.id()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn System>> {
        self.systems.iter_mut()
    }

    /// Move every system of `other` to the end of `self`, skipping ids that
    /// are already present.
    pub(crate) fn append(&mut self, other: &mut SystemContainer) {
        for system in other.systems.drain(..) {
            if !self.contains(system.id()) {
                self.systems.push(system);
            }
        }
    }
}
