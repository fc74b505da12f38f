//! # Entity — Generational Handles
//!
//! An [`Entity`] is an index into the registry's slot table paired with a
//! generation. Destroying an entity bumps the slot's generation, so any handle
//! still holding the old generation stops resolving instead of silently
//! pointing at whatever entity reuses the slot.
//!
//! ```text
//! Entity { index: 5, generation: 0 }  ← created
//! Entity { index: 5, generation: 1 }  ← slot reused after destroy
//! ```
//!
//! [`Entity::NULL`] is a sentinel that never resolves. Components such as
//! [`Relationship`](crate::plugins::relationship::Relationship) use it for
//! "no link".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to an entity stored in a [`Registry`](super::registry::Registry).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// The null entity. Never alive in any registry.
    pub const NULL: Entity = Entity {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    /// `true` only for [`Entity::NULL`].
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("Entity(null)");
        }
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("null");
        }
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out entity slots and recycles them with bumped generations.
///
/// ```text
/// slots: [(0, alive), (1, free), (0, alive), (2, free)]
/// free:  [1, 3]         ← destroyed slots waiting for reuse
/// ```
pub(crate) struct EntityAllocator {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

#[derive(Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn allocate(&mut self) -> Entity {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    alive: false,
                });
                self.slots.len() as u32 - 1
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.alive = true;
        Entity {
            index,
            generation: slot.generation,
        }
    }

    /// Returns `false` for stale, null or never-allocated handles.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.slots[entity.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.alive = false;
        self.free.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        !entity.is_null()
            && self
                .slots
                .get(entity.index as usize)
                .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn total_slots(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Release every live slot. Handles from before the reset never resolve
    /// again.
    pub fn reset(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.alive {
                slot.alive = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!((a.index(), a.generation()), (0, 0));
        assert_eq!((b.index(), b.generation()), (1, 0));
        assert_eq!(alloc.alive_count(), 2);
    }

    #[test]
    fn recycled_slot_bumps_generation() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.deallocate(a));
        let b = alloc.allocate();
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), 1);
        assert!(!alloc.is_alive(a));
        assert!(alloc.is_alive(b));
    }

    #[test]
    fn stale_and_null_handles_are_rejected() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.deallocate(a));
        assert!(!alloc.deallocate(a));
        assert!(!alloc.deallocate(Entity::NULL));
        assert!(!alloc.is_alive(Entity::NULL));
    }

    #[test]
    fn reset_invalidates_everything() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.deallocate(b);
        alloc.reset();
        assert!(!alloc.is_alive(a));
        assert_eq!(alloc.alive_count(), 0);
        assert_eq!(alloc.free_count(), 2);
        assert_eq!(alloc.total_slots(), 2);
        let c = alloc.allocate();
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn null_formatting() {
        assert!(Entity::NULL.is_null());
        assert_eq!(format!("{:?}", Entity::NULL), "Entity(null)");
        assert_eq!(Entity::default(), Entity::NULL);
        let e = Entity {
            index: 3,
            generation: 1,
        };
        assert_eq!(format!("{e:?}"), "Entity(3v1)");
        assert_eq!(e.to_string(), "3v1");
    }
}
