//! Type-keyed singleton storage.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

/// One value per type. [`Core`](super::Core) exposes these as resources.
#[derive(Default)]
pub struct Resources {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, replacing any previous value of the same type, and
    /// return it.
    pub fn insert<T: 'static>(&mut self, value: T) -> &mut T {
        let slot = self
            .values
            .entry(TypeId::of::<T>())
            .and_modify(|_| log::debug!("Replacing resource `{}`", type_name::<T>()))
            .or_insert_with(|| Box::new(()));
        *slot = Box::new(value);
        slot.downcast_mut()
            .unwrap_or_else(|| panic!("resource slot for `{}` holds another type", type_name::<T>()))
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values.get(&TypeId::of::<T>())?.downcast_ref()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let boxed = self.values.remove(&TypeId::of::<T>())?;
        boxed.downcast().ok().map(|value| *value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
