//! # Component — Type-Erased Columns
//!
//! A component is any `'static + Send + Sync` value. Archetypes hold a dynamic
//! set of component types, so each column is stored type-erased as boxed
//! `dyn Any` values and recovered with `downcast_ref`/`downcast_mut`. No
//! unsafe code; a type mismatch is a registry bug and panics.

use std::any::{Any, type_name};

/// Marker for types that can be stored as components.
pub trait Component: Any + Send + Sync {}

impl<T: Any + Send + Sync> Component for T {}

pub(crate) type BoxedComponent = Box<dyn Any + Send + Sync>;

/// One column of an archetype: the values of a single component type, one per
/// row.
#[derive(Default)]
pub struct ComponentColumn {
    values: Vec<BoxedComponent>,
}

impl ComponentColumn {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push<T: Component>(&mut self, value: T) {
        self.values.push(Box::new(value));
    }

    pub(crate) fn push_boxed(&mut self, value: BoxedComponent) {
        self.values.push(value);
    }

    pub fn get<T: Component>(&self, row: usize) -> &T {
        self.values[row]
            .downcast_ref()
            .unwrap_or_else(|| panic!("column does not hold `{}`", type_name::<T>()))
    }

    pub fn get_mut<T: Component>(&mut self, row: usize) -> &mut T {
        self.values[row]
            .downcast_mut()
            .unwrap_or_else(|| panic!("column does not hold `{}`", type_name::<T>()))
    }

    pub(crate) fn get_any(&self, row: usize) -> &dyn Any {
        &*self.values[row]
    }

    /// Swap-remove `row` and hand the value back. The last row moves into the
    /// hole.
    pub(crate) fn take(&mut self, row: usize) -> BoxedComponent {
        self.values.swap_remove(row)
    }

    /// Replace the value at `row`, dropping the old one.
    pub(crate) fn replace(&mut self, row: usize, value: BoxedComponent) {
        self.values[row] = value;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
