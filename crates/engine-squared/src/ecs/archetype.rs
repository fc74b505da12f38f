//! # Archetype — Tables of Entities Sharing a Component Signature
//!
//! Every entity lives in exactly one archetype: the table for its exact set of
//! component types. Row `i` of every column and of `entities` describes the
//! same entity.
//!
//! ```text
//! Archetype [Transform, Velocity]
//!   Transform: [t0, t1, t2]
//!   Velocity:  [v0, v1, v2]
//!   entities:  [e0, e1, e2]
//! ```
//!
//! Adding or removing a component moves the entity to the archetype for the
//! new signature. Removal is a swap-remove, so the caller must re-point the
//! entity that got moved into the vacated row.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{BoxedComponent, ComponentColumn};
use super::entity::Entity;

/// Sorted, deduplicated component types. `(A, B)` and `(B, A)` share a key.
pub(crate) type Signature = Vec<TypeId>;

pub(crate) fn signature(mut types: Vec<TypeId>) -> Signature {
    types.sort();
    types.dedup();
    types
}

/// Storage for every entity with one exact component signature.
pub struct Archetype {
    signature: Signature,
    names: HashMap<TypeId, &'static str>,
    column_of: HashMap<TypeId, usize>,
    pub(crate) columns: Vec<ComponentColumn>,
    pub(crate) entities: Vec<Entity>,
}

/// Outcome of removing a row: the removed values by type, plus the entity
/// that was swapped into the row, if any.
pub(crate) struct RemovedRow {
    pub values: Vec<(TypeId, BoxedComponent)>,
    pub moved: Option<Entity>,
}

impl Archetype {
    pub(crate) fn new(signature: Signature, names: HashMap<TypeId, &'static str>) -> Self {
        let column_of = signature
            .iter()
            .enumerate()
            .map(|(i, tid)| (*tid, i))
            .collect();
        let columns = signature.iter().map(|_| ComponentColumn::new()).collect();
        Self {
            signature,
            names,
            column_of,
            columns,
            entities: Vec::new(),
        }
    }

    pub(crate) fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn has(&self, tid: TypeId) -> bool {
        self.column_of.contains_key(&tid)
    }

    pub(crate) fn has_all(&self, tids: &[TypeId]) -> bool {
        tids.iter().all(|tid| self.has(*tid))
    }

    pub(crate) fn column_index(&self, tid: TypeId) -> Option<usize> {
        self.column_of.get(&tid).copied()
    }

    pub(crate) fn column(&self, tid: TypeId) -> Option<&ComponentColumn> {
        self.column_index(tid).map(|i| &self.columns[i])
    }

    pub(crate) fn column_mut(&mut self, tid: TypeId) -> Option<&mut ComponentColumn> {
        self.column_index(tid).map(|i| &mut self.columns[i])
    }

    pub(crate) fn type_name(&self, tid: TypeId) -> &'static str {
        self.names.get(&tid).copied().unwrap_or("<unknown>")
    }

    pub(crate) fn names(&self) -> &HashMap<TypeId, &'static str> {
        &self.names
    }

    pub(crate) fn len(&self) -> usize {
        self.entities.len()
    }

    /// Append a row. `values` must cover the signature exactly.
    pub(crate) fn push_row(&mut self, entity: Entity, values: Vec<(TypeId, BoxedComponent)>) -> usize {
        debug_assert_eq!(values.len(), self.signature.len());
        for (tid, value) in values {
            let i = self.column_of[&tid];
            self.columns[i].push_boxed(value);
        }
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Swap-remove `row` from every column.
    pub(crate) fn remove_row(&mut self, row: usize) -> RemovedRow {
        let values = self
            .signature
            .iter()
            .zip(self.columns.iter_mut())
            .map(|(tid, col)| (*tid, col.take(row)))
            .collect();
        self.entities.swap_remove(row);
        RemovedRow {
            values,
            moved: self.entities.get(row).copied(),
        }
    }

    pub(crate) fn clear(&mut self) {
        for col in &mut self.columns {
            *col = ComponentColumn::new();
        }
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch_u32_f32() -> Archetype {
        let sig = signature(vec![TypeId::of::<f32>(), TypeId::of::<u32>()]);
        let names = HashMap::from([
            (TypeId::of::<u32>(), "u32"),
            (TypeId::of::<f32>(), "f32"),
        ]);
        Archetype::new(sig, names)
    }

    fn entity(index: u32) -> Entity {
        Entity {
            index,
            generation: 0,
        }
    }

    fn row(a: u32, b: f32) -> Vec<(TypeId, BoxedComponent)> {
        vec![
            (TypeId::of::<u32>(), Box::new(a)),
            (TypeId::of::<f32>(), Box::new(b)),
        ]
    }

    #[test]
    fn signature_is_order_independent() {
        let a = signature(vec![TypeId::of::<u32>(), TypeId::of::<f32>()]);
        let b = signature(vec![TypeId::of::<f32>(), TypeId::of::<u32>(), TypeId::of::<u32>()]);
        assert_eq!(a, b);
    }

    #[test]
    fn remove_row_reports_moved_entity() {
        let mut arch = arch_u32_f32();
        arch.push_row(entity(0), row(1, 1.0));
        arch.push_row(entity(1), row(2, 2.0));
        arch.push_row(entity(2), row(3, 3.0));

        let removed = arch.remove_row(0);
        assert_eq!(removed.moved, Some(entity(2)));
        assert_eq!(removed.values.len(), 2);
        assert_eq!(arch.len(), 2);
        assert_eq!(*arch.column(TypeId::of::<u32>()).unwrap().get::<u32>(0), 3);

        let removed = arch.remove_row(1);
        assert_eq!(removed.moved, None);
    }

    #[test]
    fn names_and_membership() {
        let arch = arch_u32_f32();
        assert!(arch.has_all(&[TypeId::of::<u32>(), TypeId::of::<f32>()]));
        assert!(!arch.has(TypeId::of::<u8>()));
        assert_eq!(arch.type_name(TypeId::of::<u32>()), "u32");
        assert_eq!(arch.type_name(TypeId::of::<u8>()), "<unknown>");
    }
}
