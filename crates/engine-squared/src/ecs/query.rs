//! # Query — Visiting Entities by Component Type
//!
//! ```text
//! registry.query::<(&Transform, &mut Velocity)>(|entity, (t, v)| { .. });
//! ```
//!
//! A query names the component types it reads (`&T`) or writes (`&mut T`).
//! The registry walks every archetype whose signature contains all of them,
//! moves the needed columns out of the archetype for the duration of the walk,
//! hands each row to the closure, and moves the columns back. Moving columns
//! out is what lets `&A` and `&mut B` coexist without unsafe aliasing tricks.
//!
//! Filters narrow the archetypes further without fetching anything:
//! [`With<T>`] and [`Without<T>`], combined as tuples.

use std::any::{TypeId, type_name};
use std::marker::PhantomData;

use super::archetype::Archetype;
use super::component::{Component, ComponentColumn};

/// Something a query can fetch per row.
pub trait QueryParam {
    type Item<'a>;
    /// Columns moved out of the archetype while the query runs.
    type Columns;

    fn type_ids() -> Vec<TypeId>;
    fn type_names() -> Vec<&'static str>;

    fn take_columns(archetype: &mut Archetype) -> Self::Columns;
    fn restore_columns(columns: Self::Columns, archetype: &mut Archetype);
    fn fetch(columns: &mut Self::Columns, row: usize) -> Self::Item<'_>;
}

fn take_column<T: Component>(archetype: &mut Archetype) -> (usize, ComponentColumn) {
    let index = archetype
        .column_index(TypeId::of::<T>())
        .unwrap_or_else(|| panic!("archetype has no column for `{}`", type_name::<T>()));
    (index, std::mem::take(&mut archetype.columns[index]))
}

impl<T: Component> QueryParam for &T {
    type Item<'a> = &'a T;
    type Columns = (usize, ComponentColumn);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn type_names() -> Vec<&'static str> {
        vec![type_name::<T>()]
    }

    fn take_columns(archetype: &mut Archetype) -> Self::Columns {
        take_column::<T>(archetype)
    }

    fn restore_columns((index, column): Self::Columns, archetype: &mut Archetype) {
        archetype.columns[index] = column;
    }

    fn fetch((_, column): &mut Self::Columns, row: usize) -> Self::Item<'_> {
        column.get::<T>(row)
    }
}

impl<T: Component> QueryParam for &mut T {
    type Item<'a> = &'a mut T;
    type Columns = (usize, ComponentColumn);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn type_names() -> Vec<&'static str> {
        vec![type_name::<T>()]
    }

    fn take_columns(archetype: &mut Archetype) -> Self::Columns {
        take_column::<T>(archetype)
    }

    fn restore_columns((index, column): Self::Columns, archetype: &mut Archetype) {
        archetype.columns[index] = column;
    }

    fn fetch((_, column): &mut Self::Columns, row: usize) -> Self::Item<'_> {
        column.get_mut::<T>(row)
    }
}

macro_rules! impl_query_param_tuple {
    ($($P:ident),+) => {
        impl<$($P: QueryParam),+> QueryParam for ($($P,)+) {
            type Item<'a> = ($($P::Item<'a>,)+);
            type Columns = ($($P::Columns,)+);

            fn type_ids() -> Vec<TypeId> {
                let mut ids = Vec::new();
                $(ids.extend($P::type_ids());)+
                ids
            }

            fn type_names() -> Vec<&'static str> {
                let mut names = Vec::new();
                $(names.extend($P::type_names());)+
                names
            }

            fn take_columns(archetype: &mut Archetype) -> Self::Columns {
                ($($P::take_columns(archetype),)+)
            }

            #[allow(non_snake_case)]
            fn restore_columns(columns: Self::Columns, archetype: &mut Archetype) {
                let ($($P,)+) = columns;
                $($P::restore_columns($P, archetype);)+
            }

            #[allow(non_snake_case)]
            fn fetch(columns: &mut Self::Columns, row: usize) -> Self::Item<'_> {
                let ($($P,)+) = columns;
                ($($P::fetch($P, row),)+)
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);
impl_query_param_tuple!(A, B, C, D, E, F);
impl_query_param_tuple!(A, B, C, D, E, F, G);
impl_query_param_tuple!(A, B, C, D, E, F, G, H);

/// Panics when a query names the same component twice. The second column
/// would otherwise be found already moved out.
pub(crate) fn assert_unique<Q: QueryParam>() {
    let ids = Q::type_ids();
    for (i, tid) in ids.iter().enumerate() {
        if ids[..i].contains(tid) {
            panic!(
                "query `{}` requests component `{}` more than once",
                type_name::<Q>(),
                Q::type_names()[i]
            );
        }
    }
}

// ── Filters ──────────────────────────────────────────────────────────────

/// Archetype-level predicate applied on top of a query.
pub trait QueryFilter {
    fn matches(archetype: &Archetype) -> bool;
}

/// Only entities that also have `T`.
pub struct With<T>(PhantomData<T>);

/// Only entities that do not have `T`.
pub struct Without<T>(PhantomData<T>);

impl QueryFilter for () {
    fn matches(_: &Archetype) -> bool {
        true
    }
}

impl<T: Component> QueryFilter for With<T> {
    fn matches(archetype: &Archetype) -> bool {
        archetype.has(TypeId::of::<T>())
    }
}

impl<T: Component> QueryFilter for Without<T> {
    fn matches(archetype: &Archetype) -> bool {
        !archetype.has(TypeId::of::<T>())
    }
}

macro_rules! impl_query_filter_tuple {
    ($($F:ident),+) => {
        impl<$($F: QueryFilter),+> QueryFilter for ($($F,)+) {
            fn matches(archetype: &Archetype) -> bool {
                $($F::matches(archetype))&&+
            }
        }
    };
}

impl_query_filter_tuple!(A);
impl_query_filter_tuple!(A, B);
impl_query_filter_tuple!(A, B, C);
impl_query_filter_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_type_ids_keep_order() {
        let ids = <(&u32, &mut f32)>::type_ids();
        assert_eq!(ids, vec![TypeId::of::<u32>(), TypeId::of::<f32>()]);
    }

    #[test]
    fn unique_query_passes() {
        assert_unique::<(&u32, &mut f32, &u8)>();
    }

    #[test]
    #[should_panic(expected = "more than once")]
    fn duplicate_component_panics() {
        assert_unique::<(&u32, &mut u32)>();
    }
}
