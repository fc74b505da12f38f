use std::marker::PhantomData;

use super::{IntoSystem, System};

/// One or more systems registered together, in order.
///
/// Tuples keep their systems adjacent: `(load, spawn)` always runs `load`
/// immediately followed by `spawn`.
pub trait SystemSet<Marker> {
    fn into_systems(self) -> Vec<Box<dyn System>>;
}

/// Marker for a lone system used as a set.
pub struct SingleSystem<M>(PhantomData<M>);

impl<M, S: IntoSystem<M>> SystemSet<SingleSystem<M>> for S {
    fn into_systems(self) -> Vec<Box<dyn System>> {
        vec![Box::new(self.into_system())]
    }
}

macro_rules! impl_system_set_tuple {
    ($(($S:ident, $M:ident)),+) => {
        impl<$($M, $S: IntoSystem<$M>),+> SystemSet<($($M,)+)> for ($($S,)+) {
            #[allow(non_snake_case)]
            fn into_systems(self) -> Vec<Box<dyn System>> {
                let ($($S,)+) = self;
                vec![$(Box::new($S.into_system()) as Box<dyn System>),+]
            }
        }
    };
}

impl_system_set_tuple!((S0, M0));
impl_system_set_tuple!((S0, M0), (S1, M1));
impl_system_set_tuple!((S0, M0), (S1, M1), (S2, M2));
impl_system_set_tuple!((S0, M0), (S1, M1), (S2, M2), (S3, M3));
impl_system_set_tuple!((S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4));
impl_system_set_tuple!((S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5));
impl_system_set_tuple!((S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5), (S6, M6));
impl_system_set_tuple!(
    (S0, M0),
    (S1, M1),
    (S2, M2),
    (S3, M3),
    (S4, M4),
    (S5, M5),
    (S6, M6),
    (S7, M7)
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Core;

    fn first(_: &mut Core) {}
    fn second(_: &mut Core) -> Result<(), String> {
        Ok(())
    }

    fn names<M>(set: impl SystemSet<M>) -> Vec<String> {
        set.into_systems().iter().map(|s| s.name().to_string()).collect()
    }

    #[test]
    fn single_and_tuple_sets() {
        assert_eq!(names(first), vec!["first"]);
        assert_eq!(names((second, first)), vec!["second", "first"]);
    }
}
