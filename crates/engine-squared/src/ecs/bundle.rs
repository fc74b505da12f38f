//! Component bundles: tuples of components spawned together.

use std::any::{TypeId, type_name};

use super::component::{BoxedComponent, Component};

/// A set of components inserted in one step. Implemented for tuples of up to
/// eight components; `(A,)` spawns a single component.
pub trait ComponentBundle: Send + Sync + 'static {
    fn type_ids() -> Vec<TypeId>;
    fn type_names() -> Vec<&'static str>;
    fn into_components(self) -> Vec<(TypeId, BoxedComponent)>;
}

macro_rules! impl_component_bundle {
    ($($C:ident),+) => {
        impl<$($C: Component),+> ComponentBundle for ($($C,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$C>()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(type_name::<$C>()),+]
            }

            #[allow(non_snake_case)]
            fn into_components(self) -> Vec<(TypeId, BoxedComponent)> {
                let ($($C,)+) = self;
                vec![$((TypeId::of::<$C>(), Box::new($C) as BoxedComponent)),+]
            }
        }
    };
}

impl_component_bundle!(A);
impl_component_bundle!(A, B);
impl_component_bundle!(A, B, C);
impl_component_bundle!(A, B, C, D);
impl_component_bundle!(A, B, C, D, E);
impl_component_bundle!(A, B, C, D, E, F);
impl_component_bundle!(A, B, C, D, E, F, G);
impl_component_bundle!(A, B, C, D, E, F, G, H);
