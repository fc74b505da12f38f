//! Plugins bundle resources, schedulers and systems behind one call.
//!
//! ```text
//! core.add_plugins((EventPlugin, ScenePlugin));
//! ```
//!
//! Each plugin type binds at most once per core. A plugin that depends on
//! another calls [`Core::require_plugin`] from its `bind`.

use std::any::type_name;

use crate::core::Core;

pub trait Plugin: 'static {
    /// Register whatever the plugin provides.
    fn bind(&self, core: &mut Core);

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Several plugins added in order. Implemented for tuples of up to eight.
pub trait PluginGroup {
    fn add_to(self, core: &mut Core);
}

macro_rules! impl_plugin_group {
    ($($P:ident),+) => {
        impl<$($P: Plugin),+> PluginGroup for ($($P,)+) {
            #[allow(non_snake_case)]
            fn add_to(self, core: &mut Core) {
                let ($($P,)+) = self;
                $(core.add_plugin($P);)+
            }
        }
    };
}

impl_plugin_group!(A);
impl_plugin_group!(A, B);
impl_plugin_group!(A, B, C);
impl_plugin_group!(A, B, C, D);
impl_plugin_group!(A, B, C, D, E);
impl_plugin_group!(A, B, C, D, E, F);
impl_plugin_group!(A, B, C, D, E, F, G);
impl_plugin_group!(A, B, C, D, E, F, G, H);
