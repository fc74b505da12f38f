//! Spatial components, mesh data and world-space propagation.
//!
//! [`Transform`] is local to the parent (see
//! [`relationship`](super::relationship)). [`propagate_global_transforms`]
//! writes each entity's world matrix into a [`GlobalTransform`]:
//!
//! ```text
//! global(child) = global(parent) * local(child)
//! ```
//!
//! Geometry lives next to the transforms: [`Mesh`] components built by the
//! [`shape`] generators or loaded with [`obj::load_obj`].

pub mod mesh;
pub mod obj;
pub mod shape;

pub use mesh::{Face, Mesh, MeshFaces, Vertex};

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::relationship::{children_of, parent_of};
use crate::core::Core;
use crate::ecs::Entity;
use crate::plugin::Plugin;
use crate::scheduler::Update;

/// Position, rotation and scale relative to the parent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// `translation * rotation * scale`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Local `-Z` after rotation.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// World-space matrix, written by [`propagate_global_transforms`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalTransform(pub Mat4);

impl GlobalTransform {
    pub fn position(&self) -> Vec3 {
        self.0.w_axis.truncate()
    }
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self(Mat4::IDENTITY)
    }
}

/// Recompute [`GlobalTransform`] for every entity with a [`Transform`],
/// walking down from entities whose parent has none.
pub fn propagate_global_transforms(core: &mut Core) {
    let mut stack: Vec<(Entity, Mat4)> = core
        .registry()
        .entities_with::<Transform>()
        .into_iter()
        .filter(|&entity| is_transform_root(core, entity))
        .map(|entity| (entity, Mat4::IDENTITY))
        .collect();
    while let Some((entity, parent_global)) = stack.pop() {
        let Some(local) = entity.try_get_component::<Transform>(core) else {
            continue;
        };
        let global = parent_global * local.matrix();
        core.registry_mut().insert(entity, GlobalTransform(global));
        stack.extend(children_of(core, entity).into_iter().map(|child| (child, global)));
    }
}

fn is_transform_root(core: &Core, entity: Entity) -> bool {
    parent_of(core, entity).is_none_or(|parent| !parent.has_component::<Transform>(core))
}

/// Registers [`propagate_global_transforms`] on `Update`.
#[derive(Default)]
pub struct ObjectPlugin;

impl Plugin for ObjectPlugin {
    fn bind(&self, core: &mut Core) {
        core.require_plugin::<super::relationship::RelationshipPlugin>();
        core.systems::<Update>().add(propagate_global_transforms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::relationship::set_child_of;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn matrix_is_translate_rotate_scale() {
        let transform = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_scale(Vec3::splat(2.0))
            .with_rotation(Quat::from_rotation_y(FRAC_PI_2));
        let point = transform.matrix().transform_point3(Vec3::X);
        assert!(approx(point, Vec3::new(1.0, 2.0, 1.0)));
    }

    #[test]
    fn forward_is_negative_z() {
        assert!(approx(Transform::IDENTITY.forward(), Vec3::NEG_Z));
        let turned = Transform::IDENTITY.with_rotation(Quat::from_rotation_y(FRAC_PI_2));
        assert!(approx(turned.forward(), Vec3::NEG_X));
    }

    #[test]
    fn globals_compose_down_the_hierarchy() {
        let mut core = Core::new();
        core.add_plugin(ObjectPlugin);
        let root = core.create_entity();
        let child = core.create_entity();
        let grandchild = core.create_entity();
        root.add_component(&mut core, Transform::from_xyz(10.0, 0.0, 0.0));
        let scaled = Transform::from_xyz(0.0, 5.0, 0.0).with_scale(Vec3::splat(2.0));
        child.add_component(&mut core, scaled);
        grandchild.add_component(&mut core, Transform::from_xyz(1.0, 0.0, 0.0));
        set_child_of(&mut core, child, root);
        set_child_of(&mut core, grandchild, child);

        core.run_systems().unwrap();
        let global = |e: Entity| e.get_component::<GlobalTransform>(&core).position();
        assert!(approx(global(root), Vec3::new(10.0, 0.0, 0.0)));
        assert!(approx(global(child), Vec3::new(10.0, 5.0, 0.0)));
        assert!(approx(global(grandchild), Vec3::new(12.0, 5.0, 0.0)));
    }

    #[test]
    fn entities_under_a_plain_parent_are_roots() {
        let mut core = Core::new();
        let group = core.create_entity();
        let member = core.create_entity();
        member.add_component(&mut core, Transform::from_xyz(0.0, 0.0, 4.0));
        set_child_of(&mut core, member, group);

        propagate_global_transforms(&mut core);
        let position = member.get_component::<GlobalTransform>(&core).position();
        assert!(approx(position, Vec3::new(0.0, 0.0, 4.0)));
        assert!(!group.has_component::<GlobalTransform>(&core));
    }

    #[test]
    fn meshes_ride_along_with_transforms() {
        let mut core = Core::new();
        core.add_plugin(ObjectPlugin);
        let crate_entity = core.create_entity();
        crate_entity.add_component(&mut core, Transform::from_xyz(0.0, 1.0, 0.0));
        crate_entity.add_component(&mut core, shape::cube(1.0));

        core.run_systems().unwrap();
        let mesh = crate_entity.get_component::<Mesh>(&core);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(crate_entity.has_component::<GlobalTransform>(&core));
    }
}
