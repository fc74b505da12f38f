//! # Shapes — Primitive Mesh Generators
//!
//! Every shape is centered at the origin, wound counter-clockwise seen from
//! outside, with outward unit normals. Flat faces get their own vertices so
//! edges stay sharp; curved surfaces repeat the seam column so UVs can wrap
//! from 0 to 1.
//!
//! Segment counts below the minimum a shape needs are raised to it.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::mesh::{Mesh, Vertex};

/// Cube with side `size`. 24 vertices, 12 triangles.
pub fn cube(size: f32) -> Mesh {
    cuboid(size, size, size)
}

/// Axis-aligned box. Each face maps the whole `[0, 1]²` UV square.
pub fn cuboid(width: f32, height: f32, depth: f32) -> Mesh {
    let half = Vec3::new(width, height, depth) * 0.5;
    // (normal, u axis, v axis); corners are normal ± u ± v, scaled by `half`.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];
    let corners = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, -1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(-1.0, 1.0),
    ];

    let mut mesh = Mesh::with_capacity(24, 36);
    for (normal, u, v) in faces {
        let base = mesh.vertex_count() as u32;
        for corner in corners {
            let position = (normal + u * corner.x + v * corner.y) * half;
            let uv = (corner + Vec2::ONE) * 0.5;
            mesh.push_vertex(Vertex::new(position, normal, uv));
        }
        mesh.push_triangle(base, base + 1, base + 2);
        mesh.push_triangle(base + 2, base + 3, base);
    }
    mesh
}

/// Flat grid on the XZ plane facing +Y.
pub fn plane(width: f32, depth: f32, subdivisions_x: u32, subdivisions_z: u32) -> Mesh {
    let (sx, sz) = (subdivisions_x.max(1), subdivisions_z.max(1));
    let columns = sx + 1;
    let mut mesh = Mesh::with_capacity((columns * (sz + 1)) as usize, (sx * sz * 6) as usize);

    for z in 0..=sz {
        let v = z as f32 / sz as f32;
        for x in 0..=sx {
            let u = x as f32 / sx as f32;
            let position = Vec3::new((u - 0.5) * width, 0.0, (v - 0.5) * depth);
            mesh.push_vertex(Vertex::new(position, Vec3::Y, Vec2::new(u, v)));
        }
    }
    for z in 0..sz {
        for x in 0..sx {
            let top_left = z * columns + x;
            let bottom_left = top_left + columns;
            mesh.push_triangle(top_left, bottom_left, top_left + 1);
            mesh.push_triangle(top_left + 1, bottom_left, bottom_left + 1);
        }
    }
    mesh
}

/// UV sphere. `segments` go around Y (at least 3), `rings` from pole to
/// pole (at least 2).
pub fn sphere(radius: f32, segments: u32, rings: u32) -> Mesh {
    let (segments, rings) = (segments.max(3), rings.max(2));
    let mut mesh = Mesh::with_capacity(
        ((rings + 1) * (segments + 1)) as usize,
        (rings * segments * 6) as usize,
    );

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            mesh.push_vertex(Vertex::new(normal * radius, normal, Vec2::new(u, v)));
        }
    }
    // Rings run from the top pole down, so flip the grid to face outward.
    grid_indices(&mut mesh, segments, rings);
    for triangle in mesh.indices.chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }
    mesh
}

/// Cylinder along Y, or a cone or frustum when the radii differ. A cap is
/// only built for a radius above zero.
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
    height_segments: u32,
) -> Mesh {
    let (segments, height_segments) = (segments.max(3), height_segments.max(1));
    let half_height = height * 0.5;
    let (sin_slope, cos_slope) = (radius_bottom - radius_top).atan2(height).sin_cos();
    let mut mesh = Mesh::with_capacity(
        ((height_segments + 1) * (segments + 1) + 2 * (segments + 2)) as usize,
        ((height_segments + 1) * segments * 6) as usize,
    );

    for h in 0..=height_segments {
        let t = h as f32 / height_segments as f32;
        let y = -half_height + t * height;
        let radius = radius_bottom + (radius_top - radius_bottom) * t;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let position = Vec3::new(radius * cos_theta, y, radius * sin_theta);
            let normal = Vec3::new(cos_theta * cos_slope, sin_slope, sin_theta * cos_slope);
            mesh.push_vertex(Vertex::new(position, normal.normalize(), Vec2::new(u, t)));
        }
    }
    grid_indices(&mut mesh, segments, height_segments);

    if radius_top > 0.0 {
        cap(&mut mesh, radius_top, half_height, segments, Vec3::Y);
    }
    if radius_bottom > 0.0 {
        cap(&mut mesh, radius_bottom, -half_height, segments, Vec3::NEG_Y);
    }
    mesh
}

/// Triangle fan closing a cylinder end at height `y`.
fn cap(mesh: &mut Mesh, radius: f32, y: f32, segments: u32, normal: Vec3) {
    let center = mesh.push_vertex(Vertex::new(Vec3::new(0.0, y, 0.0), normal, Vec2::splat(0.5)));
    for seg in 0..=segments {
        let (sin_theta, cos_theta) = (seg as f32 / segments as f32 * TAU).sin_cos();
        let position = Vec3::new(radius * cos_theta, y, radius * sin_theta);
        let uv = Vec2::new(0.5 + 0.5 * cos_theta, 0.5 + 0.5 * sin_theta);
        mesh.push_vertex(Vertex::new(position, normal, uv));
    }
    for seg in 0..segments {
        let (rim, next) = (center + seg + 1, center + seg + 2);
        if normal.y > 0.0 {
            mesh.push_triangle(center, next, rim);
        } else {
            mesh.push_triangle(center, rim, next);
        }
    }
}

/// Two triangles per quad of the `(rows + 1) × (columns + 1)` vertex grid at
/// the start of `mesh`. Outward-facing when rows climb along +Y and columns
/// turn from +X towards +Z.
fn grid_indices(mesh: &mut Mesh, columns: u32, rows: u32) {
    for row in 0..rows {
        for column in 0..columns {
            let current = row * (columns + 1) + column;
            let next = current + columns + 1;
            mesh.push_triangle(current, next, current + 1);
            mesh.push_triangle(current + 1, next, next + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &Mesh) {
        assert!(mesh.has_matching_arrays());
        assert_eq!(mesh.indices.len() % 3, 0);
        for &index in &mesh.indices {
            assert!((index as usize) < mesh.vertex_count(), "index {index} out of range");
        }
        for normal in &mesh.normals {
            assert!((normal.length() - 1.0).abs() < 1e-5, "normal {normal} is not unit");
        }
    }

    /// Every triangle's winding agrees with the stored normals.
    fn assert_outward(mesh: &Mesh) {
        for triangle in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let [v0, v1, v2] = [a, b, c].map(|i| mesh.vertices[i]);
            let face = (v1 - v0).cross(v2 - v0);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let stored = mesh.normals[a] + mesh.normals[b] + mesh.normals[c];
            assert!(face.dot(stored) > 0.0, "triangle {triangle:?} faces inward");
        }
    }

    #[test]
    fn cube_counts_and_extent() {
        let mesh = cube(2.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_well_formed(&mesh);
        assert_outward(&mesh);
        assert!(mesh.vertices.iter().all(|v| v.abs().cmpeq(Vec3::ONE).all()));
    }

    #[test]
    fn cuboid_uses_each_half_extent() {
        let mesh = cuboid(4.0, 2.0, 1.0);
        let max = mesh.vertices.iter().fold(Vec3::ZERO, |acc, v| acc.max(*v));
        assert_eq!(max, Vec3::new(2.0, 1.0, 0.5));
        assert_outward(&mesh);
    }

    #[test]
    fn plane_grid_faces_up() {
        let mesh = plane(2.0, 4.0, 2, 3);
        assert_eq!(mesh.vertex_count(), 3 * 4);
        assert_eq!(mesh.triangle_count(), 2 * 3 * 2);
        assert_well_formed(&mesh);
        assert_outward(&mesh);
        assert_eq!(mesh.vertices[0], Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(mesh.tex_coords[mesh.vertex_count() - 1], Vec2::ONE);
    }

    #[test]
    fn plane_subdivisions_are_at_least_one() {
        let mesh = plane(1.0, 1.0, 0, 0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let mesh = sphere(3.0, 16, 8);
        assert_eq!(mesh.vertex_count(), 9 * 17);
        assert_eq!(mesh.triangle_count(), 8 * 16 * 2);
        assert_well_formed(&mesh);
        assert_outward(&mesh);
        for v in &mesh.vertices {
            assert!((v.length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_minimums_apply() {
        let mesh = sphere(1.0, 1, 1);
        assert_eq!(mesh.vertex_count(), 3 * 4);
    }

    #[test]
    fn cylinder_has_sides_and_both_caps() {
        let mesh = cylinder(0.5, 0.5, 2.0, 8, 2);
        let side = 3 * 9;
        let caps = 2 * (1 + 9);
        assert_eq!(mesh.vertex_count(), side + caps);
        assert_eq!(mesh.triangle_count(), 2 * 8 * 2 + 2 * 8);
        assert_well_formed(&mesh);
        assert_outward(&mesh);
    }

    #[test]
    fn cones_skip_the_pointed_cap() {
        let mesh = cylinder(0.0, 1.0, 1.0, 6, 1);
        assert_eq!(mesh.vertex_count(), 2 * 7 + 1 + 7);
        assert!(mesh.normals.iter().any(|n| *n == Vec3::NEG_Y));
        assert!(!mesh.normals.iter().any(|n| *n == Vec3::Y));
        assert_outward(&mesh);
    }
}
