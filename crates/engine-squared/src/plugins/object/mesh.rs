//! # Mesh — CPU-Side Geometry
//!
//! A [`Mesh`] stores geometry as parallel arrays: vertex `i` is
//! `vertices[i]`, `normals[i]` and `tex_coords[i]`. `indices` lists
//! triangles, three entries each, counter-clockwise when seen from the front.
//!
//! ```text
//! vertices:   [v0, v1, v2, v3]
//! normals:    [n0, n1, n2, n3]
//! tex_coords: [t0, t1, t2, t3]
//! indices:    [0, 1, 2,  2, 3, 0]   ← two triangles
//! ```
//!
//! Nothing here touches the GPU. A renderer reads the arrays and uploads them
//! however it likes.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::id::StringId;

/// One interleaved vertex, as read back through [`Mesh::vertex`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Below this squared length an accumulated normal counts as degenerate.
    const NORMAL_EPSILON: f32 = 1e-8;

    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            tex_coords: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Append one vertex and return its index.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex.position);
        self.normals.push(vertex.normal);
        self.tex_coords.push(vertex.tex_coord);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Vertex `index`, or `None` if it is out of range in any of the arrays.
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        Some(Vertex {
            position: *self.vertices.get(index)?,
            normal: *self.normals.get(index)?,
            tex_coord: *self.tex_coords.get(index)?,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True if every vertex has a normal and a texture coordinate.
    pub fn has_matching_arrays(&self) -> bool {
        let count = self.vertices.len();
        self.normals.len() == count && self.tex_coords.len() == count
    }

    /// Rebuild the normals from the triangles.
    ///
    /// Each vertex gets the sum of the face normals around it, weighted by
    /// triangle area, then normalized. Vertices that touch no triangle, or
    /// only degenerate ones, point up. Does nothing when the index list is
    /// empty or not a whole number of triangles. Triangles with an index out
    /// of range are skipped.
    pub fn recalculate_normals(&mut self) {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return;
        }
        if self.indices.len() % 3 != 0 {
            log::warn!(
                "Cannot recalculate normals: {} indices is not a whole number of triangles",
                self.indices.len()
            );
            return;
        }

        let count = self.vertices.len();
        self.normals.clear();
        self.normals.resize(count, Vec3::ZERO);
        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            if a >= count || b >= count || c >= count {
                continue;
            }
            let (v0, v1, v2) = (self.vertices[a], self.vertices[b], self.vertices[c]);
            let face = (v1 - v0).cross(v2 - v0);
            self.normals[a] += face;
            self.normals[b] += face;
            self.normals[c] += face;
        }
        for normal in &mut self.normals {
            *normal = if normal.length_squared() > Self::NORMAL_EPSILON {
                normal.normalize()
            } else {
                Vec3::Y
            };
        }
    }
}

/// A polygon of a mesh with the material it is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub indices: Vec<u32>,
    pub material: StringId,
}

/// Per-face material assignment for the [`Mesh`] on the same entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshFaces {
    pub faces: Vec<Face>,
}

impl MeshFaces {
    /// Faces drawn with `material`.
    pub fn with_material<'a>(&'a self, material: &'a StringId) -> impl Iterator<Item = &'a Face> {
        self.faces.iter().filter(move |face| face.material == *material)
    }
}
