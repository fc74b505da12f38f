//! Wavefront OBJ loading through `tobj`.
//!
//! Faces are triangulated and every model in the file is merged into one
//! [`Mesh`]. Attributes the file leaves out are filled in: missing texture
//! coordinates become zero and missing normals are recalculated from the
//! triangles. Materials are not read.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};

use super::mesh::Mesh;
use crate::error::EngineError;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Load the `.obj` file at `path`.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, EngineError> {
    let path = path.as_ref();
    if path.extension().is_none_or(|ext| !ext.eq_ignore_ascii_case("obj")) {
        return Err(EngineError::NotObj(path.to_path_buf()));
    }
    let (models, _) = tobj::load_obj(path, &load_options()).map_err(|source| {
        EngineError::ObjLoad {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let mesh = merge(&models);
    log::info!(
        "Loaded {} ({} vertices, {} triangles)",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parse OBJ text from `reader`. `mtllib` lines are ignored.
pub fn load_obj_from_reader(reader: &mut impl BufRead) -> Result<Mesh, EngineError> {
    let (models, _) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|source| EngineError::ObjLoad {
        path: PathBuf::from("<reader>"),
        source,
    })?;
    Ok(merge(&models))
}

fn merge(models: &[tobj::Model]) -> Mesh {
    let mut mesh = Mesh::new();
    let mut missing_normals = false;
    for model in models {
        let source = &model.mesh;
        let base = mesh.vertex_count() as u32;
        let count = source.positions.len() / 3;

        mesh.vertices.extend(
            source
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        if source.normals.len() == count * 3 {
            mesh.normals.extend(
                source
                    .normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2])),
            );
        } else {
            missing_normals = true;
            mesh.normals.resize(mesh.vertices.len(), Vec3::ZERO);
        }
        if source.texcoords.len() == count * 2 {
            mesh.tex_coords.extend(
                source
                    .texcoords
                    .chunks_exact(2)
                    .map(|t| Vec2::new(t[0], t[1])),
            );
        } else {
            mesh.tex_coords.resize(mesh.vertices.len(), Vec2::ZERO);
        }
        mesh.indices.extend(source.indices.iter().map(|&i| base + i));
    }
    if missing_normals {
        log::debug!("OBJ has no normals for some vertices, recalculating");
        mesh.recalculate_normals();
    }
    mesh
}
