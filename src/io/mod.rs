//! Loading point sets from the supported file formats.
//!
//! `.ply`, `.pcd`, `.xyz` and `.pts` load directly as point clouds. `.obj`
//! files, and `.ply` files whose direct load yields no points, are read as a
//! triangle mesh instead and converted to a point set by uniform surface
//! sampling.

use crate::scene::PointSet;
use nalgebra::Point3;
use std::path::Path;
use thiserror::Error;

pub mod obj;
pub mod pcd;
pub mod ply;
pub mod sampling;
pub mod xyz;

/// Error while loading a point cloud or mesh file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file format: {0}")]
    UnsupportedExtension(String),

    #[error("invalid {format} file: {message}")]
    DataFormat {
        format: &'static str,
        message: String,
    },

    #[error("failed to load point cloud or mesh: no points")]
    Empty,
}

/// A triangle mesh. Only an intermediate representation: meshes are
/// immediately converted to a point set by sampling their surface.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<[usize; 3]>,
}

/// Loads a point set from the given file.
///
/// The extension decides the format, independently of the file name (the
/// controller passes it along with the path). Unknown extensions and files
/// that produce zero points fail without touching any scene state.
pub fn load_point_set(
    path: &Path,
    extension: &str,
    mesh_samples: usize,
) -> Result<PointSet, LoadError> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    let point_set = match ext.as_str() {
        "ply" => {
            let point_set = ply::read_point_cloud(path)?;
            if point_set.is_empty() {
                // a mesh-only ply has vertices but no point data we accepted;
                // re-read it as a mesh and sample the surface
                sample_mesh(ply::read_mesh(path)?, mesh_samples)
            } else {
                point_set
            }
        }
        "pcd" => pcd::read_point_cloud(path)?,
        "xyz" | "pts" => xyz::read_point_cloud(path)?,
        "obj" => sample_mesh(obj::read_mesh(path)?, mesh_samples),
        _ => return Err(LoadError::UnsupportedExtension(extension.to_string())),
    };
    if point_set.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(point_set)
}

fn sample_mesh(mesh: TriangleMesh, samples: usize) -> PointSet {
    let positions = sampling::sample_uniformly(&mesh, samples, &mut rand::thread_rng());
    PointSet::new(positions, None)
}
