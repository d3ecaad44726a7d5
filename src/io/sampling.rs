//! Uniform surface sampling of triangle meshes.

use crate::io::TriangleMesh;
use nalgebra::Point3;
use rand::Rng;

/// Draws `count` points uniformly distributed over the mesh surface.
///
/// Triangles are chosen proportionally to their area; within a triangle the
/// sample is placed by uniform barycentric coordinates. A mesh without
/// triangles (or with zero total area) falls back to its raw vertices.
pub fn sample_uniformly(
    mesh: &TriangleMesh,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Point3<f64>> {
    let mut cumulative_area = Vec::with_capacity(mesh.triangles.len());
    let mut total = 0.0;
    for [a, b, c] in &mesh.triangles {
        let ab = mesh.vertices[*b] - mesh.vertices[*a];
        let ac = mesh.vertices[*c] - mesh.vertices[*a];
        total += ab.cross(&ac).norm() / 2.0;
        cumulative_area.push(total);
    }
    if total <= 0.0 {
        return mesh.vertices.clone();
    }

    let mut samples = Vec::with_capacity(count);
    for _ in 0..count {
        let target = rng.gen::<f64>() * total;
        let triangle = cumulative_area.partition_point(|&area| area < target);
        let [a, b, c] = mesh.triangles[triangle.min(mesh.triangles.len() - 1)];

        let mut u = rng.gen::<f64>();
        let mut v = rng.gen::<f64>();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        let origin = mesh.vertices[a];
        samples.push(origin + (mesh.vertices[b] - origin) * u + (mesh.vertices[c] - origin) * v);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_square() -> TriangleMesh {
        TriangleMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn test_sample_count_and_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples = sample_uniformly(&unit_square(), 1000, &mut rng);
        assert_eq!(samples.len(), 1000);
        for p in &samples {
            assert!((0.0..=1.0).contains(&p.x));
            assert!((0.0..=1.0).contains(&p.y));
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn test_samples_cover_both_triangles() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = sample_uniformly(&unit_square(), 1000, &mut rng);
        let below = samples.iter().filter(|p| p.y < p.x).count();
        // both halves of the square have equal area; a wildly lopsided
        // split would mean the area weighting is broken
        assert!(below > 300 && below < 700, "split was {below}/1000");
    }

    #[test]
    fn test_mesh_without_faces_falls_back_to_vertices() {
        let mesh = TriangleMesh {
            vertices: vec![Point3::new(1.0, 2.0, 3.0)],
            triangles: vec![],
        };
        let mut rng = StdRng::seed_from_u64(0);
        let samples = sample_uniformly(&mesh, 10, &mut rng);
        assert_eq!(samples, vec![Point3::new(1.0, 2.0, 3.0)]);
    }
}
