//! Reader for Wavefront OBJ meshes.

use crate::io::{LoadError, TriangleMesh};
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn data_error(message: impl Into<String>) -> LoadError {
    LoadError::DataFormat {
        format: "obj",
        message: message.into(),
    }
}

/// Reads vertices and faces; polygon faces are fan-triangulated.
/// Normals, texture coordinates, materials and groups are ignored.
pub fn read_mesh(path: &Path) -> Result<TriangleMesh, LoadError> {
    let reader = BufReader::new(File::open(path)?);

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut triangles = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut coord = |axis: &str| -> Result<f64, LoadError> {
                    tokens
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| {
                            data_error(format!(
                                "bad {axis} coordinate on line {}",
                                line_no + 1
                            ))
                        })
                };
                let (x, y, z) = (coord("x")?, coord("y")?, coord("z")?);
                vertices.push(Point3::new(x, y, z));
            }
            Some("f") => {
                let mut face = Vec::new();
                for token in tokens {
                    // "i", "i/j", "i//k" and "i/j/k" all reference vertex i
                    let index: i64 = token
                        .split('/')
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| {
                            data_error(format!("bad face index on line {}", line_no + 1))
                        })?;
                    let resolved = if index < 0 {
                        vertices.len() as i64 + index
                    } else {
                        index - 1
                    };
                    if resolved < 0 || resolved as usize >= vertices.len() {
                        return Err(data_error(format!(
                            "face index out of range on line {}",
                            line_no + 1
                        )));
                    }
                    face.push(resolved as usize);
                }
                if face.len() < 3 {
                    return Err(data_error(format!(
                        "face with fewer than 3 vertices on line {}",
                        line_no + 1
                    )));
                }
                for i in 1..face.len() - 1 {
                    triangles.push([face[0], face[i], face[i + 1]]);
                }
            }
            // comments, normals, texture coordinates, groups, materials...
            _ => {}
        }
    }

    Ok(TriangleMesh {
        vertices,
        triangles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_triangles_and_quads() {
        let file = write_temp(
            "# a quad and a triangle\n\
            v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 0 1\n\
            f 1 2 3 4\n\
            f 1 2 5\n",
        );
        let mesh = read_mesh(file.path()).unwrap();
        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3], [0, 1, 4]]);
    }

    #[test]
    fn test_slash_and_negative_indices() {
        let file = write_temp(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
            vn 0 0 1\n\
            f 1//1 2//1 -1//1\n",
        );
        let mesh = read_mesh(file.path()).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let file = write_temp("v 0 0 0\nf 1 2 3\n");
        assert!(matches!(
            read_mesh(file.path()),
            Err(LoadError::DataFormat { .. })
        ));
    }
}
