//! Reader for ascii PCD files.

use crate::io::LoadError;
use crate::render::settings::Color;
use crate::scene::PointSet;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn data_error(message: impl Into<String>) -> LoadError {
    LoadError::DataFormat {
        format: "pcd",
        message: message.into(),
    }
}

/// Reads an ascii PCD file. The `x`, `y` and `z` fields are required; a
/// packed `rgb` field (float or unsigned) is decoded into per-point colors.
pub fn read_point_cloud(path: &Path) -> Result<PointSet, LoadError> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut fields: Vec<String> = Vec::new();
    let mut types: Vec<String> = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(data_error("missing DATA line"));
        }
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("#") | None => {}
            Some("FIELDS") => fields = tokens.map(str::to_string).collect(),
            Some("TYPE") => types = tokens.map(str::to_string).collect(),
            Some("COUNT") => {
                if tokens.any(|c| c != "1") {
                    return Err(data_error("multi-count fields are not supported"));
                }
            }
            Some("DATA") => match tokens.next() {
                Some("ascii") => break,
                Some(other) => {
                    return Err(data_error(format!("unsupported data encoding: {other}")));
                }
                None => return Err(data_error("malformed DATA line")),
            },
            // VERSION, SIZE, WIDTH, HEIGHT, VIEWPOINT, POINTS
            Some(_) => {}
        }
    }

    let index_of = |name: &str| fields.iter().position(|f| f == name);
    let (x, y, z) = match (index_of("x"), index_of("y"), index_of("z")) {
        (Some(x), Some(y), Some(z)) => (x, y, z),
        _ => return Err(data_error("missing x/y/z fields")),
    };
    let rgb = index_of("rgb").map(|i| {
        let packed_float = types.get(i).map(String::as_str) == Some("F");
        (i, packed_float)
    });

    let mut positions = Vec::new();
    let mut colors = Vec::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != fields.len() {
            return Err(data_error(format!(
                "expected {} values per point, got {}",
                fields.len(),
                tokens.len()
            )));
        }
        let value = |i: usize| -> Result<f64, LoadError> {
            tokens[i]
                .parse::<f64>()
                .map_err(|_| data_error(format!("bad value in field {}", fields[i])))
        };
        positions.push(Point3::new(value(x)?, value(y)?, value(z)?));
        if let Some((i, packed_float)) = rgb {
            let packed = if packed_float {
                value(i)? as f32
            } else {
                f32::from_bits(
                    tokens[i]
                        .parse::<u32>()
                        .map_err(|_| data_error("bad rgb value"))?,
                )
            };
            let bits = packed.to_bits();
            colors.push(Color::rgb(
                ((bits >> 16) & 0xff) as f32 / 255.0,
                ((bits >> 8) & 0xff) as f32 / 255.0,
                (bits & 0xff) as f32 / 255.0,
            ));
        }
    }

    let colors = (colors.len() == positions.len() && !colors.is_empty()).then_some(colors);
    Ok(PointSet::new(positions, colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ascii_pcd_positions() {
        let pcd = "# .PCD v0.7 - Point Cloud Data file format\n\
            VERSION 0.7\n\
            FIELDS x y z\n\
            SIZE 4 4 4\n\
            TYPE F F F\n\
            COUNT 1 1 1\n\
            WIDTH 2\n\
            HEIGHT 1\n\
            VIEWPOINT 0 0 0 1 0 0 0\n\
            POINTS 2\n\
            DATA ascii\n\
            0.5 1.5 2.5\n\
            -1 0 1\n";
        let mut file = tempfile::Builder::new().suffix(".pcd").tempfile().unwrap();
        file.write_all(pcd.as_bytes()).unwrap();
        let point_set = read_point_cloud(file.path()).unwrap();
        assert_eq!(point_set.len(), 2);
        assert_eq!(point_set.positions()[0], Point3::new(0.5, 1.5, 2.5));
        assert!(point_set.colors().is_none());
    }

    #[test]
    fn test_packed_rgb_field() {
        // rgb = 0xff0000 packed into a float
        let packed = f32::from_bits(0x00ff_0000);
        let pcd = format!(
            "FIELDS x y z rgb\n\
            TYPE F F F F\n\
            COUNT 1 1 1 1\n\
            DATA ascii\n\
            0 0 0 {packed}\n"
        );
        let mut file = tempfile::Builder::new().suffix(".pcd").tempfile().unwrap();
        file.write_all(pcd.as_bytes()).unwrap();
        let point_set = read_point_cloud(file.path()).unwrap();
        let colors = point_set.colors().unwrap();
        assert!((colors[0].r - 1.0).abs() < 1e-6);
        assert_eq!(colors[0].g, 0.0);
    }

    #[test]
    fn test_binary_pcd_is_rejected() {
        let pcd = "FIELDS x y z\nTYPE F F F\nDATA binary\n";
        let mut file = tempfile::Builder::new().suffix(".pcd").tempfile().unwrap();
        file.write_all(pcd.as_bytes()).unwrap();
        assert!(matches!(
            read_point_cloud(file.path()),
            Err(LoadError::DataFormat { .. })
        ));
    }
}
