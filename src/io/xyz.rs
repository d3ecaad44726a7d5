//! Reader for plain text `.xyz` and `.pts` point files.

use crate::io::LoadError;
use crate::render::settings::Color;
use crate::scene::PointSet;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn data_error(message: impl Into<String>) -> LoadError {
    LoadError::DataFormat {
        format: "xyz",
        message: message.into(),
    }
}

/// Reads a whitespace separated point file, one point per line.
///
/// Accepted layouts per line: `x y z`, `x y z intensity`, `x y z r g b` and
/// `x y z intensity r g b` (the `.pts` flavor; a leading point-count line is
/// skipped). Colors may be 0..255 integers or 0..1 floats; the scale is
/// detected per file.
pub fn read_point_cloud(path: &Path) -> Result<PointSet, LoadError> {
    let reader = BufReader::new(File::open(path)?);

    let mut positions = Vec::new();
    let mut raw_colors: Vec<[f64; 3]> = Vec::new();
    let mut first_data_line = true;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }
        let values: Result<Vec<f64>, _> = trimmed
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect();
        let values =
            values.map_err(|_| data_error(format!("bad number on line {}", line_no + 1)))?;

        // .pts files start with a single point-count line
        if first_data_line && values.len() == 1 {
            first_data_line = false;
            continue;
        }
        first_data_line = false;

        match values.len() {
            3 | 4 => positions.push(Point3::new(values[0], values[1], values[2])),
            6 => {
                positions.push(Point3::new(values[0], values[1], values[2]));
                raw_colors.push([values[3], values[4], values[5]]);
            }
            7 => {
                // x y z intensity r g b
                positions.push(Point3::new(values[0], values[1], values[2]));
                raw_colors.push([values[4], values[5], values[6]]);
            }
            n => {
                return Err(data_error(format!(
                    "expected 3, 4, 6 or 7 values on line {}, got {n}",
                    line_no + 1
                )));
            }
        }
    }

    let colors = if raw_colors.len() == positions.len() && !raw_colors.is_empty() {
        let byte_scale = raw_colors.iter().flatten().any(|&c| c > 1.0);
        let scale = if byte_scale { 1.0 / 255.0 } else { 1.0 };
        Some(
            raw_colors
                .iter()
                .map(|[r, g, b]| {
                    Color::rgb((r * scale) as f32, (g * scale) as f32, (b * scale) as f32)
                })
                .collect(),
        )
    } else {
        None
    };
    Ok(PointSet::new(positions, colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".xyz").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_plain_xyz() {
        let file = write_temp("# comment\n1 2 3\n4 5 6\n");
        let point_set = read_point_cloud(file.path()).unwrap();
        assert_eq!(point_set.len(), 2);
        assert_eq!(point_set.positions()[0], Point3::new(1.0, 2.0, 3.0));
        assert!(point_set.colors().is_none());
    }

    #[test]
    fn test_pts_with_count_and_intensity() {
        let file = write_temp("2\n1 2 3 120 255 0 0\n4 5 6 80 0 255 0\n");
        let point_set = read_point_cloud(file.path()).unwrap();
        assert_eq!(point_set.len(), 2);
        let colors = point_set.colors().unwrap();
        assert!((colors[0].r - 1.0).abs() < 1e-6);
        assert!((colors[1].g - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_float_colors_keep_scale() {
        let file = write_temp("0 0 0 1 0 0\n1 1 1 0 0.5 0\n");
        let point_set = read_point_cloud(file.path()).unwrap();
        let colors = point_set.colors().unwrap();
        assert_eq!(colors[0].r, 1.0);
        assert_eq!(colors[1].g, 0.5);
    }

    #[test]
    fn test_bad_line_is_an_error() {
        let file = write_temp("1 2 3\nnot a point\n");
        assert!(matches!(
            read_point_cloud(file.path()),
            Err(LoadError::DataFormat { .. })
        ));
    }
}
