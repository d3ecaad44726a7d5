//! Reader for PLY files (ascii and binary little endian).

use crate::io::{LoadError, TriangleMesh};
use crate::render::settings::Color;
use crate::scene::PointSet;
use byteorder::{LittleEndian, ReadBytesExt};
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads the vertex element as a point cloud, with colors if present.
pub fn read_point_cloud(path: &Path) -> Result<PointSet, LoadError> {
    let content = parse(path)?;
    Ok(PointSet::new(content.vertices, content.colors))
}

/// Reads vertices and faces as a triangle mesh.
/// Polygon faces are fan-triangulated.
pub fn read_mesh(path: &Path) -> Result<TriangleMesh, LoadError> {
    let content = parse(path)?;
    let vertex_count = content.vertices.len();
    let mut triangles = Vec::new();
    for face in &content.faces {
        if face.len() < 3 {
            continue;
        }
        for i in 1..face.len() - 1 {
            let tri = [face[0], face[i], face[i + 1]];
            if tri.iter().any(|&v| v >= vertex_count) {
                return Err(data_error(format!(
                    "face references vertex out of range (vertex count {vertex_count})"
                )));
            }
            triangles.push(tri);
        }
    }
    Ok(TriangleMesh {
        vertices: content.vertices,
        triangles,
    })
}

fn data_error(message: impl Into<String>) -> LoadError {
    LoadError::DataFormat {
        format: "ply",
        message: message.into(),
    }
}

/// Upper bound on list lengths. Counts beyond this are corrupt data, not a
/// reason to allocate.
const MAX_LIST_LEN: usize = 1 << 20;

fn list_len(value: f64, element: &Element) -> Result<usize, LoadError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > MAX_LIST_LEN as f64 {
        return Err(data_error(format!(
            "bad list count {value} in element {}",
            element.name
        )));
    }
    Ok(value as usize)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ScalarType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    fn parse(token: &str) -> Result<Self, LoadError> {
        Ok(match token {
            "char" | "int8" => ScalarType::Char,
            "uchar" | "uint8" => ScalarType::UChar,
            "short" | "int16" => ScalarType::Short,
            "ushort" | "uint16" => ScalarType::UShort,
            "int" | "int32" => ScalarType::Int,
            "uint" | "uint32" => ScalarType::UInt,
            "float" | "float32" => ScalarType::Float,
            "double" | "float64" => ScalarType::Double,
            other => return Err(data_error(format!("unknown property type: {other}"))),
        })
    }

    fn is_integer(&self) -> bool {
        !matches!(self, ScalarType::Float | ScalarType::Double)
    }

    fn read_le(&self, reader: &mut impl std::io::Read) -> Result<f64, std::io::Error> {
        Ok(match self {
            ScalarType::Char => reader.read_i8()? as f64,
            ScalarType::UChar => reader.read_u8()? as f64,
            ScalarType::Short => reader.read_i16::<LittleEndian>()? as f64,
            ScalarType::UShort => reader.read_u16::<LittleEndian>()? as f64,
            ScalarType::Int => reader.read_i32::<LittleEndian>()? as f64,
            ScalarType::UInt => reader.read_u32::<LittleEndian>()? as f64,
            ScalarType::Float => reader.read_f32::<LittleEndian>()? as f64,
            ScalarType::Double => reader.read_f64::<LittleEndian>()?,
        })
    }
}

#[derive(Clone, Debug)]
enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Clone, Debug)]
struct Property {
    name: String,
    kind: PropertyKind,
}

#[derive(Clone, Debug)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Format {
    Ascii,
    BinaryLittleEndian,
}

struct PlyContent {
    vertices: Vec<Point3<f64>>,
    colors: Option<Vec<Color>>,
    faces: Vec<Vec<usize>>,
}

/// One parsed record: scalar property values in declaration order, plus the
/// values of list properties.
enum Value {
    Scalar(f64),
    List(Vec<f64>),
}

fn parse(path: &Path) -> Result<PlyContent, LoadError> {
    let mut reader = BufReader::new(File::open(path)?);
    let (format, elements) = parse_header(&mut reader)?;

    let mut vertices = Vec::new();
    let mut colors = Vec::new();
    let mut faces = Vec::new();

    for element in &elements {
        let interest = ElementInterest::of(element);
        for _ in 0..element.count {
            let record = match format {
                Format::Ascii => read_ascii_record(&mut reader, element)?,
                Format::BinaryLittleEndian => read_binary_record(&mut reader, element)?,
            };
            interest.collect(element, &record, &mut vertices, &mut colors, &mut faces)?;
        }
    }

    let colors = (colors.len() == vertices.len() && !colors.is_empty()).then_some(colors);
    Ok(PlyContent {
        vertices,
        colors,
        faces,
    })
}

fn parse_header(reader: &mut impl BufRead) -> Result<(Format, Vec<Element>), LoadError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.trim_end() != "ply" {
        return Err(data_error("missing ply magic line"));
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(data_error("unexpected end of header"));
        }
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("comment") | Some("obj_info") | None => {}
            Some("format") => match tokens.next() {
                Some("ascii") => format = Some(Format::Ascii),
                Some("binary_little_endian") => format = Some(Format::BinaryLittleEndian),
                Some(other) => {
                    return Err(data_error(format!("unsupported format: {other}")));
                }
                None => return Err(data_error("malformed format line")),
            },
            Some("element") => {
                let name = tokens
                    .next()
                    .ok_or_else(|| data_error("malformed element line"))?;
                let count = tokens
                    .next()
                    .and_then(|c| c.parse().ok())
                    .ok_or_else(|| data_error("malformed element count"))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| data_error("property before element"))?;
                let kind_token = tokens
                    .next()
                    .ok_or_else(|| data_error("malformed property line"))?;
                let kind = if kind_token == "list" {
                    let count = ScalarType::parse(
                        tokens
                            .next()
                            .ok_or_else(|| data_error("malformed list property"))?,
                    )?;
                    if !count.is_integer() {
                        return Err(data_error("list count must be an integer type"));
                    }
                    let item = ScalarType::parse(
                        tokens
                            .next()
                            .ok_or_else(|| data_error("malformed list property"))?,
                    )?;
                    PropertyKind::List { count, item }
                } else {
                    PropertyKind::Scalar(ScalarType::parse(kind_token)?)
                };
                let name = tokens
                    .next()
                    .ok_or_else(|| data_error("property without a name"))?;
                element.properties.push(Property {
                    name: name.to_string(),
                    kind,
                });
            }
            Some("end_header") => break,
            Some(other) => {
                return Err(data_error(format!("unexpected header keyword: {other}")));
            }
        }
    }

    let format = format.ok_or_else(|| data_error("header has no format line"))?;
    Ok((format, elements))
}

fn read_ascii_record(reader: &mut impl BufRead, element: &Element) -> Result<Vec<Value>, LoadError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(data_error(format!(
                "unexpected end of file in element {}",
                element.name
            )));
        }
        if !line.trim().is_empty() {
            break;
        }
    }
    let mut tokens = line.split_whitespace();
    let mut next_value = |what: &str| -> Result<f64, LoadError> {
        tokens
            .next()
            .and_then(|t| t.parse::<f64>().ok())
            .ok_or_else(|| data_error(format!("bad or missing {what} in element {}", element.name)))
    };

    let mut record = Vec::with_capacity(element.properties.len());
    for property in &element.properties {
        match property.kind {
            PropertyKind::Scalar(_) => record.push(Value::Scalar(next_value(&property.name)?)),
            PropertyKind::List { .. } => {
                let count = list_len(next_value("list count")?, element)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(next_value("list item")?);
                }
                record.push(Value::List(items));
            }
        }
    }
    Ok(record)
}

fn read_binary_record(
    reader: &mut impl std::io::Read,
    element: &Element,
) -> Result<Vec<Value>, LoadError> {
    let mut record = Vec::with_capacity(element.properties.len());
    for property in &element.properties {
        match property.kind {
            PropertyKind::Scalar(scalar) => record.push(Value::Scalar(scalar.read_le(reader)?)),
            PropertyKind::List { count, item } => {
                let count = list_len(count.read_le(reader)?, element)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(item.read_le(reader)?);
                }
                record.push(Value::List(items));
            }
        }
    }
    Ok(record)
}

/// Property indices we care about within one element.
struct ElementInterest {
    position: Option<[usize; 3]>,
    color: Option<([usize; 3], bool)>,
    face_list: Option<usize>,
}

impl ElementInterest {
    fn of(element: &Element) -> Self {
        let index_of = |name: &str| element.properties.iter().position(|p| p.name == name);
        let mut interest = ElementInterest {
            position: None,
            color: None,
            face_list: None,
        };
        if element.name == "vertex" {
            if let (Some(x), Some(y), Some(z)) = (index_of("x"), index_of("y"), index_of("z")) {
                interest.position = Some([x, y, z]);
            }
            let rgb = [
                index_of("red").or_else(|| index_of("r")),
                index_of("green").or_else(|| index_of("g")),
                index_of("blue").or_else(|| index_of("b")),
            ];
            if let [Some(r), Some(g), Some(b)] = rgb {
                let integer_scale = matches!(
                    element.properties[r].kind,
                    PropertyKind::Scalar(scalar) if scalar.is_integer()
                );
                interest.color = Some(([r, g, b], integer_scale));
            }
        } else if element.name == "face" {
            interest.face_list = index_of("vertex_indices")
                .or_else(|| index_of("vertex_index"))
                .or_else(|| {
                    element
                        .properties
                        .iter()
                        .position(|p| matches!(p.kind, PropertyKind::List { .. }))
                });
        }
        interest
    }

    fn collect(
        &self,
        element: &Element,
        record: &[Value],
        vertices: &mut Vec<Point3<f64>>,
        colors: &mut Vec<Color>,
        faces: &mut Vec<Vec<usize>>,
    ) -> Result<(), LoadError> {
        let scalar = |i: usize| -> f64 {
            match record[i] {
                Value::Scalar(v) => v,
                Value::List(_) => f64::NAN,
            }
        };
        if let Some([x, y, z]) = self.position {
            vertices.push(Point3::new(scalar(x), scalar(y), scalar(z)));
        }
        if let Some(([r, g, b], integer_scale)) = self.color {
            let scale = if integer_scale { 1.0 / 255.0 } else { 1.0 };
            colors.push(Color::rgb(
                (scalar(r) * scale) as f32,
                (scalar(g) * scale) as f32,
                (scalar(b) * scale) as f32,
            ));
        }
        if let Some(i) = self.face_list {
            match &record[i] {
                Value::List(items) => {
                    faces.push(items.iter().map(|&v| v as usize).collect());
                }
                Value::Scalar(_) => {
                    return Err(data_error(format!(
                        "face property of element {} is not a list",
                        element.name
                    )));
                }
            }
        }
        Ok(())
    }
}
