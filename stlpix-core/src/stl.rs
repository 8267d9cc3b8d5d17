//! STL parser for binary and ASCII formats.
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1},
    combinator::{all_consuming, map},
    multi::count,
    number::complete::{double, le_f32, le_u32},
    sequence::{preceded, terminated, tuple},
    IResult,
};
use nalgebra::Point3;
use std::path::Path;

use crate::error::{RenderError, Result, StlError};
use crate::geometry::Triangle;

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;
/// How far into the file to look for a `facet` keyword.
const SNIFF_LEN: usize = 4096;

/// Read and parse an STL file.
pub fn load_stl(path: impl AsRef<Path>) -> Result<Vec<Triangle>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| RenderError::io(path, e))?;
    log::debug!("read {} bytes from {}", data.len(), path.display());
    Ok(parse_stl(&data)?)
}

/// Detect and parse STL data (binary or ASCII).
///
/// Binary files may also start with `solid`, so ASCII is only attempted when
/// a `facet` keyword shows up early; any ASCII failure falls back to binary.
pub fn parse_stl(data: &[u8]) -> std::result::Result<Vec<Triangle>, StlError> {
    if looks_like_ascii(data) {
        match parse_ascii_stl(&String::from_utf8_lossy(data)) {
            Ok(triangles) => {
                log::debug!("parsed ASCII STL: {} triangles", triangles.len());
                return Ok(triangles);
            }
            Err(e) => log::debug!("ASCII parse failed ({e}), retrying as binary"),
        }
    }
    let triangles = parse_binary_stl(data)?;
    log::debug!("parsed binary STL: {} triangles", triangles.len());
    Ok(triangles)
}

fn looks_like_ascii(data: &[u8]) -> bool {
    let head = &data[..data.len().min(HEADER_LEN)];
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let sniff = &data[..data.len().min(SNIFF_LEN)];
    head[start..].starts_with(b"solid") && sniff.windows(5).any(|w| w == b"facet")
}

/// Parse a binary STL file.
///
/// A triangle count larger than the data holds is clamped to the number of
/// complete records.
pub fn parse_binary_stl(data: &[u8]) -> std::result::Result<Vec<Triangle>, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooSmall { len: data.len() });
    }

    let body = &data[HEADER_LEN..];
    let (records, declared) =
        le_u32::<_, nom::error::Error<&[u8]>>(body).map_err(|_| StlError::TooSmall { len: data.len() })?;
    let available = records.len() / RECORD_LEN;
    let triangle_count = (declared as usize).min(available);
    if triangle_count < declared as usize {
        log::debug!("declared {declared} triangles, only {available} records present");
    }

    let (_, triangles) = count(binary_record, triangle_count)(records)
        .map_err(|_| StlError::EmptyMesh)?;
    if triangles.is_empty() {
        return Err(StlError::EmptyMesh);
    }
    Ok(triangles)
}

fn binary_point(input: &[u8]) -> IResult<&[u8], Point3<f64>> {
    map(tuple((le_f32, le_f32, le_f32)), |(x, y, z)| {
        Point3::new(f64::from(x), f64::from(y), f64::from(z))
    })(input)
}

fn binary_record(input: &[u8]) -> IResult<&[u8], Triangle> {
    // Stored normal is ignored; it is recomputed from the winding.
    let (input, _) = take(12usize)(input)?;
    let (input, (a, b, c)) = tuple((binary_point, binary_point, binary_point))(input)?;
    let (input, _) = take(2usize)(input)?;
    Ok((input, Triangle::new(a, b, c)))
}

/// Parse an ASCII STL file.
///
/// Only `vertex` lines matter: every three form a triangle and a trailing
/// partial group is dropped.
pub fn parse_ascii_stl(input: &str) -> std::result::Result<Vec<Triangle>, StlError> {
    let mut triangles = Vec::new();
    let mut pending: Vec<Point3<f64>> = Vec::with_capacity(3);

    // `lines` handles `\n` and `\r\n`; classic Mac files use a bare `\r`.
    for (i, line) in input.lines().flat_map(|l| l.split('\r')).enumerate() {
        let line = line.trim();
        if !is_vertex_line(line) {
            continue;
        }
        let (_, point) = vertex_line(line).map_err(|_| StlError::MalformedVertex { line: i + 1 })?;
        pending.push(point);
        if pending.len() == 3 {
            triangles.push(Triangle::new(pending[0], pending[1], pending[2]));
            pending.clear();
        }
    }

    if triangles.is_empty() {
        return Err(StlError::EmptyMesh);
    }
    Ok(triangles)
}

fn is_vertex_line(line: &str) -> bool {
    line.strip_prefix("vertex")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

fn vertex_line(input: &str) -> IResult<&str, Point3<f64>> {
    all_consuming(terminated(
        preceded(tag("vertex"), parse_vector3),
        multispace0,
    ))(input)
}

fn parse_vector3(input: &str) -> IResult<&str, Point3<f64>> {
    let (input, x) = preceded(multispace1, double)(input)?;
    let (input, y) = preceded(multispace1, double)(input)?;
    let (input, z) = preceded(multispace1, double)(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Encode triangles as a binary STL with zeroed normals and attributes.
///
/// Coordinates are narrowed to `f32` as the format requires. Fails when the
/// triangle count does not fit the 32-bit count field.
pub fn encode_binary_stl(triangles: &[Triangle]) -> std::result::Result<Vec<u8>, StlError> {
    let declared = triangle_count_field(triangles.len())?;
    let mut out = Vec::with_capacity(HEADER_LEN + 4 + triangles.len() * RECORD_LEN);
    out.extend_from_slice(&[0u8; HEADER_LEN]);
    out.extend_from_slice(&declared.to_le_bytes());
    for triangle in triangles {
        out.extend_from_slice(&[0u8; 12]);
        for p in &triangle.vertices {
            for c in p.coords.iter() {
                out.extend_from_slice(&(*c as f32).to_le_bytes());
            }
        }
        out.extend_from_slice(&[0u8; 2]);
    }
    Ok(out)
}

fn triangle_count_field(count: usize) -> std::result::Result<u32, StlError> {
    u32::try_from(count).map_err(|_| StlError::TooManyTriangles { count })
}

/// Encode triangles as an ASCII STL solid, one facet per triangle with its
/// computed normal.
pub fn encode_ascii_stl(name: &str, triangles: &[Triangle]) -> String {
    let mut out = format!("solid {name}\n");
    for triangle in triangles {
        let n = triangle.normal();
        out.push_str(&format!("  facet normal {} {} {}\n    outer loop\n", n.x, n.y, n.z));
        for p in &triangle.vertices {
            out.push_str(&format!("      vertex {} {} {}\n", p.x, p.y, p.z));
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    out.push_str(&format!("endsolid {name}\n"));
    out
}
