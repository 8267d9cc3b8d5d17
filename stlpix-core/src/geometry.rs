//! Geometry primitives: triangles, bounds and the indexed mesh.

use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// Vectors shorter than this normalize to zero.
pub const NORMALIZE_EPSILON: f64 = 1e-12;

/// Normalize `v`, returning the zero vector when it is too short to have a direction.
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(NORMALIZE_EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// A triangle as three positions in source order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f64>; 3],
}

impl Triangle {
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    fn edge_cross(&self) -> Vector3<f64> {
        let [a, b, c] = self.vertices;
        (b - a).cross(&(c - a))
    }

    /// Unit normal following the right-hand rule over the vertex order.
    pub fn normal(&self) -> Vector3<f64> {
        normalize_or_zero(&self.edge_cross())
    }

    pub fn area(&self) -> f64 {
        0.5 * self.edge_cross().norm()
    }
}

/// Axis-aligned bounds of a triangle soup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bounds {
    /// Returns `None` for an empty slice.
    pub fn from_triangles(triangles: &[Triangle]) -> Option<Self> {
        let mut points = triangles.iter().flat_map(|t| t.vertices.iter());
        let first = *points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in points {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Half the largest extent, or 1.0 for a zero-extent mesh.
    pub fn radius(&self) -> f64 {
        if self.is_degenerate() {
            1.0
        } else {
            self.half_extent()
        }
    }

    /// True when every extent is too small to frame, so [`Bounds::radius`]
    /// falls back to 1.0.
    pub fn is_degenerate(&self) -> bool {
        self.half_extent() <= 1e-9
    }

    fn half_extent(&self) -> f64 {
        self.extent().max() / 2.0
    }
}

/// Indexed mesh with area-weighted vertex normals.
///
/// `vertices` and `normals` are index-aligned and every face index is a
/// valid index into them.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Vec<Vector3<f64>>,
}

/// Exact coordinate key. Adding `0.0` folds `-0.0` onto `0.0`.
fn vertex_key(p: &Point3<f64>) -> [u64; 3] {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

impl Mesh {
    /// Build the indexed mesh from a triangle soup.
    ///
    /// Vertices are merged only when their coordinates are exactly equal;
    /// nearly-coincident vertices stay separate. Each face contributes its
    /// unit normal weighted by its area (1.0 for slivers) to its three
    /// vertices, and the sums are normalized at the end.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut index: HashMap<[u64; 3], usize> = HashMap::new();
        let mut mesh = Self {
            vertices: Vec::new(),
            faces: Vec::with_capacity(triangles.len()),
            normals: Vec::new(),
        };
        let mut accum: Vec<Vector3<f64>> = Vec::new();

        for triangle in triangles {
            let mut face = [0usize; 3];
            for (slot, p) in face.iter_mut().zip(triangle.vertices.iter()) {
                *slot = *index.entry(vertex_key(p)).or_insert_with(|| {
                    mesh.vertices.push(*p);
                    accum.push(Vector3::zeros());
                    mesh.vertices.len() - 1
                });
            }

            let area = triangle.area();
            let weight = if area > NORMALIZE_EPSILON { area } else { 1.0 };
            let weighted = triangle.normal() * weight;
            for &i in &face {
                accum[i] += weighted;
            }
            mesh.faces.push(face);
        }

        mesh.normals = accum.iter().map(normalize_or_zero).collect();
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Axis-aligned box spanning `[-half, half]` on every axis, wound outward.
pub fn cube(half: f64) -> Vec<Triangle> {
    box_mesh(Vector3::new(half, half, half))
}

/// Axis-aligned box with the given half extents, wound outward.
pub fn box_mesh(half: Vector3<f64>) -> Vec<Triangle> {
    let corner = |x: f64, y: f64, z: f64| Point3::new(x * half.x, y * half.y, z * half.z);
    let p = [
        corner(-1.0, -1.0, -1.0),
        corner(1.0, -1.0, -1.0),
        corner(1.0, 1.0, -1.0),
        corner(-1.0, 1.0, -1.0),
        corner(-1.0, -1.0, 1.0),
        corner(1.0, -1.0, 1.0),
        corner(1.0, 1.0, 1.0),
        corner(-1.0, 1.0, 1.0),
    ];
    let quads: [[usize; 4]; 6] = [
        [0, 3, 2, 1], // -z
        [4, 5, 6, 7], // +z
        [0, 1, 5, 4], // -y
        [2, 3, 7, 6], // +y
        [1, 2, 6, 5], // +x
        [0, 4, 7, 3], // -x
    ];
    quads
        .iter()
        .flat_map(|q| {
            [
                Triangle::new(p[q[0]], p[q[1]], p[q[2]]),
                Triangle::new(p[q[0]], p[q[2]], p[q[3]]),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octahedron() -> Vec<Triangle> {
        let px = Point3::new(1.0, 0.0, 0.0);
        let nx = Point3::new(-1.0, 0.0, 0.0);
        let py = Point3::new(0.0, 1.0, 0.0);
        let ny = Point3::new(0.0, -1.0, 0.0);
        let pz = Point3::new(0.0, 0.0, 1.0);
        let nz = Point3::new(0.0, 0.0, -1.0);
        vec![
            Triangle::new(px, py, pz),
            Triangle::new(py, nx, pz),
            Triangle::new(nx, ny, pz),
            Triangle::new(ny, px, pz),
            Triangle::new(py, px, nz),
            Triangle::new(nx, py, nz),
            Triangle::new(ny, nx, nz),
            Triangle::new(px, ny, nz),
        ]
    }

    #[test]
    fn test_normalize_zero_vector() {
        let n = normalize_or_zero(&Vector3::new(0.0, 1e-14, 0.0));
        assert_eq!(n, Vector3::zeros());
    }

    #[test]
    fn test_triangle_normal_and_area() {
        let t = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        );
        assert!((t.normal() - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert!((t.area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_center_and_radius() {
        let bounds = Bounds::from_triangles(&box_mesh(Vector3::new(2.0, 1.0, 0.5))).unwrap();
        assert!((bounds.center() - Point3::origin()).norm() < 1e-12);
        assert!((bounds.radius() - 2.0).abs() < 1e-12);
        assert!(!bounds.is_degenerate());
    }

    #[test]
    fn test_degenerate_bounds_radius() {
        let p = Point3::new(3.0, 3.0, 3.0);
        let bounds = Bounds::from_triangles(&[Triangle::new(p, p, p)]).unwrap();
        assert!(bounds.is_degenerate());
        assert_eq!(bounds.radius(), 1.0);
        assert!(Bounds::from_triangles(&[]).is_none());
    }

    #[test]
    fn test_exact_vertex_dedup() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let d = Point3::new(1.0, 1.0, 0.0);
        let nudged = Point3::new(1.0 + 1e-12, 0.0, 0.0);
        let negative_zero = Point3::new(-0.0, 0.0, -0.0);

        let mesh = Mesh::from_triangles(&[
            Triangle::new(a, b, c),
            Triangle::new(b, d, c),
            Triangle::new(negative_zero, nudged, d),
        ]);

        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.faces[1], [1, 3, 2]);
        assert_eq!(mesh.faces[2][0], 0);
        assert_eq!(mesh.faces[2][1], 4);
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
    }

    #[test]
    fn test_octahedron_normals_point_outward() {
        let mesh = Mesh::from_triangles(&octahedron());
        assert_eq!(mesh.vertex_count(), 6);
        for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
            assert!((n.norm() - 1.0).abs() < 1e-9);
            assert!(n.dot(&v.coords) > 0.0);
        }
    }

    #[test]
    fn test_sliver_uses_unit_weight() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let mesh = Mesh::from_triangles(&[Triangle::new(a, b, b)]);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.normals[0], Vector3::zeros());
    }

    #[test]
    fn test_cube_is_wound_outward() {
        let triangles = cube(0.5);
        assert_eq!(triangles.len(), 12);
        for t in &triangles {
            let centroid = (t.vertices[0].coords + t.vertices[1].coords + t.vertices[2].coords) / 3.0;
            assert!(t.normal().dot(&centroid) > 0.0);
        }
    }
}
