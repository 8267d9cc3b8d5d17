//! Camera placement and perspective projection
use nalgebra::{Matrix3, Point3, Vector3};

use crate::geometry::{normalize_or_zero, Bounds};
use crate::transform::{Transform, ViewAngles};

/// Camera-space z is clamped to at most this to keep the divide finite.
pub const NEAR_Z: f64 = -1e-6;

/// A projected point in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    /// Distance in front of the camera (`-z` after clamping); smaller is nearer.
    pub depth: f64,
}

/// A point on the image grid with its depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: i64,
    pub y: i64,
    pub depth: f64,
}

/// Perspective camera framing a mesh from a fixed direction.
///
/// Model points are centered on the bounds, rotated upright, rotated by the
/// view angles and pushed back along -z far enough that the bounding sphere
/// fits the field of view with `margin` left at the border.
#[derive(Debug, Clone)]
pub struct Camera {
    pub center: Point3<f64>,
    pub upright: Matrix3<f64>,
    pub view: Matrix3<f64>,
    /// `1 / tan(fov / 2)`
    pub focal: f64,
    pub distance: f64,
    /// Square image side in pixels.
    pub size: u32,
}

impl Camera {
    pub fn new(
        bounds: &Bounds,
        upright: Matrix3<f64>,
        angles: &ViewAngles,
        fov_deg: f64,
        margin: f64,
        size: u32,
    ) -> Self {
        let focal = 1.0 / (fov_deg.to_radians() / 2.0).tan();
        let distance = bounds.radius() * focal / (1.0 - margin).max(1e-6);
        log::debug!("camera focal {focal:.4}, distance {distance:.4}");

        Self {
            center: bounds.center(),
            upright,
            view: Transform::view_rotation(angles),
            focal,
            distance,
            size,
        }
    }

    /// Centered, upright model-space point for a raw mesh position.
    pub fn to_upright(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.upright * (p - self.center)
    }

    /// Camera-space position of a point already in the upright frame.
    pub fn upright_to_camera(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let mut c = self.view * v;
        c.z -= self.distance;
        c
    }

    /// Camera-space position of a raw mesh position.
    pub fn to_camera(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.upright_to_camera(&self.to_upright(p))
    }

    /// Camera-space direction of a model-space normal.
    pub fn rotate_normal(&self, n: &Vector3<f64>) -> Vector3<f64> {
        normalize_or_zero(&(self.view * (self.upright * n)))
    }

    /// Project a camera-space point; points at or behind the camera are
    /// clamped to [`NEAR_Z`] instead of rejected.
    pub fn project(&self, c: &Vector3<f64>) -> Projected {
        let depth = -c.z.min(NEAR_Z);
        Projected {
            x: c.x * self.focal / depth,
            y: c.y * self.focal / depth,
            depth,
        }
    }

    /// Map normalized coordinates to a pixel, with row 0 at the top.
    pub fn to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let span = f64::from(self.size) - 1.0;
        let px = ((x * 0.5 + 0.5) * span) as i64;
        let py = ((-y * 0.5 + 0.5) * span) as i64;
        (px, py)
    }

    /// Project a camera-space point all the way to the image grid.
    pub fn to_screen(&self, c: &Vector3<f64>) -> ScreenPoint {
        let p = self.project(c);
        let (x, y) = self.to_pixel(p.x, p.y);
        ScreenPoint {
            x,
            y,
            depth: p.depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::cube;

    fn front_camera(size: u32) -> Camera {
        let bounds = Bounds::from_triangles(&cube(1.0)).unwrap();
        Camera::new(
            &bounds,
            Matrix3::identity(),
            &ViewAngles::new(0.0, 0.0),
            90.0,
            0.0,
            size,
        )
    }

    #[test]
    fn test_camera_distance_fits_radius() {
        let camera = front_camera(101);
        assert!((camera.focal - 1.0).abs() < 1e-12);
        assert!((camera.distance - 1.0).abs() < 1e-12);

        let bounds = Bounds::from_triangles(&cube(1.0)).unwrap();
        let framed = Camera::new(
            &bounds,
            Matrix3::identity(),
            &ViewAngles::default(),
            90.0,
            0.5,
            101,
        );
        assert!((framed.distance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_projection_divides_by_depth() {
        let camera = front_camera(101);
        let p = camera.project(&Vector3::new(1.0, -2.0, -4.0));
        assert!((p.x - 0.25).abs() < 1e-12);
        assert!((p.y + 0.5).abs() < 1e-12);
        assert_eq!(p.depth, 4.0);
    }

    #[test]
    fn test_projection_clamps_behind_camera() {
        let camera = front_camera(101);
        let p = camera.project(&Vector3::new(1e-7, 0.0, 3.0));
        assert_eq!(p.depth, -NEAR_Z);
        assert!(p.x.is_finite());
        assert!((p.x - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_mapping_flips_vertically() {
        let camera = front_camera(101);
        assert_eq!(camera.to_pixel(0.0, 0.0), (50, 50));
        assert_eq!(camera.to_pixel(-1.0, 1.0), (0, 0));
        assert_eq!(camera.to_pixel(1.0, -1.0), (100, 100));
    }

    #[test]
    fn test_to_camera_centers_and_backs_off() {
        let camera = front_camera(101);
        let c = camera.to_camera(&Point3::new(0.0, 0.0, 1.0));
        assert!((c - Vector3::new(0.0, 0.0, 0.0)).norm() < 1e-12);
        let origin = camera.to_camera(&Point3::origin());
        assert!((origin.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_normal_stays_unit() {
        let bounds = Bounds::from_triangles(&cube(1.0)).unwrap();
        let camera = Camera::new(
            &bounds,
            Transform::rotation_between(&Vector3::x(), &Vector3::z()),
            &ViewAngles::default(),
            35.0,
            0.08,
            64,
        );
        let n = camera.rotate_normal(&Vector3::new(0.0, 3.0, 0.0));
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert_eq!(camera.rotate_normal(&Vector3::zeros()), Vector3::zeros());
    }
}
