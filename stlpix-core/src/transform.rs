//! Rotation matrices for the upright and view transforms.
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

use crate::geometry::normalize_or_zero;

/// Viewing angles around the object (in degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAngles {
    /// Rotation about the vertical (z) axis.
    pub azimuth_deg: f64,
    /// Rotation about the horizontal (x) axis, applied after azimuth.
    pub elevation_deg: f64,
}

impl ViewAngles {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            azimuth_deg,
            elevation_deg,
        }
    }
}

impl Default for ViewAngles {
    fn default() -> Self {
        Self::new(-35.0, -35.0)
    }
}

/// Rotation builders
pub struct Transform;

impl Transform {
    /// Rotation about z by `angle` radians.
    pub fn rotation_z(angle: f64) -> Matrix3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), angle).into_inner()
    }

    /// Rotation about x by `angle` radians.
    pub fn rotation_x(angle: f64) -> Matrix3<f64> {
        Rotation3::from_axis_angle(&Vector3::x_axis(), angle).into_inner()
    }

    /// Object-to-camera rotation: azimuth first, then elevation.
    pub fn view_rotation(angles: &ViewAngles) -> Matrix3<f64> {
        Self::rotation_x(angles.elevation_deg.to_radians())
            * Self::rotation_z(angles.azimuth_deg.to_radians())
    }

    /// Rotation taking the direction of `from` onto the direction of `to`.
    ///
    /// Parallel inputs give the identity; antiparallel inputs give a half
    /// turn about an axis orthogonal to `from`.
    pub fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> Matrix3<f64> {
        let a = normalize_or_zero(from);
        let b = normalize_or_zero(to);
        let dot = a.dot(&b).clamp(-1.0, 1.0);

        if dot > 1.0 - 1e-9 {
            return Matrix3::identity();
        }

        if dot < -1.0 + 1e-9 {
            let mut axis = normalize_or_zero(&a.cross(&Vector3::x()));
            if axis.norm() < 1e-6 {
                axis = normalize_or_zero(&a.cross(&Vector3::y()));
            }
            // Half turn: 2 * axis * axis^T - I
            return axis * axis.transpose() * 2.0 - Matrix3::identity();
        }

        let axis = Unit::new_normalize(a.cross(&b));
        Rotation3::from_axis_angle(&axis, dot.acos()).into_inner()
    }
}
