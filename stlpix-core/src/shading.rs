//! Lambertian shading and color blending.
use image::Rgb;
use nalgebra::Vector3;

use crate::geometry::normalize_or_zero;

pub const AMBIENT: f64 = 0.20;
pub const DIFFUSE: f64 = 0.90;

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Ambient plus diffuse shading from a single directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertShader {
    base: Rgb<u8>,
    light: Vector3<f64>,
}

impl LambertShader {
    /// `light` points from the surface toward the light and need not be unit length.
    pub fn new(base: Rgb<u8>, light: &Vector3<f64>) -> Self {
        Self {
            base,
            light: normalize_or_zero(light),
        }
    }

    /// Brightness factor in `[AMBIENT, 1.0]` for a unit normal.
    pub fn intensity(&self, normal: &Vector3<f64>) -> f64 {
        let n_dot_l = clamp01(normal.dot(&self.light));
        clamp01(AMBIENT + DIFFUSE * n_dot_l)
    }

    pub fn shade(&self, normal: &Vector3<f64>) -> Rgb<u8> {
        let k = self.intensity(normal);
        Rgb(self.base.0.map(|c| (f64::from(c) * k) as u8))
    }
}

/// Mix `over` onto `base` with opacity `alpha`, truncating each channel.
pub fn blend(base: Rgb<u8>, over: Rgb<u8>, alpha: f64) -> Rgb<u8> {
    let a = clamp01(alpha);
    let mut out = [0u8; 3];
    for (i, c) in out.iter_mut().enumerate() {
        *c = (f64::from(base.0[i]) * (1.0 - a) + f64::from(over.0[i]) * a) as u8;
    }
    Rgb(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_light_is_full_brightness() {
        let shader = LambertShader::new(Rgb([200, 100, 50]), &Vector3::new(0.0, 0.0, 5.0));
        // 0.2 + 0.9 clamps to 1.0
        assert_eq!(shader.shade(&Vector3::z()), Rgb([200, 100, 50]));
    }

    #[test]
    fn test_facing_away_is_ambient() {
        let shader = LambertShader::new(Rgb([200, 100, 50]), &Vector3::z());
        assert!((shader.intensity(&-Vector3::z()) - AMBIENT).abs() < 1e-12);
        assert_eq!(shader.shade(&-Vector3::z()), Rgb([40, 20, 10]));
    }

    #[test]
    fn test_oblique_light_truncates() {
        let shader = LambertShader::new(Rgb([255, 255, 255]), &Vector3::new(1.0, 0.0, 1.0));
        let k = shader.intensity(&Vector3::z());
        assert!((k - (0.2 + 0.9 * std::f64::consts::FRAC_1_SQRT_2)).abs() < 1e-12);
        assert_eq!(shader.shade(&Vector3::z()).0[0], (255.0 * k) as u8);
    }

    #[test]
    fn test_blend() {
        let base = Rgb([10, 20, 30]);
        let over = Rgb([110, 120, 130]);
        assert_eq!(blend(base, over, 0.0), base);
        assert_eq!(blend(base, over, 1.0), over);
        assert_eq!(blend(base, over, 0.5), Rgb([60, 70, 80]));
        assert_eq!(blend(base, over, 7.0), over);
    }
}
