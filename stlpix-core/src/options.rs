//! Render configuration.
use image::Rgb;
use nalgebra::Vector3;

use crate::error::{RenderError, Result};
use crate::transform::ViewAngles;

/// 2-D grid painted over the background before any geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGrid {
    /// Spacing in pixels.
    pub step: u32,
    pub color: Rgb<u8>,
    pub alpha: f64,
}

impl Default for ScreenGrid {
    fn default() -> Self {
        Self {
            step: 80,
            color: Rgb([0x2a, 0x31, 0x3a]),
            alpha: 0.45,
        }
    }
}

/// Grid on the ground plane under the model, hidden by the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundGrid {
    /// Spacing in model units; `0.0` picks ten cells across the grid.
    pub step: f64,
    /// Half-width of the grid as a multiple of the mesh radius.
    pub extent: f64,
    pub color: Rgb<u8>,
    pub alpha: f64,
}

impl Default for GroundGrid {
    fn default() -> Self {
        Self {
            step: 0.0,
            extent: 1.35,
            color: Rgb([0x24, 0x30, 0x3b]),
            alpha: 0.55,
        }
    }
}

/// XYZ axis triad standing on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes {
    /// Axis length as a multiple of the mesh radius.
    pub length: f64,
}

impl Default for Axes {
    fn default() -> Self {
        Self { length: 0.9 }
    }
}

/// Everything that controls a single render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Side of the square output image in pixels.
    pub size: u32,
    pub background: Rgb<u8>,
    /// Base surface color before shading.
    pub color: Rgb<u8>,
    pub view: ViewAngles,
    pub fov_deg: f64,
    /// Fraction of normalized screen space kept free at the border.
    pub margin: f64,
    /// Direction toward the light in camera space.
    pub light_dir: Vector3<f64>,
    /// Draw faces regardless of winding.
    pub two_sided: bool,
    pub auto_upright: bool,
    pub screen_grid: Option<ScreenGrid>,
    pub ground_grid: Option<GroundGrid>,
    pub axes: Option<Axes>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: 1024,
            background: Rgb([0x0b, 0x0f, 0x14]),
            color: Rgb([0x4c, 0xc9, 0xf0]),
            view: ViewAngles::default(),
            fov_deg: 35.0,
            margin: 0.08,
            light_dir: Vector3::new(-0.4, -0.3, 1.0),
            two_sided: false,
            auto_upright: true,
            screen_grid: None,
            ground_grid: None,
            axes: None,
        }
    }
}

impl RenderOptions {
    /// Reject values that cannot produce an image.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(invalid("size must be at least 1 pixel"));
        }
        if !(self.fov_deg > 0.0 && self.fov_deg < 180.0) {
            return Err(invalid(format!(
                "field of view must be between 0 and 180 degrees, got {}",
                self.fov_deg
            )));
        }
        if !(0.0..1.0).contains(&self.margin) {
            return Err(invalid(format!("margin must be in [0, 1), got {}", self.margin)));
        }
        if !self.view.azimuth_deg.is_finite() || !self.view.elevation_deg.is_finite() {
            return Err(invalid("view angles must be finite"));
        }
        if self.light_dir.iter().any(|c| !c.is_finite()) || self.light_dir.norm() <= 1e-12 {
            return Err(invalid(format!(
                "light direction must be a finite non-zero vector, got {},{},{}",
                self.light_dir.x, self.light_dir.y, self.light_dir.z
            )));
        }
        if let Some(ground) = &self.ground_grid {
            if !(ground.step >= 0.0 && ground.step.is_finite()) {
                return Err(invalid(format!("ground grid step must be >= 0, got {}", ground.step)));
            }
            if !(ground.extent > 0.0 && ground.extent.is_finite()) {
                return Err(invalid(format!(
                    "ground grid extent must be > 0, got {}",
                    ground.extent
                )));
            }
        }
        if let Some(axes) = &self.axes {
            if !axes.length.is_finite() {
                return Err(invalid("axes length must be finite"));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> RenderError {
    RenderError::InvalidOption(message.into())
}
