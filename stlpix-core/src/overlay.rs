//! Ground grid and axis triad geometry.
//!
//! Segments live in the centered, upright model frame: the ground plane is
//! horizontal there no matter how the raw mesh was oriented.

use image::Rgb;
use nalgebra::Vector3;

use crate::options::{Axes, GroundGrid};

/// Upper bound on ground grid lines along each axis.
pub const MAX_GRID_LINES: usize = 1001;

const AXIS_ALPHA: f64 = 0.95;
const AXIS_X: Rgb<u8> = Rgb([220, 60, 60]);
const AXIS_Y: Rgb<u8> = Rgb([60, 200, 120]);
const AXIS_Z: Rgb<u8> = Rgb([80, 140, 240]);

/// A colored line segment in the upright frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vector3<f64>,
    pub end: Vector3<f64>,
    pub color: Rgb<u8>,
    pub alpha: f64,
}

/// Height of the ground plane: just below the lowest upright vertex.
pub fn ground_height<'a>(upright_vertices: impl IntoIterator<Item = &'a Vector3<f64>>, radius: f64) -> f64 {
    let lowest = upright_vertices
        .into_iter()
        .map(|v| v.z)
        .fold(f64::INFINITY, f64::min);
    lowest - 0.02 * radius
}

/// Lines of constant x, then constant y, across `[-ext, ext]`.
///
/// A step so fine that more than [`MAX_GRID_LINES`] lines would be needed
/// per axis is widened to fit that many.
pub fn ground_grid(grid: &GroundGrid, radius: f64, height: f64) -> Vec<Segment> {
    let ext = radius * grid.extent;
    let mut step = if grid.step > 0.0 {
        grid.step
    } else {
        (2.0 * ext / 10.0).max(1e-6)
    };
    let mut count = line_count(ext, step);
    if count > MAX_GRID_LINES {
        log::warn!("ground grid step {step} needs {count} lines per axis, capping at {MAX_GRID_LINES}");
        step = 2.0 * ext / (MAX_GRID_LINES - 1) as f64;
        count = line_count(ext, step).min(MAX_GRID_LINES);
    }

    let line = |start: Vector3<f64>, end: Vector3<f64>| Segment {
        start,
        end,
        color: grid.color,
        alpha: grid.alpha,
    };
    let offset = |i: usize| -ext + i as f64 * step;

    let mut segments = Vec::with_capacity(2 * count);
    segments.extend((0..count).map(|i| {
        let x = offset(i);
        line(Vector3::new(x, -ext, height), Vector3::new(x, ext, height))
    }));
    segments.extend((0..count).map(|i| {
        let y = offset(i);
        line(Vector3::new(-ext, y, height), Vector3::new(ext, y, height))
    }));
    segments
}

/// Lines at `-ext, -ext + step, ...` up to `ext` (with a little slack).
fn line_count(ext: f64, step: f64) -> usize {
    let n = ((2.0 * ext + 1e-9) / step).floor();
    if n.is_finite() && n >= 0.0 {
        // Saturates for absurd ratios; callers cap the result.
        (n as usize).saturating_add(1)
    } else {
        1
    }
}

/// Red X, green Y and blue Z axes from the ground-plane origin.
pub fn axis_triad(axes: &Axes, radius: f64, height: f64) -> Vec<Segment> {
    let len = radius * axes.length;
    let origin = Vector3::new(0.0, 0.0, height);
    [
        (Vector3::new(len, 0.0, height), AXIS_X),
        (Vector3::new(0.0, len, height), AXIS_Y),
        (Vector3::new(0.0, 0.0, height + len), AXIS_Z),
    ]
    .into_iter()
    .map(|(end, color)| Segment {
        start: origin,
        end,
        color,
        alpha: AXIS_ALPHA,
    })
    .collect()
}
