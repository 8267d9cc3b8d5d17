//! Software rasterizer: depth-tested triangles, lines and a screen grid.
use image::{Rgb, RgbImage};
use nalgebra::Vector3;

use crate::geometry::normalize_or_zero;
use crate::projection::ScreenPoint;
use crate::shading::{blend, clamp01, LambertShader};

/// A triangle corner ready for filling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterVertex {
    pub point: ScreenPoint,
    /// Camera-space unit normal.
    pub normal: Vector3<f64>,
}

/// Color image plus a per-pixel depth buffer.
///
/// Depth holds the view distance of the closest surface drawn so far; a
/// fragment passes when its depth is strictly below the stored value.
/// Empty pixels hold +infinity.
pub struct FrameBuffer {
    color: RgbImage,
    depth: Vec<f64>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            color: RgbImage::from_pixel(width, height, background),
            depth: vec![f64::INFINITY; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.color.get_pixel(x, y)
    }

    pub fn depth(&self, x: u32, y: u32) -> f64 {
        self.depth[self.index(x, y)]
    }

    pub fn image(&self) -> &RgbImage {
        &self.color
    }

    pub fn into_image(self) -> RgbImage {
        self.color
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width() as usize + x as usize
    }

    /// In-bounds pixel coordinates, if any.
    fn clip(&self, x: i64, y: i64) -> Option<(u32, u32)> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        (x < self.width() && y < self.height()).then_some((x, y))
    }

    /// Overwrite every `step`-th column and row with the grid color blended
    /// over `background`. Ignores depth; meant to run before any 3-D content.
    pub fn draw_screen_grid(&mut self, background: Rgb<u8>, color: Rgb<u8>, step: u32, alpha: f64) {
        let alpha = clamp01(alpha);
        if step == 0 || alpha <= 0.0 {
            return;
        }
        let line = blend(background, color, alpha);
        let (w, h) = (self.width(), self.height());

        for x in (0..w).step_by(step as usize) {
            for y in 0..h {
                self.color.put_pixel(x, y, line);
            }
        }
        for y in (0..h).step_by(step as usize) {
            for x in 0..w {
                self.color.put_pixel(x, y, line);
            }
        }
    }

    /// Draw a depth-tested, alpha-blended line.
    ///
    /// The line is sampled at `max(|dx|, |dy|)` steps. Samples behind the
    /// stored depth are skipped, but the depth buffer is never written, so
    /// overlapping lines all blend and later triangles still cover them.
    ///
    /// Only samples whose parameter falls inside the image rectangle are
    /// visited, so endpoints far off screen (as produced by the near-plane
    /// clamp) cost no more than an on-screen line.
    pub fn draw_line(&mut self, p0: ScreenPoint, p1: ScreenPoint, color: Rgb<u8>, alpha: f64) {
        let alpha = clamp01(alpha);
        if alpha <= 0.0 {
            return;
        }

        let (x0, y0) = (p0.x as f64, p0.y as f64);
        let dx = p1.x as f64 - x0;
        let dy = p1.y as f64 - y0;
        let steps = dx.abs().max(dy.abs()).trunc();
        if !(steps > 0.0 && steps.is_finite()) {
            return;
        }

        let Some((t0, t1)) = self.clip_segment(x0, y0, dx, dy) else {
            return;
        };
        let first = (t0 * steps).ceil();
        let last = (t1 * steps).floor();
        if first > last {
            return;
        }
        // Bounded by the image size once clipped; the cap guards rounding.
        let limit = 2 * (u64::from(self.width()) + u64::from(self.height()));
        let samples = ((last - first) as u64).min(limit);

        for k in 0..=samples {
            let t = (first + k as f64) / steps;
            let x = (x0 + dx * t).round_ties_even() as i64;
            let y = (y0 + dy * t).round_ties_even() as i64;
            let z = p0.depth + (p1.depth - p0.depth) * t;

            let Some((x, y)) = self.clip(x, y) else {
                continue;
            };
            if z >= self.depth(x, y) {
                continue;
            }
            let mixed = blend(self.pixel(x, y), color, alpha);
            self.color.put_pixel(x, y, mixed);
        }
    }

    /// Parameter range of `p + t * d`, `t` in `[0, 1]`, that stays within one
    /// pixel of the image (Liang-Barsky).
    fn clip_segment(&self, x0: f64, y0: f64, dx: f64, dy: f64) -> Option<(f64, f64)> {
        let (xmax, ymax) = (f64::from(self.width()), f64::from(self.height()));
        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;
        for (p, q) in [
            (-dx, x0 + 1.0),
            (dx, xmax - x0),
            (-dy, y0 + 1.0),
            (dy, ymax - y0),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
        (t0 <= t1).then_some((t0, t1))
    }

    /// Fill a triangle with per-pixel shading.
    ///
    /// Coverage uses edge-function barycentrics at integer pixel positions;
    /// depth and normals are interpolated with the same weights. Triangles
    /// whose clamped bounding box has no area are skipped. Returns the
    /// number of pixels written.
    pub fn fill_triangle(&mut self, corners: &[RasterVertex; 3], shader: &LambertShader) -> usize {
        let [a, b, c] = corners.map(|v| v.point);

        let max_x = i64::from(self.width()) - 1;
        let max_y = i64::from(self.height()) - 1;
        let min_px = a.x.min(b.x).min(c.x).max(0);
        let max_px = a.x.max(b.x).max(c.x).min(max_x);
        let min_py = a.y.min(b.y).min(c.y).max(0);
        let max_py = a.y.max(b.y).max(c.y).min(max_y);
        if min_px >= max_px || min_py >= max_py {
            return 0;
        }

        let Some(weights) = Barycentric::new(&a, &b, &c) else {
            return 0;
        };

        let mut written = 0;
        for py in min_py..=max_py {
            for px in min_px..=max_px {
                let (w0, w1, w2) = weights.at(px, py);
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Box was clamped to the image, so these are in range.
                let (x, y) = (px as u32, py as u32);
                let depth = w0 * a.depth + w1 * b.depth + w2 * c.depth;
                let idx = self.index(x, y);
                if depth >= self.depth[idx] {
                    continue;
                }
                self.depth[idx] = depth;

                let normal = normalize_or_zero(
                    &(corners[0].normal * w0 + corners[1].normal * w1 + corners[2].normal * w2),
                );
                self.color.put_pixel(x, y, shader.shade(&normal));
                written += 1;
            }
        }
        written
    }
}

/// Edge-function setup for barycentric weights over a pixel triangle.
struct Barycentric {
    x2: f64,
    y2: f64,
    e0: (f64, f64),
    e1: (f64, f64),
    denom: f64,
}

impl Barycentric {
    /// `None` when the triangle is degenerate on screen.
    fn new(a: &ScreenPoint, b: &ScreenPoint, c: &ScreenPoint) -> Option<Self> {
        let (x0, y0) = (a.x as f64, a.y as f64);
        let (x1, y1) = (b.x as f64, b.y as f64);
        let (x2, y2) = (c.x as f64, c.y as f64);

        let denom = (y1 - y2) * (x0 - x2) + (x2 - x1) * (y0 - y2);
        if !denom.is_finite() || denom.abs() < 1e-12 {
            return None;
        }

        Some(Self {
            x2,
            y2,
            e0: (y1 - y2, x2 - x1),
            e1: (y2 - y0, x0 - x2),
            denom,
        })
    }

    fn at(&self, px: i64, py: i64) -> (f64, f64, f64) {
        let dx = px as f64 - self.x2;
        let dy = py as f64 - self.y2;
        let w0 = (self.e0.0 * dx + self.e0.1 * dy) / self.denom;
        let w1 = (self.e1.0 * dx + self.e1.1 * dy) / self.denom;
        (w0, w1, 1.0 - w0 - w1)
    }
}
