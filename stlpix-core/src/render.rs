//! The render pipeline: triangles in, shaded frame out.
use nalgebra::{Matrix3, Vector3};
use std::path::Path;

use crate::error::{Result, StlError};
use crate::export::write_png;
use crate::geometry::{Bounds, Mesh, Triangle};
use crate::options::RenderOptions;
use crate::overlay::{self, Segment};
use crate::projection::{Camera, ScreenPoint};
use crate::raster::{FrameBuffer, RasterVertex};
use crate::shading::LambertShader;
use crate::stl::load_stl;
use crate::upright::{self, Upright};

/// Projected x or y beyond this on every corner means the face is far off screen.
const OFFSCREEN_LIMIT: f64 = 2.0;

/// Counters collected while rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    pub faces: usize,
    pub culled: usize,
    pub offscreen: usize,
    pub drawn: usize,
    pub pixels: usize,
    /// Support score of the chosen orientation, if auto-upright ran.
    pub support_area: Option<f64>,
}

/// Render a triangle soup to a frame buffer.
pub fn render(triangles: &[Triangle], options: &RenderOptions) -> Result<FrameBuffer> {
    render_with_stats(triangles, options).map(|(frame, _)| frame)
}

/// Like [`render`], also reporting what happened to each face.
pub fn render_with_stats(
    triangles: &[Triangle],
    options: &RenderOptions,
) -> Result<(FrameBuffer, RenderStats)> {
    options.validate()?;
    let bounds = Bounds::from_triangles(triangles).ok_or(StlError::EmptyMesh)?;
    if bounds.is_degenerate() {
        log::warn!("mesh has no extent, framing it with radius 1.0");
    }
    let radius = bounds.radius();
    let mesh = Mesh::from_triangles(triangles);
    log::debug!(
        "mesh: {} triangles, {} unique vertices, radius {radius:.4}",
        mesh.face_count(),
        mesh.vertex_count()
    );

    let mut stats = RenderStats {
        faces: mesh.face_count(),
        ..Default::default()
    };

    let rotation = if options.auto_upright {
        let Upright {
            rotation,
            support_area,
        } = upright::solve(triangles, &bounds);
        log::info!("auto-upright support area {support_area:.4}");
        stats.support_area = Some(support_area);
        rotation
    } else {
        Matrix3::identity()
    };

    let camera = Camera::new(
        &bounds,
        rotation,
        &options.view,
        options.fov_deg,
        options.margin,
        options.size,
    );

    let mut frame = FrameBuffer::new(options.size, options.size, options.background);
    if let Some(grid) = &options.screen_grid {
        frame.draw_screen_grid(options.background, grid.color, grid.step, grid.alpha);
    }

    let upright: Vec<Vector3<f64>> = mesh.vertices.iter().map(|p| camera.to_upright(p)).collect();
    let ground = overlay::ground_height(&upright, radius);
    let mut segments: Vec<Segment> = Vec::new();
    if let Some(grid) = &options.ground_grid {
        segments.extend(overlay::ground_grid(grid, radius, ground));
    }
    if let Some(axes) = &options.axes {
        segments.extend(overlay::axis_triad(axes, radius, ground));
    }
    for segment in &segments {
        let start = camera.to_screen(&camera.upright_to_camera(&segment.start));
        let end = camera.to_screen(&camera.upright_to_camera(&segment.end));
        frame.draw_line(start, end, segment.color, segment.alpha);
    }

    let positions: Vec<Vector3<f64>> = upright.iter().map(|v| camera.upright_to_camera(v)).collect();
    let normals: Vec<Vector3<f64>> = mesh.normals.iter().map(|n| camera.rotate_normal(n)).collect();
    let shader = LambertShader::new(options.color, &options.light_dir);

    for face in &mesh.faces {
        let [a, b, c] = face.map(|i| positions[i]);

        // Camera sits at the origin looking down -z, so a face turned
        // toward it has a normal with positive z.
        if !options.two_sided && (b - a).cross(&(c - a)).z <= 0.0 {
            stats.culled += 1;
            continue;
        }

        let projected = [a, b, c].map(|p| camera.project(&p));
        let outside = |v: f64| !(-OFFSCREEN_LIMIT..=OFFSCREEN_LIMIT).contains(&v);
        if projected.iter().all(|p| outside(p.x)) || projected.iter().all(|p| outside(p.y)) {
            stats.offscreen += 1;
            continue;
        }

        let corners = [0, 1, 2].map(|k| {
            let p = projected[k];
            let (x, y) = camera.to_pixel(p.x, p.y);
            RasterVertex {
                point: ScreenPoint {
                    x,
                    y,
                    depth: p.depth,
                },
                normal: normals[face[k]],
            }
        });

        let written = frame.fill_triangle(&corners, &shader);
        if written > 0 {
            stats.drawn += 1;
            stats.pixels += written;
        }
    }

    log::debug!(
        "faces: {} total, {} culled, {} off screen, {} drawn ({} pixels)",
        stats.faces,
        stats.culled,
        stats.offscreen,
        stats.drawn,
        stats.pixels
    );
    Ok((frame, stats))
}

/// Load an STL file, render it and write a PNG.
///
/// Nothing is written when loading or rendering fails.
pub fn render_stl_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<RenderStats> {
    let input = input.as_ref();
    let output = output.as_ref();

    options.validate()?;
    let triangles = load_stl(input)?;
    log::info!("loaded {} triangles from {}", triangles.len(), input.display());

    let (frame, stats) = render_with_stats(&triangles, options)?;
    write_png(&frame, output)?;
    log::info!("wrote {}x{} image to {}", frame.width(), frame.height(), output.display());
    Ok(stats)
}
