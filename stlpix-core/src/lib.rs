//! stlpix core library: software rasterization of STL meshes.
//!
//! Loading, upright orientation, perspective projection, z-buffered
//! triangle filling with Lambert shading, and PNG output. No GPU or
//! windowing is involved; everything runs on plain buffers.

pub mod error;
pub mod export;
pub mod geometry;
pub mod options;
pub mod overlay;
pub mod projection;
pub mod raster;
pub mod render;
pub mod shading;
pub mod stl;
pub mod transform;
pub mod upright;

// Re-export commonly used types
pub use error::{RenderError, Result, StlError};
pub use export::write_png;
pub use geometry::{Bounds, Mesh, Triangle};
pub use options::{Axes, GroundGrid, RenderOptions, ScreenGrid};
pub use projection::Camera;
pub use raster::FrameBuffer;
pub use render::{render, render_stl_file, render_with_stats, RenderStats};
pub use stl::{load_stl, parse_stl};
pub use transform::{Transform, ViewAngles};
pub use upright::Upright;
