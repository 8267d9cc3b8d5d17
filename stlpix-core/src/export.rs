//! PNG output.
use image::ImageFormat;
use std::fs;
use std::path::Path;

use crate::error::{RenderError, Result};
use crate::raster::FrameBuffer;

/// Write the frame's color buffer as an 8-bit RGB PNG, creating missing
/// parent directories first.
pub fn write_png(frame: &FrameBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
    }
    frame.image().save_with_format(path, ImageFormat::Png)?;
    log::debug!("saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_write_png_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.png");
        let frame = FrameBuffer::new(8, 4, Rgb([1, 2, 3]));

        write_png(&frame, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(7, 3), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_write_png_into_current_dir_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        write_png(&FrameBuffer::new(2, 2, Rgb([9, 9, 9])), &path).unwrap();
        assert!(path.is_file());
    }
}
