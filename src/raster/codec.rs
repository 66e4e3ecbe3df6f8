//! Image codec boundary
//!
//! Decode and encode live entirely behind these two functions; the rest of
//! the system only sees `PixelBuffer`. Formats are whatever the `image`
//! crate infers from the path extension.

use crate::error::FilterError;
use crate::raster::{self, PixelBuffer};
use anyhow::{Context, Result};
use std::path::Path;

/// Decode an image file into a packed-RGB buffer
///
/// Alpha is dropped; every source is converted to 8-bit RGB first.
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    let decoded = image::open(path)
        .map_err(FilterError::Decode)
        .with_context(|| format!("Failed to load image: {}", path.display()))?;

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let pixels: Vec<u32> = rgb
        .pixels()
        .map(|p| raster::pack(p.0[0], p.0[1], p.0[2]))
        .collect();

    PixelBuffer::from_raw(width, height, pixels)
}

/// Encode a buffer to an image file; format inferred from the extension
pub fn save_image(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let mut rgb = image::RgbImage::new(buffer.width(), buffer.height());

    for (i, pixel) in buffer.pixels().iter().enumerate() {
        let x = i as u32 % buffer.width();
        let y = i as u32 / buffer.width();
        rgb.put_pixel(
            x,
            y,
            image::Rgb([raster::red(*pixel), raster::green(*pixel), raster::blue(*pixel)]),
        );
    }

    rgb.save(path)
        .with_context(|| format!("Failed to save image: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::pack;

    #[test]
    fn test_png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.png");

        let mut buffer = PixelBuffer::new(4, 3);
        for y in 0..3u32 {
            let row: Vec<u32> = (0..4u32)
                .map(|x| pack((x * 60) as u8, (y * 80) as u8, 128))
                .collect();
            buffer.paste_rows(y, &row);
        }

        save_image(&buffer, &path).unwrap();
        let loaded = load_image(&path).unwrap();

        // PNG is lossless, so the packed samples must survive untouched
        assert_eq!(loaded, buffer);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.png");
        assert!(load_image(&path).is_err());
    }
}
