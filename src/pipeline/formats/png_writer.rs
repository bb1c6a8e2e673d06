use anyhow::Result;
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransparencyMode {
    /// Keep the alpha channel the decoders produced.
    PreserveAlpha,
    /// Key transparency off the top-left corner pixel's color.
    CornerKey,
}

/// Zero the alpha of every pixel whose RGB matches the top-left corner.
pub fn apply_corner_key(image: &mut RgbaImage) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let key = image.get_pixel(0, 0).0;
    for pixel in image.pixels_mut() {
        if pixel.0[..3] == key[..3] {
            pixel.0[3] = 0;
        }
    }
}

pub fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
