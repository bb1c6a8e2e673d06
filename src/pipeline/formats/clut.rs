use anyhow::{Result, bail};
use image::RgbaImage;

use super::{MAX_DIMENSION, u32_at};

// 4 unused bytes, color count, width, height, then the palette.
const PALETTE_OFFSET: usize = 16;
const MAX_COLORS: u32 = 1024;

// Out-of-range palette indices decode to this; the format never guards them.
const OUT_OF_RANGE: [u8; 4] = [0, 0, 0, 0];

/// Decode an indexed-palette `.clut` buffer into a canonical top-to-bottom
/// RGBA image. One RGBA quad per palette color, then `width*height`
/// one-byte indices stored row-major with the bottom row first; truncated
/// data is zero-filled rather than rejected.
pub fn decode(data: &[u8]) -> Result<RgbaImage> {
    let color_count = u32_at(data, 4);
    let width = u32_at(data, 8);
    let height = u32_at(data, 12);

    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        bail!("Implausible clut dimensions: {}x{}", width, height);
    }
    if color_count > MAX_COLORS {
        bail!("Implausible clut color count: {}", color_count);
    }

    let mut palette = Vec::with_capacity(color_count as usize);
    for i in 0..color_count as usize {
        let offset = PALETTE_OFFSET + i * 4;
        let mut entry = [0u8; 4];
        for (c, byte) in entry.iter_mut().enumerate() {
            *byte = data.get(offset + c).copied().unwrap_or(0);
        }
        palette.push(entry);
    }

    let (w, h) = (width as usize, height as usize);
    let index_base = PALETTE_OFFSET + color_count as usize * 4;
    let mut pixels = Vec::with_capacity(w * h * 4);

    // Source rows run bottom-first; read them back-to-front so the output
    // is top-to-bottom.
    for y in 0..h {
        let src_row = h - 1 - y;
        let row_offset = index_base + src_row * w;
        for x in 0..w {
            let index = data.get(row_offset + x).copied().unwrap_or(0) as usize;
            let rgba = palette.get(index).unwrap_or(&OUT_OF_RANGE);
            pixels.extend_from_slice(rgba);
        }
    }

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow::anyhow!("Pixel buffer length mismatch for {}x{}", width, height))
}
