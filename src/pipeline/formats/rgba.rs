use anyhow::{Result, bail};
use image::RgbaImage;

use super::{MAX_DIMENSION, u32_at};

// 4 unused bytes, width, height; pixel data starts at 12.
const DATA_OFFSET: usize = 12;

/// Decode a packed-truecolor `.rgba` buffer: `width*height*4` bytes,
/// row-major, bottom row first; truncated rows are zero-filled.
pub fn decode(data: &[u8]) -> Result<RgbaImage> {
    let width = u32_at(data, 4);
    let height = u32_at(data, 8);

    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        bail!("Implausible rgba dimensions: {}x{}", width, height);
    }

    let (w, h) = (width as usize, height as usize);
    let row_bytes = w * 4;
    let mut pixels = Vec::with_capacity(row_bytes * h);

    for y in 0..h {
        let src_row = h - 1 - y;
        let row_offset = DATA_OFFSET + src_row * row_bytes;
        let available = data.len().saturating_sub(row_offset).min(row_bytes);
        if available > 0 {
            pixels.extend_from_slice(&data[row_offset..row_offset + available]);
        }
        pixels.resize(pixels.len() + row_bytes - available, 0);
    }

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow::anyhow!("Pixel buffer length mismatch for {}x{}", width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes()); // unused
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data
    }

    #[test]
    fn test_decode_reverses_row_order() {
        let mut data = rgba_header(1, 2);
        data.extend_from_slice(&[1, 1, 1, 255]); // bottom row
        data.extend_from_slice(&[2, 2, 2, 255]); // top row

        let image = decode(&data).unwrap();
        assert_eq!(image.as_raw().len(), 1 * 2 * 4);
        assert_eq!(image.get_pixel(0, 0).0, [2, 2, 2, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [1, 1, 1, 255]);
    }

    #[test]
    fn test_truncated_pixels_zero_filled() {
        let mut data = rgba_header(2, 2);
        data.extend_from_slice(&[7, 7, 7, 7, 8, 8]); // 6 of 16 bytes

        let image = decode(&data).unwrap();
        assert_eq!(image.as_raw().len(), 2 * 2 * 4);
        // bottom output row is the first stored row
        assert_eq!(image.get_pixel(0, 1).0, [7, 7, 7, 7]);
        assert_eq!(image.get_pixel(1, 1).0, [8, 8, 0, 0]);
        // fully missing row
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_buffer_degrades_to_empty() {
        let image = decode(&[]).unwrap();
        assert_eq!(image.width(), 0);
        assert_eq!(image.height(), 0);
    }

    #[test]
    fn test_implausible_header_rejected() {
        let data = rgba_header(5000, 1);
        assert!(decode(&data).is_err());
    }
}
