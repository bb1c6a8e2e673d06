pub mod bmp;
pub mod clut;
pub mod png_writer;
pub mod rgba;

pub use png_writer::TransparencyMode;

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};

// Anything wider or taller than this is a garbage header, not a sprite.
pub(crate) const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteFormat {
    /// Indexed-palette `.clut` pixels.
    IndexedClut,
    /// Packed truecolor `.rgba` pixels.
    PackedRgba,
}

impl SpriteFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "clut" => Some(SpriteFormat::IndexedClut),
            "rgba" => Some(SpriteFormat::PackedRgba),
            _ => None,
        }
    }
}

// Little-endian u32 at a fixed offset; missing bytes read as zero so a
// truncated header degrades instead of erroring.
pub(crate) fn u32_at(data: &[u8], offset: usize) -> u32 {
    let mut quad = [0u8; 4];
    for (i, byte) in quad.iter_mut().enumerate() {
        *byte = data.get(offset + i).copied().unwrap_or(0);
    }
    u32::from_le_bytes(quad)
}

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub transparency: TransparencyMode,
    pub keep_bmp: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            transparency: TransparencyMode::PreserveAlpha,
            keep_bmp: false,
        }
    }
}

impl DispatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transparency(mut self, mode: TransparencyMode) -> Self {
        self.transparency = mode;
        self
    }

    pub fn with_keep_bmp(mut self, keep: bool) -> Self {
        self.keep_bmp = keep;
        self
    }
}

pub fn decode_file(path: &Path) -> Result<Option<RgbaImage>> {
    let Some(format) = SpriteFormat::from_path(path) else {
        return Ok(None);
    };

    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let image = match format {
        SpriteFormat::IndexedClut => clut::decode(&data)?,
        SpriteFormat::PackedRgba => rgba::decode(&data)?,
    };
    Ok(Some(image))
}

/// Decode a `.clut`/`.rgba` file and write the PNG beside it. Unknown
/// extensions are a no-op; deleting the source is the caller's business.
pub fn dispatch(path: &Path, options: &DispatchOptions) -> Result<Option<PathBuf>> {
    let Some(mut image) = decode_file(path)? else {
        return Ok(None);
    };

    if options.keep_bmp {
        let container = bmp::encode_container(&image)?;
        std::fs::write(path.with_extension("bmp"), container)
            .with_context(|| format!("Failed to write container for {}", path.display()))?;
    }

    if options.transparency == TransparencyMode::CornerKey {
        png_writer::apply_corner_key(&mut image);
    }

    let png_path = path.with_extension("png");
    png_writer::write_png(&image, &png_path)?;
    Ok(Some(png_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            SpriteFormat::from_path(Path::new("a/b.clut")),
            Some(SpriteFormat::IndexedClut)
        );
        assert_eq!(
            SpriteFormat::from_path(Path::new("a/b.RGBA")),
            Some(SpriteFormat::PackedRgba)
        );
        assert_eq!(SpriteFormat::from_path(Path::new("a/b.meta")), None);
        assert_eq!(SpriteFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_u32_at_zero_fills() {
        let data = [0x01, 0x02];
        assert_eq!(u32_at(&data, 0), 0x0000_0201);
        assert_eq!(u32_at(&data, 8), 0);
    }

    #[test]
    fn test_dispatch_ignores_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let result = dispatch(&path, &DispatchOptions::new()).unwrap();
        assert!(result.is_none());
        assert!(path.exists());
    }

    #[test]
    fn test_dispatch_writes_png_beside_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sprite.rgba");

        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes()); // width
        data.extend_from_slice(&1u32.to_le_bytes()); // height
        data.extend_from_slice(&[10, 20, 30, 255]);
        std::fs::write(&path, &data).unwrap();

        let png = dispatch(&path, &DispatchOptions::new()).unwrap().unwrap();
        assert_eq!(png, dir.path().join("sprite.png"));
        assert!(png.exists());
        assert!(path.exists(), "source must not be deleted");

        let loaded = image::open(&png).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_dispatch_keep_bmp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sprite.rgba");

        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);
        std::fs::write(&path, &data).unwrap();

        let options = DispatchOptions::new().with_keep_bmp(true);
        dispatch(&path, &options).unwrap();
        assert!(dir.path().join("sprite.bmp").exists());
    }
}
