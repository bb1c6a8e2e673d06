use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use image::RgbaImage;
use std::io::Write;

// Total header length; pixel data starts here.
pub const PIXEL_DATA_OFFSET: u32 = 0x7a;

const DIB_HEADER_SIZE: u32 = 0x6c;
const BITS_PER_PIXEL: u16 = 32;
// bit-fields-present compression marker
const COMPRESSION_BITFIELDS: u32 = 3;
const DENSITY_DPI: u32 = 72;
const COLORSPACE_TAG: &[u8] = b"RGBs";

/// Synthesize the legacy bitmap container: a 0x7a-byte header with RGBA
/// bit-field masks followed by the canonical pixel bytes in decode order.
pub fn encode_container(image: &RgbaImage) -> Result<Vec<u8>> {
    let data_size = image.width() * image.height() * 4;
    let mut out = Vec::with_capacity(PIXEL_DATA_OFFSET as usize + data_size as usize);

    out.write_all(b"BM")?;
    out.write_u32::<LittleEndian>(PIXEL_DATA_OFFSET + data_size)?;
    out.write_u16::<LittleEndian>(0)?; // reserved
    out.write_u16::<LittleEndian>(0)?; // reserved
    out.write_u32::<LittleEndian>(PIXEL_DATA_OFFSET)?;

    out.write_u32::<LittleEndian>(DIB_HEADER_SIZE)?;
    out.write_u32::<LittleEndian>(image.width())?;
    out.write_u32::<LittleEndian>(image.height())?;
    out.write_u16::<LittleEndian>(1)?; // planes
    out.write_u16::<LittleEndian>(BITS_PER_PIXEL)?;
    out.write_u32::<LittleEndian>(COMPRESSION_BITFIELDS)?;
    out.write_u32::<LittleEndian>(data_size)?;
    out.write_u32::<LittleEndian>(DENSITY_DPI)?; // horizontal
    out.write_u32::<LittleEndian>(DENSITY_DPI)?; // vertical
    out.write_u32::<LittleEndian>(0)?; // palette count
    out.write_u32::<LittleEndian>(0)?; // important palette count

    // One full byte per channel mask, R,G,B,A order.
    out.write_all(&[0xff, 0, 0, 0])?;
    out.write_all(&[0, 0xff, 0, 0])?;
    out.write_all(&[0, 0, 0xff, 0])?;
    out.write_all(&[0, 0, 0, 0xff])?;

    out.write_all(COLORSPACE_TAG)?;
    out.write_all(&[0u8; 0x24])?; // colorspace endpoints, unused

    out.write_u32::<LittleEndian>(0)?; // gamma red
    out.write_u32::<LittleEndian>(0)?; // gamma green
    out.write_u32::<LittleEndian>(0)?; // gamma blue

    out.write_all(image.as_raw())?;
    Ok(out)
}
