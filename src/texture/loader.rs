//! Texture file loading
//!
//! BMP (including palettized) and PNG go through the `image` crate and come out
//! as RGB24 or RGBA32. DDS-style containers carry DXT1 blocks that are swapped
//! to coprocessor order here.

use std::fs;
use std::path::Path;

use crate::error::{RasterError, Result};
use super::dxt1;
use super::{SourceImage, SourcePixels};

const DDS_MAGIC: &[u8; 4] = b"DDS ";
const DDS_FOURCC_DXT1: &[u8; 4] = b"DXT1";
const DDS_HEIGHT_OFFSET: usize = 12;
const DDS_WIDTH_OFFSET: usize = 16;
const DDS_FOURCC_OFFSET: usize = 84;
const DDS_DATA_OFFSET: usize = 128;

fn read_u32_le(bytes: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
}

/// Parse a DDS container holding DXT1 data
pub fn read_dds(bytes: &[u8]) -> Result<SourceImage> {
    if bytes.len() < DDS_DATA_OFFSET || &bytes[0..4] != DDS_MAGIC {
        return Err(RasterError::TextureFormat("not a DDS file".into()));
    }
    if &bytes[DDS_FOURCC_OFFSET..DDS_FOURCC_OFFSET + 4] != DDS_FOURCC_DXT1 {
        return Err(RasterError::TextureFormat("DDS payload is not DXT1".into()));
    }
    let height = read_u32_le(bytes, DDS_HEIGHT_OFFSET);
    let width = read_u32_le(bytes, DDS_WIDTH_OFFSET);
    if width == 0 || height == 0 || width % 4 != 0 || height % 4 != 0 {
        return Err(RasterError::TextureSize { width, height });
    }

    let size = dxt1::compressed_size(width, height);
    let payload = &bytes[DDS_DATA_OFFSET..];
    if payload.len() < size {
        return Err(RasterError::TextureFormat("truncated DXT1 payload".into()));
    }

    let mut blocks = Vec::new();
    blocks.try_reserve_exact(size)?;
    blocks.extend_from_slice(&payload[..size]);
    dxt1::swap_to_coprocessor_order(&mut blocks);

    Ok(SourceImage { width, height, pixels: SourcePixels::Dxt1(blocks) })
}

/// Build a DDS container around coprocessor-order blocks
pub fn write_dds(width: u32, height: u32, blocks: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; DDS_DATA_OFFSET];
    out[0..4].copy_from_slice(DDS_MAGIC);
    out[4..8].copy_from_slice(&124u32.to_le_bytes());
    out[DDS_HEIGHT_OFFSET..DDS_HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
    out[DDS_WIDTH_OFFSET..DDS_WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
    out[DDS_FOURCC_OFFSET..DDS_FOURCC_OFFSET + 4].copy_from_slice(DDS_FOURCC_DXT1);
    for chunk in blocks.chunks_exact(dxt1::BLOCK_BYTES) {
        out.extend_from_slice(&dxt1::Block::from_bytes(chunk).to_le_bytes());
    }
    out
}

/// Decode BMP/PNG bytes into RGB24 (opaque) or RGBA32
pub fn decode_image_bytes(bytes: &[u8]) -> Result<SourceImage> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());
    let pixels = if img.color().has_alpha() {
        SourcePixels::Rgba32(img.to_rgba8().into_raw())
    } else {
        SourcePixels::Rgb24(img.to_rgb8().into_raw())
    };
    Ok(SourceImage { width, height, pixels })
}

pub fn decode_image_file<P: AsRef<Path>>(path: P) -> Result<SourceImage> {
    let bytes = fs::read(path)?;
    decode_image_bytes(&bytes)
}

/// Load any supported texture file, choosing the parser by extension
pub fn load_source<P: AsRef<Path>>(path: P) -> Result<SourceImage> {
    let path = path.as_ref();
    let is_dds = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("dds"))
        .unwrap_or(false);

    let image = if is_dds {
        read_dds(&fs::read(path)?)?
    } else {
        decode_image_file(path)?
    };
    tracing::debug!(path = %path.display(), width = image.width, height = image.height, "decoded texture");
    Ok(image)
}
