//! DXT1 block codec
//!
//! Blocks are kept in the coprocessor's byte order: two big-endian 32-bit words,
//! `color1 << 16 | color0` then the 2-bit index plane. That is the standard
//! little-endian block with each 32-bit half byte-reversed.
//!
//! The compressor searches the four diagonals of the block's RGB bounding box,
//! each with the 4-level and 3-level palettes, and keeps the lowest squared error.

use crate::error::{RasterError, Result};

/// Alpha below this is transparent (both for compression and for the span unit)
pub const ALPHA_THRESHOLD: u8 = 128;

/// Bytes per 4x4 block
pub const BLOCK_BYTES: usize = 8;

/// Layout of uncompressed input pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Rgb24,
    Rgba32,
}

impl SourceFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            SourceFormat::Rgb24 => 3,
            SourceFormat::Rgba32 => 4,
        }
    }
}

/// One decoded DXT1 block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub color0: u16,
    pub color1: u16,
    pub indices: u32,
}

impl Block {
    /// Reserved code for a block with no opaque pixel
    pub const TRANSPARENT: Block = Block { color0: 0x0000, color1: 0xFFFF, indices: 0xFFFF_FFFF };

    /// Parse from coprocessor byte order
    pub fn from_bytes(b: &[u8]) -> Block {
        let word0 = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
        let word1 = u32::from_be_bytes([b[4], b[5], b[6], b[7]]);
        Block { color0: word0 as u16, color1: (word0 >> 16) as u16, indices: word1 }
    }

    /// Serialize in coprocessor byte order
    pub fn to_bytes(self) -> [u8; BLOCK_BYTES] {
        let word0 = ((self.color1 as u32) << 16) | self.color0 as u32;
        let mut out = [0u8; BLOCK_BYTES];
        out[0..4].copy_from_slice(&word0.to_be_bytes());
        out[4..8].copy_from_slice(&self.indices.to_be_bytes());
        out
    }

    /// Parse from standard (DDS) little-endian order
    pub fn from_le_bytes(b: &[u8]) -> Block {
        Block {
            color0: u16::from_le_bytes([b[0], b[1]]),
            color1: u16::from_le_bytes([b[2], b[3]]),
            indices: u32::from_le_bytes([b[4], b[5], b[6], b[7]]),
        }
    }

    pub fn to_le_bytes(self) -> [u8; BLOCK_BYTES] {
        let mut out = [0u8; BLOCK_BYTES];
        out[0..2].copy_from_slice(&self.color0.to_le_bytes());
        out[2..4].copy_from_slice(&self.color1.to_le_bytes());
        out[4..8].copy_from_slice(&self.indices.to_le_bytes());
        out
    }

    pub fn index(self, i: usize) -> usize {
        ((self.indices >> (2 * i)) & 0b11) as usize
    }

    pub fn is_four_level(self) -> bool {
        self.color0 > self.color1
    }

    pub fn palette(self) -> [[u8; 4]; 4] {
        palette(self.color0, self.color1)
    }

    /// Decode pixel `i` (row-major inside the block) to RGBA
    pub fn texel(self, i: usize) -> [u8; 4] {
        self.palette()[self.index(i)]
    }
}

fn rgb565_to_rgb888(c: u16) -> [u8; 3] {
    let r5 = ((c >> 11) & 0x1f) as u8;
    let g6 = ((c >> 5) & 0x3f) as u8;
    let b5 = (c & 0x1f) as u8;
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2)]
}

fn rgb888_to_rgb565(c: [u8; 3]) -> u16 {
    let r5 = (c[0] as u32 * 31 + 127) / 255;
    let g6 = (c[1] as u32 * 63 + 127) / 255;
    let b5 = (c[2] as u32 * 31 + 127) / 255;
    ((r5 << 11) | (g6 << 5) | b5) as u16
}

fn lerp_u8(a: u8, b: u8, num: u32, den: u32) -> u8 {
    (((a as u32) * (den - num) + (b as u32) * num) / den) as u8
}

fn mix(c0: [u8; 3], c1: [u8; 3], num: u32, den: u32) -> [u8; 4] {
    [
        lerp_u8(c0[0], c1[0], num, den),
        lerp_u8(c0[1], c1[1], num, den),
        lerp_u8(c0[2], c1[2], num, den),
        255,
    ]
}

/// Palette for a pair of raw endpoints; 4-level when `color0 > color1`
fn palette(color0: u16, color1: u16) -> [[u8; 4]; 4] {
    let c0 = rgb565_to_rgb888(color0);
    let c1 = rgb565_to_rgb888(color1);
    let p0 = [c0[0], c0[1], c0[2], 255];
    let p1 = [c1[0], c1[1], c1[2], 255];
    if color0 > color1 {
        [p0, p1, mix(c0, c1, 1, 3), mix(c0, c1, 2, 3)]
    } else {
        [p0, p1, mix(c0, c1, 1, 2), [0, 0, 0, 0]]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Levels {
    Four,
    Three,
}

/// Palette as the decoder will see it, regardless of endpoint order
fn scheme_palette(e0: u16, e1: u16, levels: Levels) -> [[u8; 4]; 4] {
    let c0 = rgb565_to_rgb888(e0);
    let c1 = rgb565_to_rgb888(e1);
    let p0 = [c0[0], c0[1], c0[2], 255];
    let p1 = [c1[0], c1[1], c1[2], 255];
    match levels {
        Levels::Four => [p0, p1, mix(c0, c1, 1, 3), mix(c0, c1, 2, 3)],
        Levels::Three => [p0, p1, mix(c0, c1, 1, 2), [0, 0, 0, 0]],
    }
}

fn distance(a: [u8; 4], b: [u8; 4]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Pick indices for `pixels` against one palette; returns (indices, error)
fn fit(pixels: &[[u8; 4]; 16], opaque: &[bool; 16], pal: &[[u8; 4]; 4], levels: Levels) -> (u32, u64) {
    let usable = match levels {
        Levels::Four => 4,
        Levels::Three => 3,
    };
    let mut indices = 0u32;
    let mut error = 0u64;
    for (i, px) in pixels.iter().enumerate() {
        let idx = if !opaque[i] {
            3
        } else {
            let mut best = 0;
            let mut best_d = u32::MAX;
            for (j, entry) in pal.iter().take(usable).enumerate() {
                let d = distance(*px, *entry);
                if d < best_d {
                    best_d = d;
                    best = j;
                }
            }
            error += best_d as u64;
            best
        };
        indices |= (idx as u32) << (2 * i);
    }
    (indices, error)
}

fn remap(indices: u32, table: [u32; 4]) -> u32 {
    (0..16).fold(0, |acc, i| {
        let idx = (indices >> (2 * i)) & 0b11;
        acc | (table[idx as usize] << (2 * i))
    })
}

/// Compress one 4x4 block of RGBA pixels.
/// With `has_alpha` false every pixel is treated as opaque.
pub fn compress_block(pixels: &[[u8; 4]; 16], has_alpha: bool) -> Block {
    let mut opaque = [true; 16];
    if has_alpha {
        for (o, px) in opaque.iter_mut().zip(pixels.iter()) {
            *o = px[3] >= ALPHA_THRESHOLD;
        }
    }
    if opaque.iter().all(|o| !o) {
        return Block::TRANSPARENT;
    }
    let force_three = opaque.iter().any(|o| !o);

    let mut lo = [255u8; 3];
    let mut hi = [0u8; 3];
    for (px, _) in pixels.iter().zip(opaque.iter()).filter(|(_, o)| **o) {
        for c in 0..3 {
            lo[c] = lo[c].min(px[c]);
            hi[c] = hi[c].max(px[c]);
        }
    }

    // Main diagonal first, then with R, G or B running the other way
    let mut best: Option<(u64, u16, u16, u32, Levels)> = None;
    for flip in [None, Some(0), Some(1), Some(2)] {
        let mut a = lo;
        let mut b = hi;
        if let Some(c) = flip {
            std::mem::swap(&mut a[c], &mut b[c]);
        }
        let e0 = rgb888_to_rgb565(a);
        let e1 = rgb888_to_rgb565(b);
        let schemes: &[Levels] = if force_three {
            &[Levels::Three]
        } else {
            &[Levels::Four, Levels::Three]
        };
        for &levels in schemes {
            let pal = scheme_palette(e0, e1, levels);
            let (indices, error) = fit(pixels, &opaque, &pal, levels);
            if best.map_or(true, |(e, ..)| error < e) {
                best = Some((error, e0, e1, indices, levels));
            }
        }
    }

    let Some((_, mut e0, mut e1, mut indices, levels)) = best else {
        return Block::TRANSPARENT;
    };

    match levels {
        Levels::Four => {
            if e0 == e1 {
                indices = 0;
            } else if e0 < e1 {
                std::mem::swap(&mut e0, &mut e1);
                indices = remap(indices, [1, 0, 3, 2]);
            }
        }
        Levels::Three => {
            if e0 > e1 {
                std::mem::swap(&mut e0, &mut e1);
                indices = remap(indices, [1, 0, 2, 3]);
            }
        }
    }

    Block { color0: e0, color1: e1, indices }
}

fn check_dims(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width % 4 != 0 || height % 4 != 0 {
        return Err(RasterError::TextureSize { width, height });
    }
    Ok(())
}

/// Size in bytes of a `width` x `height` DXT1 image
pub fn compressed_size(width: u32, height: u32) -> usize {
    (width as usize / 4) * (height as usize / 4) * BLOCK_BYTES
}

/// Compress an RGB24/RGBA32 image into coprocessor-order DXT1 blocks
pub fn compress(pixels: &[u8], width: u32, height: u32, format: SourceFormat) -> Result<Vec<u8>> {
    check_dims(width, height)?;
    let bpp = format.bytes_per_pixel();
    if pixels.len() < width as usize * height as usize * bpp {
        return Err(RasterError::TextureFormat("pixel buffer shorter than image".into()));
    }

    let mut out = Vec::new();
    out.try_reserve_exact(compressed_size(width, height))?;

    let has_alpha = format == SourceFormat::Rgba32;
    for by in 0..(height / 4) as usize {
        for bx in 0..(width / 4) as usize {
            let mut block = [[0u8; 4]; 16];
            for (i, px) in block.iter_mut().enumerate() {
                let x = bx * 4 + i % 4;
                let y = by * 4 + i / 4;
                let off = (y * width as usize + x) * bpp;
                px[0] = pixels[off];
                px[1] = pixels[off + 1];
                px[2] = pixels[off + 2];
                px[3] = if has_alpha { pixels[off + 3] } else { 255 };
            }
            out.extend_from_slice(&compress_block(&block, has_alpha).to_bytes());
        }
    }
    Ok(out)
}

/// Decompress coprocessor-order DXT1 blocks into RGBA32
pub fn decompress(blocks: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_dims(width, height)?;
    if blocks.len() < compressed_size(width, height) {
        return Err(RasterError::TextureFormat("DXT1 data shorter than image".into()));
    }

    let mut out = Vec::new();
    out.try_reserve_exact(width as usize * height as usize * 4)?;
    out.resize(width as usize * height as usize * 4, 0);

    let blocks_x = (width / 4) as usize;
    for (n, chunk) in blocks.chunks_exact(BLOCK_BYTES).take(compressed_size(width, height) / BLOCK_BYTES).enumerate() {
        let block = Block::from_bytes(chunk);
        let pal = block.palette();
        let bx = n % blocks_x;
        let by = n / blocks_x;
        for i in 0..16 {
            let x = bx * 4 + i % 4;
            let y = by * 4 + i / 4;
            let off = (y * width as usize + x) * 4;
            out[off..off + 4].copy_from_slice(&pal[block.index(i)]);
        }
    }
    Ok(out)
}

/// Decode a single texel from an image of coprocessor-order blocks
pub fn decode_texel(blocks: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let n = (y / 4) as usize * (width / 4) as usize + (x / 4) as usize;
    let off = n * BLOCK_BYTES;
    match blocks.get(off..off + BLOCK_BYTES) {
        Some(b) => Block::from_bytes(b).texel(((y % 4) * 4 + x % 4) as usize),
        None => [0, 0, 0, 0],
    }
}

/// Convert a run of standard little-endian blocks to coprocessor order in place
pub fn swap_to_coprocessor_order(blocks: &mut [u8]) {
    for chunk in blocks.chunks_exact_mut(BLOCK_BYTES) {
        let block = Block::from_le_bytes(chunk);
        chunk.copy_from_slice(&block.to_bytes());
    }
}
