//! Bounds-checked views over caller-owned pixel and depth memory

use crate::error::{RasterError, Result};
use super::types::Color;

/// Output pixel format of a draw region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelDepth {
    /// 16-bit 5:6:5, little-endian
    Rgb565,
    /// 24-bit, bytes B, G, R
    Rgb888,
    /// 32-bit 0xAARRGGBB, little-endian
    Argb8888,
}

impl PixelDepth {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelDepth::Rgb565 => 2,
            PixelDepth::Rgb888 => 3,
            PixelDepth::Argb8888 => 4,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(PixelDepth::Rgb565),
            24 => Some(PixelDepth::Rgb888),
            32 => Some(PixelDepth::Argb8888),
            _ => None,
        }
    }

    /// Encode into `out`, which must be exactly `bytes_per_pixel` long
    pub fn encode(self, c: Color, out: &mut [u8]) {
        match self {
            PixelDepth::Rgb565 => {
                let p = ((c.r as u16 >> 3) << 11) | ((c.g as u16 >> 2) << 5) | (c.b as u16 >> 3);
                out.copy_from_slice(&p.to_le_bytes());
            }
            PixelDepth::Rgb888 => out.copy_from_slice(&[c.b, c.g, c.r]),
            PixelDepth::Argb8888 => out.copy_from_slice(&c.to_argb().to_le_bytes()),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Color {
        match self {
            PixelDepth::Rgb565 => {
                let p = u16::from_le_bytes([bytes[0], bytes[1]]);
                let r5 = ((p >> 11) & 0x1F) as u8;
                let g6 = ((p >> 5) & 0x3F) as u8;
                let b5 = (p & 0x1F) as u8;
                Color::new((r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2))
            }
            PixelDepth::Rgb888 => Color::new(bytes[2], bytes[1], bytes[0]),
            PixelDepth::Argb8888 => {
                Color::from_argb(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }
}

/// Bytes spanned by `height` rows of `row_bytes`, `stride` apart
fn required_len(stride: usize, height: u32, row_bytes: usize) -> Option<usize> {
    stride.checked_mul(height as usize - 1)?.checked_add(row_bytes)
}

/// The destination pixel buffer of a frame
pub struct DrawRegion<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
    depth: PixelDepth,
}

impl<'a> DrawRegion<'a> {
    /// Wrap caller memory. `stride` is in bytes.
    pub fn new(
        pixels: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        depth: PixelDepth,
    ) -> Result<Self> {
        if width == 0 || height == 0 || pixels.is_empty() {
            return Err(RasterError::DrawRegionMissing);
        }
        let row_bytes = width as usize * depth.bytes_per_pixel();
        if stride < row_bytes {
            return Err(RasterError::DrawRegionWrongKind("stride shorter than a row"));
        }
        let needed = required_len(stride, height, row_bytes)
            .ok_or(RasterError::DrawRegionWrongKind("stride * height overflows"))?;
        if pixels.len() < needed {
            return Err(RasterError::DrawRegionWrongKind("buffer smaller than stride * height"));
        }
        Ok(Self { pixels, width, height, stride, depth })
    }

    /// Tightly packed region (stride = width * bytes per pixel)
    pub fn packed(pixels: &'a mut [u8], width: u32, height: u32, depth: PixelDepth) -> Result<Self> {
        let stride = width as usize * depth.bytes_per_pixel();
        Self::new(pixels, width, height, stride, depth)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn depth(&self) -> PixelDepth {
        self.depth
    }

    /// Byte offset of pixel (x, y), if it lies inside the region
    pub fn offset_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.stride + x as usize * self.depth.bytes_per_pixel())
    }

    pub fn bytes(&self) -> &[u8] {
        &*self.pixels
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.pixels
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        let off = self.offset_of(x, y)?;
        Some(self.depth.decode(&self.pixels[off..off + self.depth.bytes_per_pixel()]))
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(off) = self.offset_of(x, y) {
            let bpp = self.depth.bytes_per_pixel();
            self.depth.encode(color, &mut self.pixels[off..off + bpp]);
        }
    }

    pub fn clear(&mut self, color: Color) {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                self.set_pixel(x, y, color);
            }
        }
    }
}

/// 16-bit Z buffer (larger = farther)
pub struct DepthBuffer<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> DepthBuffer<'a> {
    pub const BYTES_PER_PIXEL: usize = 2;
    /// Clear value behind every drawable depth (those top out at 0x7FFF)
    pub const FAR: u16 = 0xFFFF;

    pub fn new(data: &'a mut [u8], width: u32, height: u32, stride: usize) -> Result<Self> {
        if width == 0 || height == 0 || data.is_empty() {
            return Err(RasterError::ZBufferMissing);
        }
        let row_bytes = width as usize * Self::BYTES_PER_PIXEL;
        match required_len(stride, height, row_bytes) {
            Some(needed) if stride >= row_bytes && data.len() >= needed => {}
            _ => return Err(RasterError::ZBufferMissing),
        }
        Ok(Self { data, width, height, stride })
    }

    pub fn packed(data: &'a mut [u8], width: u32, height: u32) -> Result<Self> {
        Self::new(data, width, height, width as usize * Self::BYTES_PER_PIXEL)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn offset_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.stride + x as usize * Self::BYTES_PER_PIXEL)
    }

    pub fn bytes(&self) -> &[u8] {
        &*self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    pub fn get(&self, x: i32, y: i32) -> Option<u16> {
        let off = self.offset_of(x, y)?;
        Some(u16::from_le_bytes([self.data[off], self.data[off + 1]]))
    }

    pub fn clear(&mut self, value: u16) {
        let bytes = value.to_le_bytes();
        for y in 0..self.height as usize {
            let row = &mut self.data[y * self.stride..y * self.stride + self.width as usize * 2];
            for px in row.chunks_exact_mut(2) {
                px.copy_from_slice(&bytes);
            }
        }
    }
}
