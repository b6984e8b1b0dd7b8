//! Textures in the coprocessor's native DXT1 form
//!
//! Textures are square, power-of-two, and owned by a generation-checked arena
//! inside the render context.

pub mod dxt1;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};
use dxt1::SourceFormat;

/// Edge length as the coprocessor's size code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipSize {
    S64 = 0,
    S128 = 1,
    S256 = 2,
    S512 = 3,
}

impl MipSize {
    pub fn from_edge(edge: u32) -> Option<Self> {
        match edge {
            64 => Some(MipSize::S64),
            128 => Some(MipSize::S128),
            256 => Some(MipSize::S256),
            512 => Some(MipSize::S512),
            _ => None,
        }
    }

    pub fn edge(self) -> u32 {
        64 << self as u32
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    Nearest,
    Bilinear,
}

/// Decoded pixels or ready blocks, as handed over by the loader
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePixels {
    Rgb24(Vec<u8>),
    Rgba32(Vec<u8>),
    Dxt1(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub pixels: SourcePixels,
}

/// A texture stored as coprocessor-order DXT1 blocks
#[derive(Debug, Clone)]
pub struct Texture {
    blocks: Vec<u8>,
    mip: MipSize,
    pub filter: FilterMode,
    pub name: String,
}

impl Texture {
    /// Build from a source image, compressing if needed
    pub fn from_source(image: &SourceImage, filter: FilterMode) -> Result<Self> {
        let size_error = RasterError::TextureSize { width: image.width, height: image.height };
        if image.width != image.height {
            return Err(size_error);
        }
        let mip = MipSize::from_edge(image.width).ok_or(size_error)?;

        let blocks = match &image.pixels {
            SourcePixels::Rgb24(px) => dxt1::compress(px, image.width, image.height, SourceFormat::Rgb24)?,
            SourcePixels::Rgba32(px) => dxt1::compress(px, image.width, image.height, SourceFormat::Rgba32)?,
            SourcePixels::Dxt1(raw) => {
                let size = dxt1::compressed_size(image.width, image.height);
                if raw.len() < size {
                    return Err(RasterError::TextureFormat("DXT1 data shorter than image".into()));
                }
                let mut blocks = Vec::new();
                blocks.try_reserve_exact(size)?;
                blocks.extend_from_slice(&raw[..size]);
                blocks
            }
        };

        Ok(Self { blocks, mip, filter, name: String::new() })
    }

    /// The fixed 64x64 checkerboard used for untextured primitives.
    /// Texel (0, 0) is white so constant-coordinate sampling yields the raw color.
    pub fn checkerboard() -> Self {
        const EDGE: u32 = 64;
        let mut pixels = Vec::with_capacity((EDGE * EDGE * 3) as usize);
        for y in 0..EDGE {
            for x in 0..EDGE {
                let checker = ((x / 8) + (y / 8)) % 2 == 0;
                let v = if checker { 255 } else { 192 };
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        let blocks = dxt1::compress(&pixels, EDGE, EDGE, SourceFormat::Rgb24).unwrap_or_default();
        Self { blocks, mip: MipSize::S64, filter: FilterMode::Nearest, name: "checkerboard".to_string() }
    }

    pub fn size(&self) -> u32 {
        self.mip.edge()
    }

    pub fn mip(&self) -> MipSize {
        self.mip
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    /// Texel at wrapped integer coordinates, RGBA
    pub fn texel(&self, x: i32, y: i32) -> [u8; 4] {
        let mask = self.size() as i32 - 1;
        dxt1::decode_texel(&self.blocks, self.size(), (x & mask) as u32, (y & mask) as u32)
    }

    /// Decompress the whole texture to RGBA32
    pub fn to_rgba(&self) -> Result<Vec<u8>> {
        dxt1::decompress(&self.blocks, self.size(), self.size())
    }
}

/// Stable reference to a texture in a context's arena
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    texture: Option<Texture>,
}

/// Generation-checked texture storage with O(1) insert and remove
pub struct TextureArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    limit: usize,
}

impl TextureArena {
    pub fn new(limit: usize) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), live: 0, limit }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn insert(&mut self, texture: Texture) -> Result<TextureHandle> {
        if self.live >= self.limit {
            return Err(RasterError::TextureLimitReached(self.limit));
        }
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].texture = Some(texture);
                index
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Slot { generation: 0, texture: Some(texture) });
                (self.slots.len() - 1) as u32
            }
        };
        self.live += 1;
        Ok(TextureHandle { index, generation: self.slots[index as usize].generation })
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.texture.as_ref()
    }

    pub fn remove(&mut self, handle: TextureHandle) -> Option<Texture> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let texture = slot.texture.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(edge: u32, rgb: [u8; 3]) -> SourceImage {
        let mut px = Vec::new();
        for _ in 0..edge * edge {
            px.extend_from_slice(&rgb);
        }
        SourceImage { width: edge, height: edge, pixels: SourcePixels::Rgb24(px) }
    }

    #[test]
    fn test_mip_codes() {
        assert_eq!(MipSize::from_edge(64).map(MipSize::code), Some(0));
        assert_eq!(MipSize::from_edge(512).map(MipSize::code), Some(3));
        assert_eq!(MipSize::S256.edge(), 256);
        assert_eq!(MipSize::from_edge(32), None);
    }

    #[test]
    fn test_texture_size_rules() {
        assert!(Texture::from_source(&solid_image(128, [1, 2, 3]), FilterMode::Nearest).is_ok());

        let non_square = SourceImage { width: 64, height: 128, pixels: SourcePixels::Rgb24(vec![0; 64 * 128 * 3]) };
        assert!(matches!(
            Texture::from_source(&non_square, FilterMode::Nearest),
            Err(RasterError::TextureSize { width: 64, height: 128 })
        ));
        assert!(matches!(
            Texture::from_source(&solid_image(32, [0, 0, 0]), FilterMode::Nearest),
            Err(RasterError::TextureSize { .. })
        ));
    }

    #[test]
    fn test_checkerboard_origin_is_white() {
        let tex = Texture::checkerboard();
        assert_eq!(tex.size(), 64);
        assert_eq!(tex.texel(0, 0), [255, 255, 255, 255]);
        assert_eq!(tex.texel(64, -64), [255, 255, 255, 255]);
        let grey = tex.texel(8, 0);
        assert!(grey[0] < 255 && grey[0] > 180);
    }

    #[test]
    fn test_arena_generations() {
        let mut arena = TextureArena::new(2);
        let a = arena.insert(Texture::checkerboard()).unwrap();
        let b = arena.insert(Texture::checkerboard()).unwrap();
        assert!(matches!(
            arena.insert(Texture::checkerboard()),
            Err(RasterError::TextureLimitReached(2))
        ));

        assert!(arena.remove(a).is_some());
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());

        // Slot is reused, but the stale handle stays dead
        let c = arena.insert(Texture::checkerboard()).unwrap();
        assert_ne!(a, c);
        assert!(arena.get(a).is_none());
        assert!(arena.get(c).is_some());
        assert!(arena.get(b).is_some());
        assert_eq!(arena.len(), 2);
    }
}
