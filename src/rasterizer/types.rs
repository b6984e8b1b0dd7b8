//! Core types for the rasterizer

use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};
use crate::texture::TextureHandle;

/// Minimum scissor width the span unit accepts
pub const MIN_SCISSOR_WIDTH: u32 = 8;

/// RGBA color (0-255 per channel), packed as ARGB on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(b: [u8; 4]) -> Self {
        Self { r: b[0], g: b[1], b: b[2], a: b[3] }
    }
}

/// A screen-space vertex (already projected; this crate does not project)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    /// Depth, larger is farther. Runs carry z as 16.16 in an `i32`, so the
    /// usable range is 0..32768; values beyond it saturate to 0x7FFF.
    pub z: f32,
    #[serde(default = "one")]
    pub w: f32,
    #[serde(default)]
    pub u: f32,
    #[serde(default)]
    pub v: f32,
    #[serde(default = "one")]
    pub light: f32,
}

fn one() -> f32 {
    1.0
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0, u: 0.0, v: 0.0, light: 1.0 }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.u = u;
        self.v = v;
        self
    }

    pub fn with_light(mut self, light: f32) -> Self {
        self.light = light;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub verts: [Vertex; 3],
    pub texture: Option<TextureHandle>,
    pub color: Color,
}

impl Triangle {
    pub fn new(v1: Vertex, v2: Vertex, v3: Vertex) -> Self {
        Self { verts: [v1, v2, v3], texture: None, color: Color::WHITE }
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Four vertices in perimeter order (either winding)
#[derive(Debug, Clone, Copy)]
pub struct Quad {
    pub verts: [Vertex; 4],
    pub texture: Option<TextureHandle>,
    pub color: Color,
}

impl Quad {
    pub fn new(v1: Vertex, v2: Vertex, v3: Vertex, v4: Vertex) -> Self {
        Self { verts: [v1, v2, v3, v4], texture: None, color: Color::WHITE }
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Active clip rectangle, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scissor {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Scissor {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Result<Self> {
        let scissor = Self { left, top, width, height };
        scissor.validate()?;
        Ok(scissor)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < MIN_SCISSOR_WIDTH {
            return Err(RasterError::InvalidScissor("width below 8 pixels"));
        }
        if self.height == 0 {
            return Err(RasterError::InvalidScissor("zero height"));
        }
        Ok(())
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    /// Intersect with a `width` x `height` region anchored at the origin
    pub fn clamp_to(&self, width: u32, height: u32) -> Scissor {
        let left = self.left.clamp(0, width as i32);
        let top = self.top.clamp(0, height as i32);
        let right = self.right().clamp(left, width as i32);
        let bottom = self.bottom().clamp(top, height as i32);
        Scissor {
            left,
            top,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }
}

/// Shading mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    /// One light value taken from the top vertex
    #[default]
    Flat,
    /// Light interpolated across the primitive
    Smooth,
}

/// Render state flags, settable per context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderState {
    /// Sample the primitive's texture (otherwise solid color)
    pub texturing: bool,
    /// Allow bilinear filtering on textures that ask for it
    pub filtering: bool,
    pub shading: ShadingMode,
    pub zbuffer: bool,
    /// Depth-test but never update the depth buffer
    pub zwrite_inhibit: bool,
    /// Blend with the destination using the primitive color's alpha
    pub blending: bool,
    /// Texture coordinates are in [0,1] instead of texels
    pub normalized_uv: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            texturing: true,
            filtering: false,
            shading: ShadingMode::Flat,
            zbuffer: true,
            zwrite_inhibit: false,
            blending: false,
            normalized_uv: true,
        }
    }
}

/// Source rectangle in texel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrcRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl SrcRect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// A rectangular sprite drawn from a texture region
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub texture: TextureHandle,
    pub src: SrcRect,
    pub x: f32,
    pub y: f32,
    pub zoom_x: f32,
    pub zoom_y: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Rotation about the sprite center, radians
    pub angle: f32,
    pub color: Color,
}

impl Sprite {
    pub fn new(texture: TextureHandle, src: SrcRect, x: f32, y: f32) -> Self {
        Self {
            texture,
            src,
            x,
            y,
            zoom_x: 1.0,
            zoom_y: 1.0,
            flip_x: false,
            flip_y: false,
            angle: 0.0,
            color: Color::WHITE,
        }
    }

    pub fn dest_width(&self) -> f32 {
        self.src.w * self.zoom_x
    }

    pub fn dest_height(&self) -> f32 {
        self.src.h * self.zoom_y
    }
}
