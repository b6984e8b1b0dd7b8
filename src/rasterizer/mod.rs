//! Span rasterizer
//!
//! Triangles, quads and sprites are snapped to a 1/16 subpixel grid, classified,
//! split into left/right edges and walked one scanline at a time. Every visible
//! scanline becomes a single run for the coprocessor.
//!
//! Features:
//! - Affine texture mapping from DXT1 textures
//! - Flat and smooth (Gouraud) light
//! - 16-bit Z test with optional write inhibit
//! - Scissor clipping without changing texture or light steps

mod classify;
mod edges;
mod math;
mod render;
mod span;
mod sprite;
mod surface;
mod types;

pub use classify::*;
pub use edges::*;
pub use math::*;
pub use render::*;
pub use span::*;
pub use sprite::*;
pub use surface::*;
pub use types::*;
