//! Span rasterizer with a coprocessor backend
//!
//! Screen-space triangles, quads and sprites are broken into horizontal runs and
//! handed to a run unit, either the memory-mapped hardware block or its software
//! emulation. Textures live in the unit's native DXT1 format.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod coprocessor;
pub mod error;
pub mod rasterizer;
pub mod texture;

pub use config::ContextConfig;
pub use error::{status_of, RasterError, Result, STATUS_OK};
pub use rasterizer::{
    BatchStats, Color, DepthBuffer, DrawRegion, DrawStats, Frame, Outcome, PixelDepth, Quad,
    RenderContext, RenderState, Scissor, ShadingMode, Sprite, SrcRect, Triangle, Vertex,
};
pub use texture::{FilterMode, SourceImage, TextureHandle};
