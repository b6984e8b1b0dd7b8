//! Scanline run unit
//!
//! One `RunCommand` describes a horizontal run of texels: where it lands in the
//! draw region and depth buffer, and the 16.16 / 8.8 start and step values for
//! z, u, v and light. Two backends execute it identically: the memory-mapped
//! hardware block and a software emulation.

mod mmio;
mod soft;

pub use mmio::{regs, MmioCoprocessor};
pub use soft::SoftCoprocessor;

use bitflags::bitflags;

use crate::rasterizer::{Color, DepthBuffer, DrawRegion, PixelDepth};
use crate::texture::Texture;

bitflags! {
    /// Per-run control bits (low bits of the CTRL register)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RunFlags: u32 {
        const BILINEAR = 1 << 0;
        const ZWRITE_INHIBIT = 1 << 1;
        const BLEND = 1 << 2;
    }
}

/// A single run, ready to be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCommand {
    /// Byte offset of the first pixel in the draw region
    pub dest: usize,
    /// Byte offset of the first depth value, `None` disables Z entirely
    pub depth: Option<usize>,
    pub count: u32,
    pub format: PixelDepth,
    pub z: i32,
    pub dz: i32,
    pub u: i32,
    pub du: i32,
    pub v: i32,
    pub dv: i32,
    /// 8.8 fixed point
    pub light: i32,
    pub dlight: i32,
    pub color: Color,
    pub flags: RunFlags,
}

/// Memory a run reads and writes
pub struct RunMemory<'r, 'a> {
    pub dest: &'r mut DrawRegion<'a>,
    pub depth: Option<&'r mut DepthBuffer<'a>>,
    pub texture: &'r Texture,
}

/// Executes runs synchronously: when `run` returns, every pixel is written
pub trait Coprocessor {
    fn run(&mut self, cmd: &RunCommand, mem: RunMemory<'_, '_>);

    /// True for the memory-mapped unit
    fn is_hardware(&self) -> bool;
}
