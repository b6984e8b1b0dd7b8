//! Memory-mapped run unit
//!
//! The register block is a run of 32-bit words. A run is issued by filling every
//! register, writing START, then polling STATUS until BUSY clears.

use std::ptr::NonNull;

use super::{Coprocessor, RunCommand, RunMemory};
use crate::rasterizer::PixelDepth;

/// Register word indices and bit layouts
pub mod regs {
    pub const DEST_ADDR: usize = 0x00;
    pub const DEPTH_ADDR: usize = 0x01;
    pub const TEX_ADDR: usize = 0x02;
    /// Bits 0-1: mip-size code
    pub const TEX_CTRL: usize = 0x03;
    pub const COUNT: usize = 0x04;
    pub const Z: usize = 0x05;
    pub const DZ: usize = 0x06;
    pub const U: usize = 0x07;
    pub const DU: usize = 0x08;
    pub const V: usize = 0x09;
    pub const DV: usize = 0x0A;
    pub const LIGHT: usize = 0x0B;
    pub const DLIGHT: usize = 0x0C;
    /// 0xAARRGGBB
    pub const COLOR: usize = 0x0D;
    /// Bits 0-2: `RunFlags`, bit 3: depth enable, bits 4-5: output format
    pub const CTRL: usize = 0x0E;
    pub const STATUS: usize = 0x0F;
    pub const START: usize = 0x10;

    pub const BLOCK_WORDS: usize = 0x11;

    pub const CTRL_DEPTH_ENABLE: u32 = 1 << 3;
    pub const CTRL_FORMAT_SHIFT: u32 = 4;
    pub const STATUS_BUSY: u32 = 1 << 0;
}

/// Handle to the hardware register block
pub struct MmioCoprocessor {
    regs: NonNull<u32>,
}

impl MmioCoprocessor {
    /// Wrap a mapped register block. Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `base` must point to at least [`regs::BLOCK_WORDS`] readable and writable
    /// 32-bit words that stay mapped for the lifetime of the returned value.
    pub unsafe fn new(base: *mut u32) -> Option<Self> {
        NonNull::new(base).map(|regs| Self { regs })
    }

    fn write(&mut self, reg: usize, value: u32) {
        debug_assert!(reg < regs::BLOCK_WORDS);
        // SAFETY: `new` guarantees BLOCK_WORDS mapped words
        unsafe { self.regs.as_ptr().add(reg).write_volatile(value) }
    }

    fn read(&self, reg: usize) -> u32 {
        debug_assert!(reg < regs::BLOCK_WORDS);
        // SAFETY: as above
        unsafe { self.regs.as_ptr().add(reg).read_volatile() }
    }
}

fn format_code(format: PixelDepth) -> u32 {
    match format {
        PixelDepth::Rgb565 => 0,
        PixelDepth::Rgb888 => 1,
        PixelDepth::Argb8888 => 2,
    }
}

/// Bus addresses are 32 bits wide
fn bus_address(base: *const u8, offset: usize) -> u32 {
    (base as usize).wrapping_add(offset) as u32
}

impl Coprocessor for MmioCoprocessor {
    fn run(&mut self, cmd: &RunCommand, mem: RunMemory<'_, '_>) {
        let dest = bus_address(mem.dest.bytes().as_ptr(), cmd.dest);
        let (depth, depth_enable) = match (&mem.depth, cmd.depth) {
            (Some(zbuf), Some(off)) => (bus_address(zbuf.bytes().as_ptr(), off), regs::CTRL_DEPTH_ENABLE),
            _ => (0, 0),
        };

        self.write(regs::DEST_ADDR, dest);
        self.write(regs::DEPTH_ADDR, depth);
        self.write(regs::TEX_ADDR, bus_address(mem.texture.blocks().as_ptr(), 0));
        self.write(regs::TEX_CTRL, mem.texture.mip().code());
        self.write(regs::COUNT, cmd.count);
        self.write(regs::Z, cmd.z as u32);
        self.write(regs::DZ, cmd.dz as u32);
        self.write(regs::U, cmd.u as u32);
        self.write(regs::DU, cmd.du as u32);
        self.write(regs::V, cmd.v as u32);
        self.write(regs::DV, cmd.dv as u32);
        self.write(regs::LIGHT, cmd.light as u32);
        self.write(regs::DLIGHT, cmd.dlight as u32);
        self.write(regs::COLOR, cmd.color.to_argb());
        self.write(
            regs::CTRL,
            cmd.flags.bits() | depth_enable | (format_code(cmd.format) << regs::CTRL_FORMAT_SHIFT),
        );
        self.write(regs::START, 1);

        while self.read(regs::STATUS) & regs::STATUS_BUSY != 0 {
            std::hint::spin_loop();
        }
    }

    fn is_hardware(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coprocessor::RunFlags;
    use crate::rasterizer::{Color, DepthBuffer, DrawRegion};
    use crate::texture::Texture;

    #[test]
    fn test_null_base_is_rejected() {
        assert!(unsafe { MmioCoprocessor::new(std::ptr::null_mut()) }.is_none());
    }

    #[test]
    fn test_register_encoding() {
        let tex = Texture::checkerboard();
        let mut px = vec![0u8; 16 * 4 * 2];
        let mut zb = vec![0u8; 16 * 2 * 2];
        let mut region = DrawRegion::packed(&mut px, 16, 2, PixelDepth::Argb8888).unwrap();
        let mut depth = DepthBuffer::packed(&mut zb, 16, 2).unwrap();

        let cmd = RunCommand {
            dest: 64 + 8,
            depth: Some(32 + 4),
            count: 5,
            format: PixelDepth::Argb8888,
            z: 0x0032_0000,
            dz: -0x8000,
            u: 0x0001_0000,
            du: 0x0000_4000,
            v: 0,
            dv: 0x0002_0000,
            light: 0x100,
            dlight: -2,
            color: Color::with_alpha(1, 2, 3, 4),
            flags: RunFlags::BILINEAR | RunFlags::BLEND,
        };

        // STATUS reads 0, so the busy poll returns immediately
        let mut block = vec![0u32; regs::BLOCK_WORDS];
        let mut cop = unsafe { MmioCoprocessor::new(block.as_mut_ptr()) }.unwrap();
        let dest_base = region.bytes().as_ptr();
        let depth_base = depth.bytes().as_ptr();
        cop.run(&cmd, RunMemory { dest: &mut region, depth: Some(&mut depth), texture: &tex });
        assert!(cop.is_hardware());
        drop(cop);

        assert_eq!(block[regs::DEST_ADDR], bus_address(dest_base, 72));
        assert_eq!(block[regs::DEPTH_ADDR], bus_address(depth_base, 36));
        assert_eq!(block[regs::TEX_CTRL], 0);
        assert_eq!(block[regs::COUNT], 5);
        assert_eq!(block[regs::Z], 0x0032_0000);
        assert_eq!(block[regs::DZ], (-0x8000i32) as u32);
        assert_eq!(block[regs::DU], 0x4000);
        assert_eq!(block[regs::DV], 0x0002_0000);
        assert_eq!(block[regs::DLIGHT], (-2i32) as u32);
        assert_eq!(block[regs::COLOR], 0x0401_0203);
        assert_eq!(block[regs::CTRL], 0b101 | regs::CTRL_DEPTH_ENABLE | (2 << regs::CTRL_FORMAT_SHIFT));
        assert_eq!(block[regs::START], 1);
    }

    #[test]
    fn test_depth_disabled_without_buffer() {
        let tex = Texture::checkerboard();
        let mut px = vec![0u8; 8 * 2];
        let mut region = DrawRegion::packed(&mut px, 8, 1, PixelDepth::Rgb565).unwrap();
        let cmd = RunCommand {
            dest: 0,
            depth: None,
            count: 8,
            format: PixelDepth::Rgb565,
            z: 0,
            dz: 0,
            u: 0,
            du: 0,
            v: 0,
            dv: 0,
            light: 0x100,
            dlight: 0,
            color: Color::WHITE,
            flags: RunFlags::empty(),
        };

        let mut block = vec![0u32; regs::BLOCK_WORDS];
        let mut cop = unsafe { MmioCoprocessor::new(block.as_mut_ptr()) }.unwrap();
        cop.run(&cmd, RunMemory { dest: &mut region, depth: None, texture: &tex });
        drop(cop);

        assert_eq!(block[regs::DEPTH_ADDR], 0);
        assert_eq!(block[regs::CTRL], 0);
    }
}
