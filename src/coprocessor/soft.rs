//! Software emulation of the run unit

use super::{Coprocessor, RunCommand, RunFlags, RunMemory};
use crate::rasterizer::{Color, DepthBuffer};
use crate::texture::dxt1::ALPHA_THRESHOLD;
use crate::texture::Texture;

#[derive(Debug, Default)]
pub struct SoftCoprocessor {
    runs: u64,
}

impl SoftCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs executed so far
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

fn lerp_channel(a: u8, b: u8, f: i32) -> i32 {
    (a as i32 * (256 - f) + b as i32 * f) >> 8
}

/// Texel at 16.16 coordinates
fn sample(texture: &Texture, u: i32, v: i32, bilinear: bool) -> [u8; 4] {
    if !bilinear {
        return texture.texel(u >> 16, v >> 16);
    }

    let u = u - 0x8000;
    let v = v - 0x8000;
    let (x0, y0) = (u >> 16, v >> 16);
    let fx = (u >> 8) & 0xFF;
    let fy = (v >> 8) & 0xFF;

    let t00 = texture.texel(x0, y0);
    let t10 = texture.texel(x0 + 1, y0);
    let t01 = texture.texel(x0, y0 + 1);
    let t11 = texture.texel(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = lerp_channel(t00[c], t10[c], fx);
        let bottom = lerp_channel(t01[c], t11[c], fx);
        out[c] = ((top * (256 - fy) + bottom * fy) >> 8) as u8;
    }
    out
}

/// Texel * color, then * light (8.8)
fn shade(texel: [u8; 4], color: Color, light: i32) -> Color {
    let light = light.max(0);
    let channel = |t: u8, c: u8| -> u8 {
        let modulated = (t as i32 * c as i32 + 127) / 255;
        ((modulated * light) >> 8).min(255) as u8
    };
    Color {
        r: channel(texel[0], color.r),
        g: channel(texel[1], color.g),
        b: channel(texel[2], color.b),
        a: ((texel[3] as i32 * color.a as i32 + 127) / 255) as u8,
    }
}

fn blend(src: Color, dst: Color, alpha: u8) -> Color {
    let a = alpha as i32;
    let mix = |s: u8, d: u8| ((s as i32 * a + d as i32 * (255 - a) + 127) / 255) as u8;
    Color { r: mix(src.r, dst.r), g: mix(src.g, dst.g), b: mix(src.b, dst.b), a: src.a }
}

/// Depth-buffer value of a 16.16 z. The integer part of an `i32` 16.16
/// value is at most 0x7FFF, so drawn depths never reach `DepthBuffer::FAR`.
fn depth_of(z: i32) -> u16 {
    (z >> 16).clamp(0, 0x7FFF) as u16
}

impl Coprocessor for SoftCoprocessor {
    fn run(&mut self, cmd: &RunCommand, mem: RunMemory<'_, '_>) {
        let RunMemory { dest, mut depth, texture } = mem;
        let bpp = cmd.format.bytes_per_pixel();
        let bilinear = cmd.flags.contains(RunFlags::BILINEAR);
        let z_write = !cmd.flags.contains(RunFlags::ZWRITE_INHIBIT);

        let (mut z, mut u, mut v, mut light) = (cmd.z, cmd.u, cmd.v, cmd.light);
        for i in 0..cmd.count as usize {
            let texel = sample(texture, u, v, bilinear);
            if texel[3] >= ALPHA_THRESHOLD {
                let passed = match (depth.as_deref_mut(), cmd.depth) {
                    (Some(zbuf), Some(base)) => depth_test(zbuf, base + i * DepthBuffer::BYTES_PER_PIXEL, depth_of(z), z_write),
                    _ => true,
                };
                if passed {
                    let off = cmd.dest + i * bpp;
                    if let Some(px) = dest.bytes_mut().get_mut(off..off + bpp) {
                        let mut color = shade(texel, cmd.color, light);
                        if cmd.flags.contains(RunFlags::BLEND) {
                            color = blend(color, cmd.format.decode(px), cmd.color.a);
                        }
                        cmd.format.encode(color, px);
                    }
                }
            }
            z = z.wrapping_add(cmd.dz);
            u = u.wrapping_add(cmd.du);
            v = v.wrapping_add(cmd.dv);
            light = light.wrapping_add(cmd.dlight);
        }
        self.runs += 1;
    }

    fn is_hardware(&self) -> bool {
        false
    }
}

/// `new > existing` fails; otherwise passes and (optionally) stores `new`
fn depth_test(zbuf: &mut DepthBuffer<'_>, off: usize, new: u16, write: bool) -> bool {
    let Some(slot) = zbuf.bytes_mut().get_mut(off..off + 2) else {
        return false;
    };
    let existing = u16::from_le_bytes([slot[0], slot[1]]);
    if new > existing {
        return false;
    }
    if write {
        slot.copy_from_slice(&new.to_le_bytes());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{to_fixed16, DrawRegion, PixelDepth};
    use crate::texture::{FilterMode, SourceImage, SourcePixels};

    fn texture_rgba(edge: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Texture {
        let mut px = Vec::new();
        for y in 0..edge {
            for x in 0..edge {
                px.extend_from_slice(&f(x, y));
            }
        }
        let image = SourceImage { width: edge, height: edge, pixels: SourcePixels::Rgba32(px) };
        Texture::from_source(&image, FilterMode::Nearest).unwrap()
    }

    fn command(count: u32, z: i32) -> RunCommand {
        RunCommand {
            dest: 0,
            depth: Some(0),
            count,
            format: PixelDepth::Argb8888,
            z: z << 16,
            dz: 0,
            u: 0,
            du: 0,
            v: 0,
            dv: 0,
            light: 0x100,
            dlight: 0,
            color: Color::WHITE,
            flags: RunFlags::empty(),
        }
    }

    #[test]
    fn test_depth_test_semantics() {
        let tex = Texture::checkerboard();
        let mut px = vec![0u8; 8 * 4];
        let mut zb = vec![0u8; 8 * 2];
        let mut region = DrawRegion::packed(&mut px, 8, 1, PixelDepth::Argb8888).unwrap();
        let mut depth = DepthBuffer::packed(&mut zb, 8, 1).unwrap();
        depth.clear(100);

        let mut cop = SoftCoprocessor::new();
        // Farther than existing: nothing written
        cop.run(&command(8, 101), RunMemory { dest: &mut region, depth: Some(&mut depth), texture: &tex });
        assert_eq!(region.get_pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(depth.get(0, 0), Some(100));

        // Equal depth passes
        cop.run(&command(4, 100), RunMemory { dest: &mut region, depth: Some(&mut depth), texture: &tex });
        assert_eq!(region.get_pixel(3, 0), Some(Color::WHITE));
        assert_eq!(region.get_pixel(4, 0), Some(Color::TRANSPARENT));

        // Nearer passes and updates, unless writes are inhibited
        let mut cmd = command(8, 50);
        cmd.flags = RunFlags::ZWRITE_INHIBIT;
        cop.run(&cmd, RunMemory { dest: &mut region, depth: Some(&mut depth), texture: &tex });
        assert_eq!(region.get_pixel(7, 0), Some(Color::WHITE));
        assert_eq!(depth.get(7, 0), Some(100));

        cop.run(&command(8, 50), RunMemory { dest: &mut region, depth: Some(&mut depth), texture: &tex });
        assert_eq!(depth.get(7, 0), Some(50));
        assert_eq!(cop.runs(), 4);
    }

    #[test]
    fn test_far_z_saturates_below_clear_value() {
        assert_eq!(depth_of(to_fixed16(1000.0)), 1000);
        assert_eq!(depth_of(to_fixed16(40000.0)), 0x7FFF);
        assert_eq!(depth_of(to_fixed16(-5.0)), 0);

        // A run far beyond the z range still passes against a cleared buffer
        let tex = Texture::checkerboard();
        let mut px = vec![0u8; 4 * 4];
        let mut zb = vec![0u8; 4 * 2];
        let mut region = DrawRegion::packed(&mut px, 4, 1, PixelDepth::Argb8888).unwrap();
        let mut depth = DepthBuffer::packed(&mut zb, 4, 1).unwrap();
        depth.clear(DepthBuffer::FAR);
        let mut cmd = command(4, 0);
        cmd.z = to_fixed16(1.0e6);
        SoftCoprocessor::new().run(&cmd, RunMemory { dest: &mut region, depth: Some(&mut depth), texture: &tex });
        assert_eq!(region.get_pixel(3, 0), Some(Color::WHITE));
        assert_eq!(depth.get(3, 0), Some(0x7FFF));
    }

    #[test]
    fn test_transparent_texels_are_skipped() {
        let tex = texture_rgba(64, |x, _| if x < 4 { [255, 0, 0, 0] } else { [0, 255, 0, 255] });
        let mut px = vec![0u8; 8 * 4];
        let mut region = DrawRegion::packed(&mut px, 8, 1, PixelDepth::Argb8888).unwrap();

        let mut cmd = command(8, 0);
        cmd.depth = None;
        cmd.du = 1 << 16;
        SoftCoprocessor::new().run(&cmd, RunMemory { dest: &mut region, depth: None, texture: &tex });

        assert_eq!(region.get_pixel(3, 0), Some(Color::TRANSPARENT));
        let green = region.get_pixel(4, 0).unwrap();
        assert!(green.g > 250 && green.r < 5);
    }

    #[test]
    fn test_color_and_light_modulation() {
        let tex = Texture::checkerboard();
        let mut px = vec![0u8; 4 * 3];
        let mut region = DrawRegion::packed(&mut px, 4, 1, PixelDepth::Rgb888).unwrap();

        let mut cmd = command(4, 0);
        cmd.format = PixelDepth::Rgb888;
        cmd.depth = None;
        cmd.color = Color::new(200, 100, 50);
        cmd.light = 0x80;
        cmd.dlight = 0x40;
        SoftCoprocessor::new().run(&cmd, RunMemory { dest: &mut region, depth: None, texture: &tex });

        assert_eq!(region.get_pixel(0, 0), Some(Color::new(100, 50, 25)));
        assert_eq!(region.get_pixel(2, 0), Some(Color::new(200, 100, 50)));
        // Light above 1.0 saturates
        assert_eq!(region.get_pixel(3, 0), Some(Color::new(250, 125, 62)));
    }

    #[test]
    fn test_blend_uses_color_alpha() {
        let tex = Texture::checkerboard();
        let mut px = vec![0u8; 4 * 4];
        let mut region = DrawRegion::packed(&mut px, 4, 1, PixelDepth::Argb8888).unwrap();
        region.clear(Color::BLACK);

        let mut cmd = command(1, 0);
        cmd.depth = None;
        cmd.color = Color::with_alpha(255, 255, 255, 128);
        cmd.flags = RunFlags::BLEND;
        SoftCoprocessor::new().run(&cmd, RunMemory { dest: &mut region, depth: None, texture: &tex });

        let c = region.get_pixel(0, 0).unwrap();
        assert_eq!((c.r, c.g, c.b), (128, 128, 128));
    }

    #[test]
    fn test_bilinear_between_texels() {
        let tex = texture_rgba(64, |x, _| if x % 2 == 0 { [0, 0, 0, 255] } else { [252, 252, 252, 255] });
        // Halfway between texel 0 and texel 1 centers
        let mid = sample(&tex, 1 << 16, 0x8000, true);
        assert!((mid[0] as i32 - 126).abs() <= 2, "{:?}", mid);
        let center = sample(&tex, 0x18000, 0x8000, true);
        assert!(center[0] > 245);
        assert_eq!(sample(&tex, 0x18000, 0, false)[0], center[0]);
    }
}
