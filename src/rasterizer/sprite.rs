//! Sprite setup
//!
//! Unrotated sprites are row blits: one run per destination row with a constant
//! texel step. Rotated sprites become a textured quad.

use crate::coprocessor::{RunCommand, RunFlags};
use crate::error::{RasterError, Result};
use super::math::{line_of, to_fixed16, Vec2, LIGHT_ONE};
use super::surface::DrawRegion;
use super::types::{Color, Scissor, Sprite, Vertex};

/// A clipped, axis-aligned sprite in destination pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBlit {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Texel coordinates sampled by the first pixel of the first row
    pub u: f32,
    pub v: f32,
    /// Texel step per destination pixel (negative when flipped)
    pub du: f32,
    pub dv: f32,
}

fn check_size(sprite: &Sprite) -> Result<(f32, f32)> {
    let (w, h) = (sprite.dest_width(), sprite.dest_height());
    if !(w > 0.0 && h > 0.0) {
        return Err(RasterError::DegeneratePrimitive);
    }
    Ok((w, h))
}

/// Texture start and step along one axis, sampling at pixel centers
fn axis(origin: f32, len: f32, dest_len: f32, flip: bool) -> (f32, f32) {
    let step = len / dest_len;
    if flip {
        (origin + len - step * 0.5, -step)
    } else {
        (origin + step * 0.5, step)
    }
}

impl RowBlit {
    /// Clip an unrotated sprite against the scissor. `Ok(None)` if nothing remains.
    pub fn plan(sprite: &Sprite, scissor: &Scissor) -> Result<Option<Self>> {
        let (w, h) = check_size(sprite)?;

        let (left, top) = (i64::from(scissor.left), i64::from(scissor.top));
        let mut x = line_of(sprite.x);
        let mut y = line_of(sprite.y);
        let x_end = line_of(sprite.x + w).min(i64::from(scissor.right()));
        let y_end = line_of(sprite.y + h).min(i64::from(scissor.bottom()));

        let (mut u, du) = axis(sprite.src.x, sprite.src.w, w, sprite.flip_x);
        let (mut v, dv) = axis(sprite.src.y, sprite.src.h, h, sprite.flip_y);

        if x < left {
            u += du * (left - x) as f32;
            x = left;
        }
        if y < top {
            v += dv * (top - y) as f32;
            y = top;
        }

        if x_end <= x || y_end <= y {
            return Ok(None);
        }
        // Clipped to the scissor, so everything fits an i32
        Ok(Some(Self {
            x: x as i32,
            y: y as i32,
            width: (x_end - x) as i32,
            height: (y_end - y) as i32,
            u,
            v,
            du,
            dv,
        }))
    }

    /// Run for destination row `row` (0-based within the clipped blit)
    pub fn row(&self, row: i32, region: &DrawRegion<'_>, color: Color, flags: RunFlags) -> Option<RunCommand> {
        let dest = region.offset_of(self.x, self.y + row)?;
        Some(RunCommand {
            dest,
            depth: None,
            count: self.width as u32,
            format: region.depth(),
            z: 0,
            dz: 0,
            u: to_fixed16(self.u),
            du: to_fixed16(self.du),
            v: to_fixed16(self.v + self.dv * row as f32),
            dv: 0,
            light: LIGHT_ONE,
            dlight: 0,
            color,
            flags,
        })
    }
}

/// Corners of a rotated sprite, clockwise from the top-left before rotation,
/// with texel coordinates and full light
pub fn rotated_corners(sprite: &Sprite) -> Result<[Vertex; 4]> {
    let (w, h) = check_size(sprite)?;
    let src = &sprite.src;

    let (u0, u1) = if sprite.flip_x { (src.x + src.w, src.x) } else { (src.x, src.x + src.w) };
    let (v0, v1) = if sprite.flip_y { (src.y + src.h, src.y) } else { (src.y, src.y + src.h) };

    let center = Vec2::new(sprite.x + w * 0.5, sprite.y + h * 0.5);
    let corners = [
        (Vec2::new(sprite.x, sprite.y), u0, v0),
        (Vec2::new(sprite.x + w, sprite.y), u1, v0),
        (Vec2::new(sprite.x + w, sprite.y + h), u1, v1),
        (Vec2::new(sprite.x, sprite.y + h), u0, v1),
    ];
    Ok(corners.map(|(p, u, v)| {
        let p = p.rotate_about(center, sprite.angle);
        Vertex::new(p.x, p.y, 0.0).with_uv(u, v)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{PixelDepth, SrcRect};
    use crate::texture::TextureHandle;

    fn sprite(x: f32, y: f32) -> Sprite {
        Sprite::new(TextureHandle::default(), SrcRect::new(0.0, 0.0, 16.0, 8.0), x, y)
    }

    fn screen() -> Scissor {
        Scissor { left: 0, top: 0, width: 320, height: 240 }
    }

    #[test]
    fn test_plain_blit() {
        let blit = RowBlit::plan(&sprite(10.0, 20.0), &screen()).unwrap().unwrap();
        assert_eq!((blit.x, blit.y, blit.width, blit.height), (10, 20, 16, 8));
        assert_eq!((blit.u, blit.du), (0.5, 1.0));
    }

    #[test]
    fn test_zoom_and_flip() {
        let mut s = sprite(0.0, 0.0);
        s.zoom_x = 2.0;
        s.flip_x = true;
        let blit = RowBlit::plan(&s, &screen()).unwrap().unwrap();
        assert_eq!(blit.width, 32);
        assert_eq!(blit.du, -0.5);
        assert_eq!(blit.u, 15.75);
        // Last pixel samples the first texel column
        assert!((blit.u + blit.du * 31.0 - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_clip_advances_texture_start() {
        let s = sprite(-4.0, -2.0);
        let blit = RowBlit::plan(&s, &screen()).unwrap().unwrap();
        assert_eq!((blit.x, blit.y, blit.width, blit.height), (0, 0, 12, 6));
        assert_eq!((blit.u, blit.v), (4.5, 2.5));

        let mut flipped = s;
        flipped.flip_y = true;
        let blit = RowBlit::plan(&flipped, &screen()).unwrap().unwrap();
        assert_eq!(blit.v, 7.5 - 2.0);
    }

    #[test]
    fn test_far_origin_clips_without_overflow() {
        let mut s = sprite(-3.0e9, 0.0);
        s.zoom_x = 1.0e9;
        let blit = RowBlit::plan(&s, &screen()).unwrap().unwrap();
        assert_eq!((blit.x, blit.width), (0, 320));
        assert!((blit.u - 3.0).abs() < 0.01);

        assert_eq!(RowBlit::plan(&sprite(3.0e9, -3.0e9), &screen()).unwrap(), None);
    }

    #[test]
    fn test_offscreen_and_degenerate() {
        assert_eq!(RowBlit::plan(&sprite(400.0, 0.0), &screen()).unwrap(), None);
        assert_eq!(RowBlit::plan(&sprite(-16.0, 0.0), &screen()).unwrap(), None);

        let mut flat = sprite(0.0, 0.0);
        flat.zoom_y = 0.0;
        assert!(matches!(RowBlit::plan(&flat, &screen()), Err(RasterError::DegeneratePrimitive)));
        assert!(rotated_corners(&flat).is_err());
    }

    #[test]
    fn test_row_command() {
        let mut px = vec![0u8; 320 * 240 * 2];
        let region = DrawRegion::packed(&mut px, 320, 240, PixelDepth::Rgb565).unwrap();
        let blit = RowBlit::plan(&sprite(10.0, 20.0), &screen()).unwrap().unwrap();
        let cmd = blit.row(3, &region, Color::WHITE, RunFlags::empty()).unwrap();
        assert_eq!(cmd.dest, (23 * 320 + 10) * 2);
        assert_eq!(cmd.count, 16);
        assert_eq!(cmd.v, to_fixed16(3.5));
        assert_eq!(cmd.depth, None);
        assert_eq!(cmd.light, LIGHT_ONE);
    }

    #[test]
    fn test_rotated_corners_half_turn() {
        let mut s = sprite(0.0, 0.0);
        s.angle = std::f32::consts::PI;
        let c = rotated_corners(&s).unwrap();
        // Top-left corner lands on the bottom-right, keeping its texel
        assert!((c[0].x - 16.0).abs() < 1e-4 && (c[0].y - 8.0).abs() < 1e-4);
        assert_eq!((c[0].u, c[0].v), (0.0, 0.0));
        assert_eq!((c[2].u, c[2].v), (16.0, 8.0));
        assert!(c.iter().all(|v| v.light == 1.0 && v.z == 0.0));
    }
}
