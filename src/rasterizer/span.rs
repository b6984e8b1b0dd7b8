//! Span setup: one scanline between two edges becomes one `RunCommand`

use crate::coprocessor::{RunCommand, RunFlags};
use super::math::{line_of, to_fixed16, to_fixed8, Attrs};
use super::surface::{DepthBuffer, DrawRegion};
use super::types::{Color, Scissor};

/// Per-primitive values shared by every span
#[derive(Debug, Clone, Copy)]
pub struct SpanSetup {
    pub scissor: Scissor,
    pub color: Color,
    pub flags: RunFlags,
    pub depth: bool,
}

/// Build the run for scanline `y`, or `None` if nothing of it is visible.
///
/// The step is the gradient along the scanline through both edge points, and
/// the start is that line evaluated at the first drawn column. Every span of
/// a plane therefore samples the same function, whether it was clipped or
/// split across primitives.
pub fn setup_span(
    y: i32,
    left: &Attrs,
    right: &Attrs,
    setup: &SpanSetup,
    region: &DrawRegion<'_>,
    depth: Option<&DepthBuffer<'_>>,
) -> Option<RunCommand> {
    let scissor = &setup.scissor;
    if y < scissor.top || y >= scissor.bottom() {
        return None;
    }

    let (clip_left, clip_right) = (i64::from(scissor.left), i64::from(scissor.right()));
    let xs = line_of(left.x);
    let xe = line_of(right.x);
    if xe <= xs || xe <= clip_left || xs >= clip_right {
        return None;
    }

    // Both now lie within the scissor
    let xs = xs.max(clip_left) as i32;
    let xe = xe.min(clip_right) as i32;

    let step = left.gradient_x(*right);
    let start = *left + step * (xs as f32 - left.x);

    let dest = region.offset_of(xs, y)?;
    let depth = match (setup.depth, depth) {
        (true, Some(zbuf)) => Some(zbuf.offset_of(xs, y)?),
        _ => None,
    };

    Some(RunCommand {
        dest,
        depth,
        count: (xe - xs) as u32,
        format: region.depth(),
        z: to_fixed16(start.z),
        dz: to_fixed16(step.z),
        u: to_fixed16(start.u),
        du: to_fixed16(step.u),
        v: to_fixed16(start.v),
        dv: to_fixed16(step.v),
        light: to_fixed8(start.light),
        dlight: to_fixed8(step.light),
        color: setup.color,
        flags: setup.flags,
    })
}
