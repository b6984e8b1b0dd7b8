//! Screen-space math for the span pipeline
//! Subpixel snapping, scanline rounding, fixed-point conversion and the
//! interpolant bundle carried along every edge

use std::ops::{Add, AddAssign, Mul, Sub};

/// Subpixel grid: vertex x/y are snapped to 1/16 pixel
pub const SUBPIXEL_STEPS: f32 = 16.0;

/// One in 16.16 fixed point
pub const FIXED_ONE: i32 = 1 << 16;

/// One in 8.8 fixed point (full light)
pub const LIGHT_ONE: i32 = 1 << 8;

/// Snap a coordinate to the subpixel grid
pub fn snap(v: f32) -> f32 {
    (v * SUBPIXEL_STEPS).round() / SUBPIXEL_STEPS
}

/// Lines and columns further out than this are clamped; differences of two
/// clamped lines still fit an `i64`
pub const LINE_LIMIT: f32 = 1.0e12;

/// Integer scanline (or column) a snapped coordinate belongs to.
/// Rounds half up so both edges of a shared boundary land on the same pixel.
pub fn line_of(v: f32) -> i64 {
    (v + 0.5).floor().clamp(-LINE_LIMIT, LINE_LIMIT) as i64
}

/// Convert to 16.16 fixed point (saturating)
pub fn to_fixed16(v: f32) -> i32 {
    (v * FIXED_ONE as f32) as i32
}

/// Convert a light intensity to 8.8 fixed point (saturating)
pub fn to_fixed8(v: f32) -> i32 {
    (v * LIGHT_ONE as f32) as i32
}

/// 2D vector (sprite corners, texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Rotate around `center` by `angle` radians (y-down screen space)
    pub fn rotate_about(self, center: Vec2, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Vec2 {
            x: center.x + dx * cos - dy * sin,
            y: center.y + dx * sin + dy * cos,
        }
    }
}

/// Values interpolated along edges and across spans
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Attrs {
    pub x: f32,
    pub z: f32,
    pub u: f32,
    pub v: f32,
    pub light: f32,
}

impl Attrs {
    pub const ZERO: Attrs = Attrs { x: 0.0, z: 0.0, u: 0.0, v: 0.0, light: 0.0 };

    pub fn scale(self, s: f32) -> Attrs {
        Attrs {
            x: self.x * s,
            z: self.z * s,
            u: self.u * s,
            v: self.v * s,
            light: self.light * s,
        }
    }

    /// Per-step delta to go from `self` to `to` in `steps` steps (zero if no steps)
    pub fn delta_to(self, to: Attrs, steps: i64) -> Attrs {
        if steps == 0 {
            Attrs::ZERO
        } else {
            (to - self).scale(1.0 / steps as f32)
        }
    }

    /// Change per unit of x along the line through `self` and `to`
    /// (zero if they share an x)
    pub fn gradient_x(self, to: Attrs) -> Attrs {
        let dx = to.x - self.x;
        if dx.is_nan() || dx <= 0.0 {
            return Attrs::ZERO;
        }
        let d = to - self;
        Attrs { x: 1.0, z: d.z / dx, u: d.u / dx, v: d.v / dx, light: d.light / dx }
    }
}

impl Add for Attrs {
    type Output = Attrs;
    fn add(self, other: Attrs) -> Attrs {
        Attrs {
            x: self.x + other.x,
            z: self.z + other.z,
            u: self.u + other.u,
            v: self.v + other.v,
            light: self.light + other.light,
        }
    }
}

impl AddAssign for Attrs {
    fn add_assign(&mut self, other: Attrs) {
        *self = *self + other;
    }
}

impl Sub for Attrs {
    type Output = Attrs;
    fn sub(self, other: Attrs) -> Attrs {
        Attrs {
            x: self.x - other.x,
            z: self.z - other.z,
            u: self.u - other.u,
            v: self.v - other.v,
            light: self.light - other.light,
        }
    }
}

impl Mul<f32> for Attrs {
    type Output = Attrs;
    fn mul(self, s: f32) -> Attrs {
        self.scale(s)
    }
}
