//! Primitive classification and trivial rejection
//!
//! Vertices are snapped, checked for degeneracy, tested against the scissor and
//! reordered so the edge setup always sees the top vertex first. The tie-break
//! rules here decide which side is "left" downstream.

use crate::error::{RasterError, Result};
use super::math::snap;
use super::types::{Scissor, Vertex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleClass {
    /// v1 and v2 share the top scanline, v1 on the left
    FlatTop,
    /// v2 and v3 share the bottom scanline, v2 on the left
    FlatBottom,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadClass {
    FlatTop,
    FlatBottom,
    FlatBoth,
    Generic,
}

fn snap_xy(v: &mut Vertex) {
    v.x = snap(v.x);
    v.y = snap(v.y);
}

fn all_equal(values: impl IntoIterator<Item = f32>) -> bool {
    let mut it = values.into_iter();
    match it.next() {
        Some(first) => it.all(|v| v == first),
        None => true,
    }
}

/// Snap, reject and order a triangle in place.
///
/// `Ok(None)` means the triangle lies outside the scissor; nothing is drawn.
pub fn classify_triangle(v: &mut [Vertex; 3], scissor: &Scissor) -> Result<Option<TriangleClass>> {
    v.iter_mut().for_each(snap_xy);

    if all_equal(v.iter().map(|p| p.x)) || all_equal(v.iter().map(|p| p.y)) {
        return Err(RasterError::DegeneratePrimitive);
    }

    if v[0].y > v[1].y {
        v.swap(0, 1);
    }
    if v[1].y > v[2].y {
        v.swap(1, 2);
    }
    if v[0].y > v[1].y {
        v.swap(0, 1);
    }

    let (left, right) = (scissor.left as f32, scissor.right() as f32);
    if v[2].y < scissor.top as f32
        || v[0].y > scissor.bottom() as f32
        || v.iter().all(|p| p.x < left)
        || v.iter().all(|p| p.x > right)
    {
        return Ok(None);
    }

    let class = if v[0].y == v[1].y {
        if v[0].x > v[1].x {
            v.swap(0, 1);
        }
        TriangleClass::FlatTop
    } else if v[1].y == v[2].y {
        if v[1].x > v[2].x {
            v.swap(1, 2);
        }
        TriangleClass::FlatBottom
    } else {
        TriangleClass::Generic
    };
    Ok(Some(class))
}

/// Snap, reject and order a quad in place: clockwise (y down), top vertex first.
///
/// The right/bottom rejection tests are inclusive here while the triangle path
/// uses strict comparisons; both are kept as is for pixel compatibility.
pub fn classify_quad(v: &mut [Vertex; 4], scissor: &Scissor) -> Result<Option<QuadClass>> {
    v.iter_mut().for_each(snap_xy);

    if all_equal(v.iter().map(|p| p.x)) || all_equal(v.iter().map(|p| p.y)) {
        return Err(RasterError::DegeneratePrimitive);
    }

    let (left, right) = (scissor.left as f32, scissor.right() as f32);
    let (top, bottom) = (scissor.top as f32, scissor.bottom() as f32);
    if v.iter().all(|p| p.x < left)
        || v.iter().all(|p| p.x >= right)
        || v.iter().all(|p| p.y < top)
        || v.iter().all(|p| p.y >= bottom)
    {
        return Ok(None);
    }

    let cross = (v[1].x - v[0].x) * (v[3].y - v[1].y) - (v[1].y - v[0].y) * (v[3].x - v[1].x);
    if cross < 0.0 {
        v.swap(1, 3);
    }

    let mut first = 0;
    for i in 1..4 {
        if v[i].y < v[first].y {
            first = i;
        }
    }
    v.rotate_left(first);

    if v[0].y >= bottom {
        return Ok(None);
    }

    // Horizontal top edge entering v1: start from its left end instead
    if v[0].y == v[3].y {
        v.rotate_right(1);
    }

    let flat_top = v[0].y == v[1].y;
    let flat_bottom = v[1].y == v[2].y || v[2].y == v[3].y;
    let class = match (flat_top, flat_bottom) {
        (true, true) => QuadClass::FlatBoth,
        (true, false) => QuadClass::FlatTop,
        (false, true) => QuadClass::FlatBottom,
        (false, false) => QuadClass::Generic,
    };
    Ok(Some(class))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Scissor {
        Scissor { left: 0, top: 0, width: 640, height: 480 }
    }

    fn permutations3(pts: [Vertex; 3]) -> Vec<[Vertex; 3]> {
        let idx = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        idx.iter().map(|p| [pts[p[0]], pts[p[1]], pts[p[2]]]).collect()
    }

    fn permutations4(pts: [Vertex; 4]) -> Vec<[Vertex; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let mut seen = [false; 4];
                        for i in [a, b, c, d] {
                            seen[i] = true;
                        }
                        if seen.iter().all(|s| *s) {
                            out.push([pts[a], pts[b], pts[c], pts[d]]);
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_scenario_triangle_is_generic() {
        let mut v = [
            Vertex::new(200.0, 50.0, 110.0).with_light(1.0),
            Vertex::new(600.0, 150.0, 50.0).with_light(0.6),
            Vertex::new(400.0, 250.0, 10.0).with_light(0.3),
        ];
        for mut p in permutations3(v) {
            assert_eq!(classify_triangle(&mut p, &screen()).unwrap(), Some(TriangleClass::Generic));
            assert_eq!((p[0].y, p[1].y, p[2].y), (50.0, 150.0, 250.0));
        }
        classify_triangle(&mut v, &screen()).unwrap();
        assert_eq!(v[0].z, 110.0);
    }

    #[test]
    fn test_degenerate_triangles_every_permutation() {
        let same_x = [Vertex::new(10.0, 0.0, 0.0), Vertex::new(10.0, 50.0, 0.0), Vertex::new(10.0, 90.0, 0.0)];
        let same_y = [Vertex::new(0.0, 7.0, 0.0), Vertex::new(30.0, 7.0, 0.0), Vertex::new(90.0, 7.0, 0.0)];
        // Snapping collapses these onto one row
        let snapped_y = [Vertex::new(0.0, 7.01, 0.0), Vertex::new(30.0, 7.0, 0.0), Vertex::new(90.0, 6.99, 0.0)];
        for pts in [same_x, same_y, snapped_y] {
            for mut p in permutations3(pts) {
                assert!(matches!(
                    classify_triangle(&mut p, &screen()),
                    Err(RasterError::DegeneratePrimitive)
                ));
            }
        }
    }

    #[test]
    fn test_flat_triangles_order_by_x() {
        let pts = [Vertex::new(50.0, 10.0, 0.0), Vertex::new(10.0, 10.0, 0.0), Vertex::new(30.0, 60.0, 0.0)];
        for mut p in permutations3(pts) {
            assert_eq!(classify_triangle(&mut p, &screen()).unwrap(), Some(TriangleClass::FlatTop));
            assert_eq!((p[0].x, p[1].x), (10.0, 50.0));
        }

        let pts = [Vertex::new(30.0, 10.0, 0.0), Vertex::new(50.0, 60.0, 0.0), Vertex::new(10.0, 60.0, 0.0)];
        for mut p in permutations3(pts) {
            assert_eq!(classify_triangle(&mut p, &screen()).unwrap(), Some(TriangleClass::FlatBottom));
            assert_eq!((p[1].x, p[2].x), (10.0, 50.0));
        }
    }

    #[test]
    fn test_triangle_trivial_reject() {
        let s = Scissor { left: 100, top: 100, width: 100, height: 100 };
        let cases = [
            // Entirely above
            [Vertex::new(120.0, 10.0, 0.0), Vertex::new(150.0, 20.0, 0.0), Vertex::new(130.0, 99.0, 0.0)],
            // Entirely left
            [Vertex::new(10.0, 120.0, 0.0), Vertex::new(99.0, 150.0, 0.0), Vertex::new(50.0, 180.0, 0.0)],
            // Entirely right
            [Vertex::new(201.0, 120.0, 0.0), Vertex::new(300.0, 150.0, 0.0), Vertex::new(250.0, 180.0, 0.0)],
        ];
        for mut tri in cases {
            assert_eq!(classify_triangle(&mut tri, &s).unwrap(), None);
        }

        // Touching the right edge exactly is not rejected for triangles
        let mut touching = [Vertex::new(200.0, 120.0, 0.0), Vertex::new(300.0, 150.0, 0.0), Vertex::new(250.0, 180.0, 0.0)];
        assert!(classify_triangle(&mut touching, &s).unwrap().is_some());
    }

    #[test]
    fn test_quad_right_edge_is_inclusive() {
        let s = Scissor { left: 100, top: 100, width: 100, height: 100 };
        let mut quad = [
            Vertex::new(200.0, 120.0, 0.0),
            Vertex::new(300.0, 120.0, 0.0),
            Vertex::new(300.0, 180.0, 0.0),
            Vertex::new(200.0, 180.0, 0.0),
        ];
        assert_eq!(classify_quad(&mut quad, &s).unwrap(), None);
    }

    #[test]
    fn test_degenerate_quads_every_permutation() {
        let same_x = [
            Vertex::new(5.0, 0.0, 0.0),
            Vertex::new(5.0, 10.0, 0.0),
            Vertex::new(5.0, 20.0, 0.0),
            Vertex::new(5.0, 30.0, 0.0),
        ];
        let same_y = [
            Vertex::new(0.0, 9.0, 0.0),
            Vertex::new(10.0, 9.0, 0.0),
            Vertex::new(20.0, 9.0, 0.0),
            Vertex::new(30.0, 9.0, 0.0),
        ];
        for pts in [same_x, same_y] {
            for mut p in permutations4(pts) {
                assert!(matches!(classify_quad(&mut p, &screen()), Err(RasterError::DegeneratePrimitive)));
            }
        }
    }

    #[test]
    fn test_quad_winding_and_rotation() {
        let tl = Vertex::new(10.0, 10.0, 0.0);
        let tr = Vertex::new(50.0, 10.0, 0.0);
        let br = Vertex::new(50.0, 40.0, 0.0);
        let bl = Vertex::new(10.0, 40.0, 0.0);

        // Every rotation of both windings ends up TL, TR, BR, BL
        let cw = [tl, tr, br, bl];
        let ccw = [tl, bl, br, tr];
        for base in [cw, ccw] {
            for r in 0..4 {
                let mut q = base;
                q.rotate_left(r);
                assert_eq!(classify_quad(&mut q, &screen()).unwrap(), Some(QuadClass::FlatBoth));
                assert_eq!(q, cw, "rotation {}", r);
            }
        }
    }

    #[test]
    fn test_quad_classes() {
        let diamond = [
            Vertex::new(30.0, 0.0, 0.0),
            Vertex::new(60.0, 30.0, 0.0),
            Vertex::new(30.0, 60.0, 0.0),
            Vertex::new(0.0, 30.0, 0.0),
        ];
        let mut q = diamond;
        assert_eq!(classify_quad(&mut q, &screen()).unwrap(), Some(QuadClass::Generic));

        let trapezoid = [
            Vertex::new(20.0, 0.0, 0.0),
            Vertex::new(40.0, 0.0, 0.0),
            Vertex::new(60.0, 30.0, 0.0),
            Vertex::new(0.0, 45.0, 0.0),
        ];
        let mut q = trapezoid;
        assert_eq!(classify_quad(&mut q, &screen()).unwrap(), Some(QuadClass::FlatTop));

        let kite = [
            Vertex::new(30.0, 0.0, 0.0),
            Vertex::new(60.0, 40.0, 0.0),
            Vertex::new(40.0, 50.0, 0.0),
            Vertex::new(0.0, 50.0, 0.0),
        ];
        let mut q = kite;
        assert_eq!(classify_quad(&mut q, &screen()).unwrap(), Some(QuadClass::FlatBottom));
    }
}
