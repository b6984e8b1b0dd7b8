//! Edge setup and the scanline walk
//!
//! A primitive becomes an `EdgePlan`: the two edges active at the top scanline
//! plus a list of replacement events where one side switches to a new edge.
//! Triangles have at most one event, quads up to three.

use super::classify::TriangleClass;
use super::math::{line_of, Attrs};
use super::types::Scissor;

/// A vertex prepared for edge setup: interpolants in their final units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeVertex {
    pub attrs: Attrs,
    pub y: f32,
}

impl EdgeVertex {
    pub fn line(&self) -> i64 {
        line_of(self.y)
    }
}

/// Current value and per-scanline step of one edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub cur: Attrs,
    pub delta: Attrs,
}

impl Edge {
    /// Edge from `a` down to `b`. A zero-height edge gets a zero step.
    pub fn between(a: &EdgeVertex, b: &EdgeVertex) -> Self {
        Self {
            cur: a.attrs,
            delta: a.attrs.delta_to(b.attrs, b.line() - a.line()),
        }
    }

    #[inline]
    pub fn step(&mut self) {
        self.cur += self.delta;
    }

    /// Skip `lines` scanlines in one multiply-add
    #[inline]
    pub fn advance(&mut self, lines: i64) {
        if lines > 0 {
            self.cur += self.delta * lines as f32;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// At scanline `line`, `side` continues along `edge`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEvent {
    pub line: i64,
    pub side: Side,
    pub edge: Edge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgePlan {
    pub top: i64,
    /// Exclusive
    pub bottom: i64,
    pub left: Edge,
    pub right: Edge,
    /// Sorted by line
    pub events: Vec<EdgeEvent>,
}

impl EdgePlan {
    /// Plan for a triangle already ordered by `classify_triangle`
    pub fn triangle(class: TriangleClass, v: &[EdgeVertex; 3]) -> Self {
        let top = v[0].line();
        let bottom = v[2].line();
        match class {
            TriangleClass::FlatTop => Self {
                top,
                bottom,
                left: Edge::between(&v[0], &v[2]),
                right: Edge::between(&v[1], &v[2]),
                events: Vec::new(),
            },
            TriangleClass::FlatBottom => Self {
                top,
                bottom,
                left: Edge::between(&v[0], &v[1]),
                right: Edge::between(&v[0], &v[2]),
                events: Vec::new(),
            },
            TriangleClass::Generic => {
                let slope12 = (v[1].attrs.x - v[0].attrs.x) / (v[1].y - v[0].y);
                let slope13 = (v[2].attrs.x - v[0].attrs.x) / (v[2].y - v[0].y);
                let long = Edge::between(&v[0], &v[2]);
                let upper = Edge::between(&v[0], &v[1]);
                let lower = Edge::between(&v[1], &v[2]);
                // v2 sits on the side whose upper edge leans further that way
                let (left, right, side) = if slope12 < slope13 {
                    (upper, long, Side::Left)
                } else {
                    (long, upper, Side::Right)
                };
                Self {
                    top,
                    bottom,
                    left,
                    right,
                    events: vec![EdgeEvent { line: v[1].line(), side, edge: lower }],
                }
            }
        }
    }

    /// Plan for a quad already ordered by `classify_quad` (clockwise, v1 on top)
    pub fn quad(v: &[EdgeVertex; 4]) -> Self {
        // Bottom vertex: v3 unless v2 or v4 is strictly lower
        let mut bottom_vertex = 2;
        if v[1].y > v[bottom_vertex].y {
            bottom_vertex = 1;
        }
        if v[3].y > v[bottom_vertex].y {
            bottom_vertex = 3;
        }

        let (right_chain, left_chain): (&[usize], &[usize]) = match bottom_vertex {
            1 => (&[0, 1], &[0, 3, 2, 1]),
            2 => (&[0, 1, 2], &[0, 3, 2]),
            _ => (&[0, 1, 2, 3], &[0, 3]),
        };

        let chain_events = |chain: &[usize], side: Side| -> Vec<EdgeEvent> {
            chain
                .windows(2)
                .skip(1)
                .map(|w| EdgeEvent {
                    line: v[w[0]].line(),
                    side,
                    edge: Edge::between(&v[w[0]], &v[w[1]]),
                })
                .collect()
        };
        let rights = chain_events(right_chain, Side::Right);
        let lefts = chain_events(left_chain, Side::Left);

        // Merge keeping each side in chain order; right first on equal lines
        let mut events = Vec::with_capacity(rights.len() + lefts.len());
        let (mut r, mut l) = (rights.into_iter().peekable(), lefts.into_iter().peekable());
        loop {
            let take_right = match (r.peek(), l.peek()) {
                (Some(a), Some(b)) => a.line <= b.line,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_right { r.next() } else { l.next() };
            events.extend(next);
        }

        Self {
            top: v[0].line(),
            bottom: v[bottom_vertex].line(),
            left: Edge::between(&v[left_chain[0]], &v[left_chain[1]]),
            right: Edge::between(&v[right_chain[0]], &v[right_chain[1]]),
            events,
        }
    }

    /// Walk every scanline inside `scissor` from top to bottom, calling
    /// `span(y, left, right)` for each. Lines above the scissor are skipped by
    /// advancing the edges in bulk. Returns the number of scanlines visited.
    pub fn walk<F>(&self, scissor: &Scissor, mut span: F) -> u32
    where
        F: FnMut(i32, &Attrs, &Attrs),
    {
        let clip_top = i64::from(scissor.top);
        let clip_bottom = i64::from(scissor.bottom());

        let mut left = self.left;
        let mut right = self.right;
        let mut line = self.top;
        let mut next_event = 0;
        let mut scanlines = 0;

        while line < self.bottom && line < clip_bottom {
            while let Some(event) = self.events.get(next_event).filter(|e| e.line <= line) {
                match event.side {
                    Side::Left => left = event.edge,
                    Side::Right => right = event.edge,
                }
                next_event += 1;
            }

            let end = self
                .events
                .get(next_event)
                .map_or(self.bottom, |e| e.line)
                .min(self.bottom);

            let first = line.max(clip_top);
            let last = end.min(clip_bottom);
            if first < last {
                left.advance(first - line);
                right.advance(first - line);
                // Inside the scissor, so every y fits an i32
                for y in first..last {
                    span(y as i32, &left.cur, &right.cur);
                    left.step();
                    right.step();
                }
                scanlines += (last - first) as u32;
            } else {
                left.advance(end - line);
                right.advance(end - line);
            }

            line = end;
        }
        scanlines
    }
}
