//! Planar geometry used by the trial engine and the analyzer
//!
//! Everything here is pure. The only guarded case is the projection onto a
//! degenerate segment, which returns the segment start without a parameter.

use serde::{Deserialize, Serialize};

/// A 2D coordinate, optionally stamped with milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Capture time (ms since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<i64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, t: None }
    }

    pub fn at(x: f64, y: f64, t: i64) -> Self {
        Self { x, y, t: Some(t) }
    }

    /// Same position, different timestamp
    pub fn with_time(self, t: i64) -> Self {
        Self { t: Some(t), ..self }
    }

    /// Positional equality, ignoring timestamps
    pub fn same_position(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Anything with a planar position
pub trait Planar {
    fn xy(&self) -> (f64, f64);
}

impl Planar for Point {
    fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Planar for Projection {
    fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Planar for (f64, f64) {
    fn xy(&self) -> (f64, f64) {
        *self
    }
}

/// Orthogonal projection of a point onto the line through `A` and `B`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub x: f64,
    pub y: f64,
    /// Line parameter such that the projection equals `A + t·(B − A)`.
    /// `None` when `A == B`.
    pub t: Option<f64>,
}

/// Euclidean distance
pub fn distance(a: &impl Planar, b: &impl Planar) -> f64 {
    let (ax, ay) = a.xy();
    let (bx, by) = b.xy();
    let dx = ax - bx;
    let dy = ay - by;
    (dx.powi(2) + dy.powi(2)).sqrt()
}

/// Project `p` onto the infinite line through `a` and `b`
pub fn project(a: &impl Planar, b: &impl Planar, p: &impl Planar) -> Projection {
    let (ax, ay) = a.xy();
    let (bx, by) = b.xy();
    let (px, py) = p.xy();

    let ab = (bx - ax, by - ay);
    let ab_squared = ab.0 * ab.0 + ab.1 * ab.1;
    if ab_squared == 0.0 {
        return Projection {
            x: ax,
            y: ay,
            t: None,
        };
    }

    let ap = (px - ax, py - ay);
    let t = (ap.0 * ab.0 + ap.1 * ab.1) / ab_squared;
    Projection {
        x: ax + t * ab.0,
        y: ay + t * ab.1,
        t: Some(t),
    }
}

/// Which side of the directed line `a → b` the point `p` lies on.
///
/// Returns `1.0` for left (or on the line), `-1.0` for right.
pub fn is_left(a: &impl Planar, b: &impl Planar, p: &impl Planar) -> f64 {
    let (ax, ay) = a.xy();
    let (bx, by) = b.xy();
    let (px, py) = p.xy();
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Sign with ties resolved to `+1`
pub fn sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Shannon formulation of the index of difficulty: `log2(a / w + 1)`
pub fn shannon(amplitude: f64, width: f64) -> f64 {
    (amplitude / width + 1.0).log2()
}

/// Offset of `p` relative to the `a → b` movement axis, measured from `b`.
///
/// The first component runs along the axis (negative = undershoot), the
/// second across it (positive = left of the direction of motion).
pub fn offset_from_end(a: &impl Planar, b: &impl Planar, p: &impl Planar) -> (f64, f64) {
    let q = project(a, b, p);
    let along = distance(&q, b) * sign(q.t.unwrap_or(0.0) - 1.0);
    let across = distance(&q, p) * is_left(a, b, p);
    (along, across)
}

/// Offset of `p` relative to the `a → b` movement axis, measured from `a`
pub fn offset_from_start(a: &impl Planar, b: &impl Planar, p: &impl Planar) -> (f64, f64) {
    let q = project(a, b, p);
    let along = distance(&q, a) * sign(q.t.unwrap_or(0.0));
    let across = distance(&q, p) * is_left(a, b, p);
    (along, across)
}
