//! ISO 9241-9 ring layouts

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::geometry::Point;
use crate::types::Target;

/// Outer size and margins of the test area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_margin(1920.0, 1080.0, 30.0)
    }
}

impl Viewport {
    /// Viewport with the same margin on every edge
    pub fn with_margin(width: f64, height: f64, margin: f64) -> Self {
        Self {
            width,
            height,
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        }
    }

    pub fn inner_width(&self) -> f64 {
        self.width - (self.left + self.right)
    }

    pub fn inner_height(&self) -> f64 {
        self.height - (self.top + self.bottom)
    }

    /// Centre of the drawable area
    pub fn center(&self) -> Point {
        Point::new(
            self.inner_width() / 2.0 + self.left,
            self.inner_height() / 2.0 + self.top,
        )
    }

    /// The longer outer edge, used to scale the standard battery
    pub fn long_dimension(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// Place `num` targets evenly on a circle of radius `distance / 2`.
///
/// The first target sits at angle 0; subsequent targets follow in order of
/// increasing angle.
pub fn generate_layout(num: usize, distance: f64, width: f64, center: Point) -> Vec<Target> {
    let radius = distance / 2.0;
    (0..num)
        .map(|i| {
            let angle = (2.0 * PI * i as f64) / num as f64;
            Target {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
                w: width,
                distance,
            }
        })
        .collect()
}

/// Step between consecutive targets in the alternating traversal
pub fn traversal_step(num: usize) -> usize {
    num.div_ceil(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::distance;

    #[test]
    fn test_layout_is_an_even_ring() {
        let center = Point::new(500.0, 400.0);
        for num in 1..=16 {
            let layout = generate_layout(num, 300.0, 40.0, center);
            assert_eq!(layout.len(), num);

            for (i, target) in layout.iter().enumerate() {
                assert!((distance(target, &center) - 150.0).abs() < 1e-9);
                assert_eq!(target.w, 40.0);
                assert_eq!(target.distance, 300.0);

                let angle = (target.y - center.y).atan2(target.x - center.x);
                let expected = 2.0 * PI * i as f64 / num as f64;
                let diff = (angle - expected).rem_euclid(2.0 * PI);
                assert!(diff < 1e-9 || (2.0 * PI - diff) < 1e-9, "num={num} i={i}");
            }
        }
    }

    #[test]
    fn test_single_target_at_angle_zero() {
        let layout = generate_layout(1, 100.0, 10.0, Point::new(0.0, 0.0));
        assert_eq!(layout.len(), 1);
        assert!((layout[0].x - 50.0).abs() < 1e-12);
        assert!(layout[0].y.abs() < 1e-12);
    }

    #[test]
    fn test_viewport_center() {
        let viewport = Viewport {
            width: 800.0,
            height: 600.0,
            top: 10.0,
            right: 20.0,
            bottom: 30.0,
            left: 40.0,
        };
        assert_eq!(viewport.inner_width(), 740.0);
        assert_eq!(viewport.inner_height(), 560.0);
        assert_eq!(viewport.center(), Point::new(410.0, 290.0));
        assert_eq!(viewport.long_dimension(), 800.0);
    }

    #[test]
    fn test_traversal_step() {
        assert_eq!(traversal_step(9), 5);
        assert_eq!(traversal_step(8), 4);
        assert_eq!(traversal_step(1), 1);
    }
}
