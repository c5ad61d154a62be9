//! Core types for recorded trials
//!
//! A `TrialRecord` is created at the moment of a qualifying hit and never
//! mutated afterwards. Analysis results live in separate views
//! (see [`crate::analysis::EnrichedRecord`]).

use serde::{Deserialize, Serialize};

use crate::geometry::{distance, offset_from_end, shannon, Planar, Point};

/// A circular target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Centre x
    pub x: f64,
    /// Centre y
    pub y: f64,
    /// Diameter
    pub w: f64,
    /// Nominal inter-target distance of the layout this target belongs to
    pub distance: f64,
}

impl Planar for Target {
    fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Target {
    pub fn radius(&self) -> f64 {
        self.w / 2.0
    }

    /// Strict containment test used for hit classification
    pub fn contains(&self, p: &impl Planar) -> bool {
        distance(p, self) < self.radius()
    }

    /// Centre as an untimed point
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One completed (hit) trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Movement time in milliseconds (`hit.t − start.t`)
    pub time: i64,
    /// Nominal distance of the condition
    pub distance: f64,
    /// Nominal width of the condition
    pub width: f64,
    /// Where the pointer was when the previous trial ended
    pub start: Point,
    /// Target that was acquired
    pub target: Target,
    /// Pointer samples, chronological, starting with `start`
    pub path: Vec<Point>,
    /// Where the triggering action happened
    pub hit: Point,
    /// Actions required by the battery entry, comma separated
    #[serde(default)]
    pub key_press: String,
}

impl TrialRecord {
    /// Build a record from its capture-time parts.
    ///
    /// Returns `None` when either endpoint lacks a timestamp.
    pub fn capture(
        start: Point,
        target: Target,
        path: Vec<Point>,
        hit: Point,
        key_press: String,
    ) -> Option<Self> {
        let time = hit.t? - start.t?;
        Some(Self {
            time,
            distance: target.distance,
            width: target.w,
            start,
            target,
            path,
            hit,
            key_press,
        })
    }

    /// Nominal index of difficulty from the actual start position
    pub fn nominal_id(&self) -> f64 {
        shannon(distance(&self.target, &self.start), self.target.w)
    }

    /// Distance actually covered from start to hit
    pub fn real_distance(&self) -> f64 {
        distance(&self.start, &self.hit)
    }

    /// Hit position relative to the target along and across the movement axis
    pub fn hit_offset(&self) -> (f64, f64) {
        offset_from_end(&self.start, &self.target, &self.hit)
    }

    /// Experimental condition key
    pub fn condition(&self) -> Condition {
        Condition {
            distance: self.target.distance,
            width: self.target.w,
        }
    }
}

/// Nominal experimental condition a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub distance: f64,
    pub width: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target {
            x: 100.0,
            y: 0.0,
            w: 20.0,
            distance: 200.0,
        }
    }

    #[test]
    fn test_contains_is_strict() {
        let t = target();
        assert!(t.contains(&Point::new(100.0, 0.0)));
        assert!(t.contains(&Point::new(109.99, 0.0)));
        assert!(!t.contains(&Point::new(110.0, 0.0)));
    }

    #[test]
    fn test_capture_requires_timestamps() {
        let hit = Point::at(100.0, 0.0, 1_500);
        assert!(TrialRecord::capture(Point::new(0.0, 0.0), target(), vec![], hit, String::new())
            .is_none());

        let record = TrialRecord::capture(
            Point::at(0.0, 0.0, 1_000),
            target(),
            vec![Point::at(0.0, 0.0, 1_000)],
            hit,
            "click".to_string(),
        )
        .unwrap();
        assert_eq!(record.time, 500);
        assert_eq!(record.distance, 200.0);
        assert_eq!(record.width, 20.0);
    }

    #[test]
    fn test_nominal_id() {
        let record = TrialRecord::capture(
            Point::at(0.0, 0.0, 0),
            target(),
            vec![],
            Point::at(100.0, 0.0, 400),
            "click".to_string(),
        )
        .unwrap();
        // log2(100 / 20 + 1)
        assert!((record.nominal_id() - 6.0_f64.log2()).abs() < 1e-12);
        assert_eq!(record.hit_offset(), (0.0, 0.0));
    }
}
