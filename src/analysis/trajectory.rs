//! Movement profiles along the start → target axis

use serde::Serialize;

use crate::geometry::{distance, offset_from_start};
use crate::types::TrialRecord;

/// Speed mapped to full colour intensity (pixels per ms)
pub const MAX_SPEED: f64 = 6.0;

/// One pointer sample in movement-axis coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSample {
    /// Distance travelled along the axis (negative = behind the start)
    pub x: f64,
    /// Deviation across the axis
    pub y: f64,
    /// Milliseconds since the trial started
    pub t: i64,
    /// Speed since the previous sample (pixels per ms)
    pub speed: f64,
}

/// Movement profile of one trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryProfile {
    pub samples: Vec<ProfileSample>,
}

impl TrajectoryProfile {
    /// Profile a recorded path against the record's start and target
    pub fn of(record: &TrialRecord) -> Self {
        let start_t = record.start.t.unwrap_or(0);
        let mut last = ProfileSample {
            x: 0.0,
            y: 0.0,
            t: 0,
            speed: 0.0,
        };

        let samples = record
            .path
            .iter()
            .map(|p| {
                let (x, y) = offset_from_start(&record.start, &record.target, p);
                let t = p.t.map_or(last.t, |pt| pt - start_t);
                let dt = t - last.t;
                let travelled = distance(&(last.x, last.y), &(x, y));
                let speed = if dt > 0 {
                    travelled / dt as f64
                } else {
                    0.0
                };
                last = ProfileSample { x, y, t, speed };
                last
            })
            .collect();

        Self { samples }
    }

    pub fn peak_speed(&self) -> f64 {
        self.samples.iter().map(|s| s.speed).fold(0.0, f64::max)
    }
}

/// Colour for a speed, from black (still) to red (at or above [`MAX_SPEED`])
pub fn speed_colour(speed: f64) -> String {
    let red = ((speed / MAX_SPEED) * 255.0).floor().clamp(0.0, 255.0) as u8;
    format!("rgb({red}, 0, 0)")
}
