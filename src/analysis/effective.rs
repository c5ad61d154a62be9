//! Effective width and distance per experimental condition
//!
//! Uses the "smaller-of" model (MacKenzie & Buxton, 1992): the effective
//! width is the smaller of the spreads measured along and across the
//! movement axis, each scaled by 4.133 (±2.066 σ, 96% of hits).

use serde::Serialize;

use super::stats::{mean, variance};
use crate::types::{Condition, TrialRecord};

/// Scale from standard deviation to effective width
pub const EFFECTIVE_WIDTH_FACTOR: f64 = 4.133;

/// Groups smaller than this are left out of the effective metrics
pub const MIN_GROUP_SIZE: usize = 3;

/// Per-record geometry needed for the effective metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitGeometry {
    pub real_distance: f64,
    pub projected_hit_offset_x: f64,
    pub projected_hit_offset_y: f64,
}

impl HitGeometry {
    pub fn of(record: &TrialRecord) -> Self {
        let (x, y) = record.hit_offset();
        Self {
            real_distance: record.real_distance(),
            projected_hit_offset_x: x,
            projected_hit_offset_y: y,
        }
    }
}

/// Records sharing one nominal condition, by index into the input slice
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub condition: Condition,
    pub indices: Vec<usize>,
}

/// Partition records by `(distance, width)`, keeping first-seen order
pub fn group_by_condition(records: &[TrialRecord]) -> Vec<ConditionGroup> {
    let mut groups: Vec<ConditionGroup> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let condition = record.condition();
        let key = (condition.distance.to_bits(), condition.width.to_bits());
        match groups.iter_mut().find(|g| {
            (g.condition.distance.to_bits(), g.condition.width.to_bits()) == key
        }) {
            Some(group) => group.indices.push(i),
            None => groups.push(ConditionGroup {
                condition,
                indices: vec![i],
            }),
        }
    }
    groups
}

/// Effective metrics of one condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveMetrics {
    /// Effective width along the movement axis
    pub x_effective: f64,
    /// Effective width across the movement axis
    pub y_effective: f64,
    /// Effective width (smaller of the two)
    pub we: f64,
    /// Effective distance (mean distance actually moved)
    pub de: f64,
}

impl EffectiveMetrics {
    /// Compute the metrics for one group; `None` below [`MIN_GROUP_SIZE`]
    pub fn compute(geometry: &[HitGeometry]) -> Option<Self> {
        if geometry.len() < MIN_GROUP_SIZE {
            return None;
        }
        let xs: Vec<f64> = geometry.iter().map(|g| g.projected_hit_offset_x).collect();
        let ys: Vec<f64> = geometry.iter().map(|g| g.projected_hit_offset_y).collect();
        let distances: Vec<f64> = geometry.iter().map(|g| g.real_distance).collect();

        let x_effective = EFFECTIVE_WIDTH_FACTOR * variance(&xs).sqrt();
        let y_effective = EFFECTIVE_WIDTH_FACTOR * variance(&ys).sqrt();
        Some(Self {
            x_effective,
            y_effective,
            we: x_effective.min(y_effective),
            de: mean(&distances),
        })
    }

    /// Effective index of difficulty
    pub fn ide(&self) -> f64 {
        crate::geometry::shannon(self.de, self.we)
    }
}

/// Throughput in bits per second for a movement time in milliseconds
pub fn throughput(ide: f64, time_ms: f64) -> f64 {
    1000.0 * (ide / time_ms)
}
