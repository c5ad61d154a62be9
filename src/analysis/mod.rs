//! Performance analysis
//!
//! Turns a data set's trial records into Fitts' Law metrics:
//!
//! Records → group by condition → effective width/distance → IDe and
//! throughput per record → regression of time on IDe → throughput histogram.
//!
//! Every pass produces a fresh view; stored records are never modified.
//! Small or empty inputs degrade to empty results instead of failing.

pub mod effective;
pub mod histogram;
pub mod regression;
pub mod stats;
pub mod trajectory;

use serde::Serialize;
use tracing::debug;

use crate::dataset::DataSet;
use crate::types::{Condition, TrialRecord};

pub use effective::{throughput, EffectiveMetrics, HitGeometry, MIN_GROUP_SIZE};
pub use histogram::{Histogram, HistogramBin};
pub use regression::{Regression, RegressionLine};
pub use trajectory::{speed_colour, ProfileSample, TrajectoryProfile};

/// A trial record together with its derived metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: TrialRecord,
    #[serde(flatten)]
    pub geometry: HitGeometry,
    /// Effective index of difficulty of the record's condition
    #[serde(rename = "IDe")]
    pub ide: f64,
    /// Bits per second
    pub throughput: f64,
}

/// Summary of one nominal condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub condition: Condition,
    pub count: usize,
    /// `None` when the group was too small for effective metrics
    pub effective: Option<EffectiveMetrics>,
    #[serde(rename = "IDe")]
    pub ide: Option<f64>,
    pub mean_time: f64,
    pub mean_throughput: Option<f64>,
}

/// Everything a renderer needs to draw one data set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub data_set_id: u32,
    pub colour: String,
    /// Records of qualifying groups, group by group
    pub enriched_records: Vec<EnrichedRecord>,
    pub groups: Vec<GroupSummary>,
    /// Time on IDe; absent when undefined
    pub regression: Option<Regression>,
    pub histogram: Histogram,
    /// Movement profile per enriched record, same order
    pub trajectories: Vec<TrajectoryProfile>,
}

impl AnalysisResult {
    /// Mean throughput over all qualifying records
    pub fn mean_throughput(&self) -> Option<f64> {
        if self.enriched_records.is_empty() {
            return None;
        }
        let values: Vec<f64> = self.enriched_records.iter().map(|r| r.throughput).collect();
        Some(stats::mean(&values))
    }
}

/// Stateless analyzer
pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    /// Analyse one data set
    pub fn analyze(data_set_id: u32, data_set: &DataSet) -> AnalysisResult {
        let (enriched_records, groups) = Self::enrich(&data_set.records);

        let ide: Vec<f64> = enriched_records.iter().map(|r| r.ide).collect();
        let time: Vec<f64> = enriched_records.iter().map(|r| r.record.time as f64).collect();
        let regression = Regression::fit(&ide, &time);

        let histogram = Histogram::throughput(enriched_records.iter().map(|r| r.throughput));
        let trajectories = enriched_records
            .iter()
            .map(|r| TrajectoryProfile::of(&r.record))
            .collect();

        debug!(
            data_set = data_set_id,
            records = data_set.records.len(),
            qualifying = enriched_records.len(),
            groups = groups.len(),
            regression = regression.is_some(),
            "analysis complete"
        );

        AnalysisResult {
            data_set_id,
            colour: data_set.colour.clone(),
            enriched_records,
            groups,
            regression,
            histogram,
            trajectories,
        }
    }

    /// Derive per-record metrics for every group with enough samples
    pub fn enrich(records: &[TrialRecord]) -> (Vec<EnrichedRecord>, Vec<GroupSummary>) {
        let mut enriched = Vec::new();
        let mut summaries = Vec::new();

        for group in effective::group_by_condition(records) {
            let members: Vec<&TrialRecord> = group.indices.iter().map(|&i| &records[i]).collect();
            let geometry: Vec<HitGeometry> = members.iter().map(|r| HitGeometry::of(r)).collect();
            let times: Vec<f64> = members.iter().map(|r| r.time as f64).collect();

            let metrics = EffectiveMetrics::compute(&geometry);
            let mut summary = GroupSummary {
                condition: group.condition,
                count: members.len(),
                effective: metrics,
                ide: None,
                mean_time: stats::mean(&times),
                mean_throughput: None,
            };

            let Some(metrics) = metrics else {
                debug!(
                    distance = group.condition.distance,
                    width = group.condition.width,
                    count = members.len(),
                    "group too small for effective metrics"
                );
                summaries.push(summary);
                continue;
            };

            let ide = metrics.ide();
            let mut throughputs = Vec::with_capacity(members.len());
            for (record, geometry) in members.into_iter().zip(geometry) {
                let tp = throughput(ide, record.time as f64);
                throughputs.push(tp);
                enriched.push(EnrichedRecord {
                    record: record.clone(),
                    geometry,
                    ide,
                    throughput: tp,
                });
            }
            summary.ide = Some(ide);
            summary.mean_throughput = Some(stats::mean(&throughputs));
            summaries.push(summary);
        }

        (enriched, summaries)
    }
}
