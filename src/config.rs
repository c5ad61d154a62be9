//! Experiment configuration
//!
//! Configuration is plain JSON. Every section has defaults, so an empty
//! object `{}` is a valid configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::battery::{BatteryEntry, TrialBattery};
use crate::error::FittsError;
use crate::layout::Viewport;

/// Movement times at or above this are treated as outliers (ms)
pub const DEFAULT_MAX_TIME_MS: i64 = 200_000;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Ring layout parameters
    pub iso: IsoParams,
    /// Bounds for randomised layouts
    pub limits: IsoLimits,
    /// Test area
    pub viewport: Viewport,
    /// Outlier cutoff for recorded movement times (ms)
    pub max_time_ms: i64,
    /// Explicit battery; the standard battery is derived from the viewport when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<Vec<BatteryEntry>>,
}

/// Ring layout parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoParams {
    /// Number of targets on the ring
    pub num: usize,
    /// Default ring diameter
    pub distance: f64,
    /// Default target diameter
    pub width: f64,
    /// Advance through the battery automatically
    pub randomize: bool,
}

/// Bounds for randomised distance and width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoLimits {
    pub min_d: f64,
    pub max_d: f64,
    pub min_w: f64,
    pub max_w: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            iso: IsoParams::default(),
            limits: IsoLimits::default(),
            viewport: Viewport::default(),
            max_time_ms: DEFAULT_MAX_TIME_MS,
            battery: None,
        }
    }
}

impl Default for IsoParams {
    fn default() -> Self {
        Self {
            num: 9,
            distance: 200.0,
            width: 50.0,
            randomize: true,
        }
    }
}

impl Default for IsoLimits {
    fn default() -> Self {
        Self {
            min_d: 120.0,
            max_d: 300.0,
            min_w: 10.0,
            max_w: 100.0,
        }
    }
}

impl IsoLimits {
    /// Draw a (distance, width) pair uniformly within the limits, floored to whole pixels
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let distance = (self.min_d + rng.random::<f64>() * (self.max_d - self.min_d)).floor();
        let width = (self.min_w + rng.random::<f64>() * (self.max_w - self.min_w)).floor();
        (distance, width)
    }
}

impl ExperimentConfig {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), FittsError> {
        if self.iso.num == 0 {
            return Err(FittsError::InvalidConfig("iso.num must be >= 1".to_string()));
        }
        if !(self.iso.distance > 0.0) || !(self.iso.width > 0.0) {
            return Err(FittsError::InvalidConfig(format!(
                "iso distance and width must be positive, got {} / {}",
                self.iso.distance, self.iso.width
            )));
        }
        if self.limits.min_d > self.limits.max_d || self.limits.min_w > self.limits.max_w {
            return Err(FittsError::InvalidConfig(
                "limits must satisfy min <= max".to_string(),
            ));
        }
        if !(self.viewport.inner_width() > 0.0) || !(self.viewport.inner_height() > 0.0) {
            return Err(FittsError::InvalidConfig(format!(
                "viewport has no drawable area ({}x{} with margins)",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.max_time_ms <= 0 {
            return Err(FittsError::InvalidConfig(format!(
                "max_time_ms must be > 0, got {}",
                self.max_time_ms
            )));
        }
        if let Some(entries) = &self.battery {
            if entries.is_empty() {
                return Err(FittsError::InvalidConfig("battery must not be empty".to_string()));
            }
            for (i, entry) in entries.iter().enumerate() {
                if !(entry.distance > 0.0) || !(entry.width > 0.0) {
                    return Err(FittsError::InvalidConfig(format!(
                        "battery[{i}] distance and width must be positive"
                    )));
                }
                if entry.actions.is_empty() {
                    return Err(FittsError::InvalidConfig(format!(
                        "battery[{i}] requires at least one action"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The battery this configuration describes
    pub fn battery(&self) -> TrialBattery {
        match &self.battery {
            Some(entries) => TrialBattery::new(entries.clone()),
            None => TrialBattery::standard(self.viewport.long_dimension()),
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, FittsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, FittsError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FittsError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, FittsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
