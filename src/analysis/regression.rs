//! Least-squares fit of movement time on effective index of difficulty

use serde::Serialize;

use super::stats::{covariance, mean, variance};

/// IDe range covered by the fitted line
pub const LINE_IDE_RANGE: (f64, f64) = (0.5, 6.5);

/// `time = a + b · IDe`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regression {
    /// Intercept (ms)
    pub a: f64,
    /// Slope (ms per bit)
    pub b: f64,
    /// Number of samples in the fit
    pub samples: usize,
    /// End points of the line over [`LINE_IDE_RANGE`]
    pub line: RegressionLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionLine {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Regression {
    /// Fit `time` on `ide`. Returns `None` when the intercept is undefined,
    /// e.g. without samples.
    pub fn fit(ide: &[f64], time: &[f64]) -> Option<Self> {
        let var_ide = variance(ide);
        let b = if var_ide > 0.0 {
            covariance(time, ide) / var_ide
        } else {
            0.0
        };
        let a = mean(time) - b * mean(ide);
        if !a.is_finite() {
            return None;
        }

        let (x1, x2) = LINE_IDE_RANGE;
        Some(Self {
            a,
            b,
            samples: ide.len().min(time.len()),
            line: RegressionLine {
                x1,
                y1: a + b * x1,
                x2,
                y2: a + b * x2,
            },
        })
    }

    /// Predicted movement time for an index of difficulty
    pub fn predict(&self, ide: f64) -> f64 {
        self.a + self.b * ide
    }
}
