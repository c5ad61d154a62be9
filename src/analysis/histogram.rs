//! Fixed-range histograms

use serde::Serialize;

/// Number of throughput bins
pub const THROUGHPUT_BINS: usize = 20;

/// Throughput range covered by the histogram (bits/s)
pub const THROUGHPUT_RANGE: (f64, f64) = (0.0, 10.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    /// Inclusive lower edge
    pub x0: f64,
    /// Upper edge; exclusive except for the last bin
    pub x1: f64,
    pub count: usize,
}

/// Equal-width histogram over a closed range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins over `[lo, hi]`.
    ///
    /// Values outside the range (and NaN) are not counted.
    pub fn new(values: impl IntoIterator<Item = f64>, bins: usize, lo: f64, hi: f64) -> Self {
        let step = (hi - lo) / bins as f64;
        let mut out: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                x0: lo + step * i as f64,
                x1: if i + 1 == bins {
                    hi
                } else {
                    lo + step * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        if bins == 0 {
            return Self { bins: out };
        }

        for value in values {
            if !(lo..=hi).contains(&value) {
                continue;
            }
            let index = (((value - lo) / step).floor() as usize).min(bins - 1);
            out[index].count += 1;
        }
        Self { bins: out }
    }

    /// Throughput histogram: 20 bins over 0–10 bits/s
    pub fn throughput(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            values,
            THROUGHPUT_BINS,
            THROUGHPUT_RANGE.0,
            THROUGHPUT_RANGE.1,
        )
    }

    pub fn counts(&self) -> Vec<usize> {
        self.bins.iter().map(|b| b.count).collect()
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}
