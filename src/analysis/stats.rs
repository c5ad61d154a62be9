//! Sample statistics with Bessel's correction

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Empirical covariance (`n − 1` denominator); 0 for fewer than two samples
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n <= 1 {
        return 0.0;
    }
    let a = &a[..n];
    let b = &b[..n];
    let mean_a = mean(a);
    let mean_b = mean(b);

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    sum / (n - 1) as f64
}

/// Sample variance
pub fn variance(values: &[f64]) -> f64 {
    covariance(values, values)
}
