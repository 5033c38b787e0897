//! Summary statistics shared by the z-score transform and the aggregator.
//!
//! Conventions (kept deliberately explicit because they affect test vectors):
//!
//! - `population_stddev` divides by `n` and is what the z-score transform
//!   uses, so `zscore([1,2,3,4])` yields `[-1.341.., -0.447.., 0.447.., 1.341..]`.
//! - `sem` uses the sample standard deviation (divide by `n - 1`), the usual
//!   standard-error-of-the-mean definition. A single-observation group has no
//!   spread estimate and reports a SEM of zero.

/// Arithmetic mean. The caller guarantees a non-empty slice.
pub fn mean(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by `n`).
pub fn population_stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Sample standard deviation (divide by `n - 1`). Zero for a single value.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Standard error of the mean: `sample_stddev / sqrt(n)`.
pub fn sem(values: &[f64]) -> f64 {
    sample_stddev(values) / (values.len() as f64).sqrt()
}
