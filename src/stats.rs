//! Small descriptive statistics helpers

use serde::{Deserialize, Serialize};

/// Percentile of `values` with linear interpolation between closest ranks
/// (numpy's default method). `percentile` is on a 0-100 scale.
///
/// Returns `None` for an empty slice. Values are assumed finite.
pub fn percentile(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(percentile_sorted(&sorted, percentile))
}

fn percentile_sorted(sorted: &[f64], percentile: f64) -> f64 {
    let rank = (sorted.len() - 1) as f64 * (percentile / 100.0).clamp(0.0, 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Count, mean, sample standard deviation, extremes and quartiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl Describe {
    pub fn of(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let std = if values.len() > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (values.len() - 1) as f64).sqrt()
        } else {
            0.0
        };

        Some(Self {
            count: values.len(),
            mean,
            std,
            min: sorted[0],
            p25: percentile_sorted(&sorted, 25.0),
            p50: percentile_sorted(&sorted, 50.0),
            p75: percentile_sorted(&sorted, 75.0),
            max: sorted[sorted.len() - 1],
        })
    }
}
