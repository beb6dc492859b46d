//! Analysis configuration
//!
//! The levers analysts adjust between runs: guideline limits, score weights,
//! grid precision, peak windows and the detector's default parameters.
//! Configurations round-trip through JSON so a run can be reproduced.

use serde::{Deserialize, Serialize};

use crate::error::HotspotError;
use crate::exceedance::GuidelineLimits;
use crate::grid::{DEFAULT_GRID_PRECISION, MAX_GRID_PRECISION};
use crate::score::ScoreWeights;
use crate::temporal::{default_peak_windows, validate_windows, HourWindow};
use crate::types::{Metric, TimeBucket};

/// Default percentile used for the per-run high-pollution threshold
pub const DEFAULT_THRESHOLD_PERCENTILE: f64 = 88.0;

/// Default minimum number of distinct days a cell must be observed on
pub const DEFAULT_MIN_DAYS_TOTAL: usize = 7;

/// Default minimum fraction of observed days that must be high-pollution days
pub const DEFAULT_MIN_CONSISTENCY: f64 = 0.5;

/// Parameters of a single detector invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub metric: Metric,
    pub percentile: f64,
    pub min_days_total: usize,
    pub min_consistency: f64,
    pub time_filter: Option<TimeBucket>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            metric: Metric::PollutionScore,
            percentile: DEFAULT_THRESHOLD_PERCENTILE,
            min_days_total: DEFAULT_MIN_DAYS_TOTAL,
            min_consistency: DEFAULT_MIN_CONSISTENCY,
            time_filter: None,
        }
    }
}

impl DetectionParams {
    /// Same parameters restricted to one time bucket
    pub fn for_bucket(&self, bucket: TimeBucket) -> Self {
        Self {
            time_filter: Some(bucket),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), HotspotError> {
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(HotspotError::InvalidConfig(format!(
                "percentile must be within [0, 100], got {}",
                self.percentile
            )));
        }
        if !(0.0..=1.0).contains(&self.min_consistency) {
            return Err(HotspotError::InvalidConfig(format!(
                "min_consistency must be within [0, 1], got {}",
                self.min_consistency
            )));
        }
        Ok(())
    }
}

/// Full configuration for an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub limits: GuidelineLimits,
    pub weights: ScoreWeights,
    pub grid_precision: u32,
    pub peak_windows: Vec<HourWindow>,
    pub detection: DetectionParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            limits: GuidelineLimits::default(),
            weights: ScoreWeights::default(),
            grid_precision: DEFAULT_GRID_PRECISION,
            peak_windows: default_peak_windows(),
            detection: DetectionParams::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check every field; called before any derivation happens
    pub fn validate(&self) -> Result<(), HotspotError> {
        for (name, limit) in [("PM2_5", self.limits.pm2_5), ("PM10", self.limits.pm10)] {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(HotspotError::InvalidConfig(format!(
                    "guideline limit for {name} must be positive, got {limit}"
                )));
            }
        }

        self.weights.validate()?;

        if self.grid_precision > MAX_GRID_PRECISION {
            return Err(HotspotError::InvalidConfig(format!(
                "grid_precision must be at most {MAX_GRID_PRECISION}, got {}",
                self.grid_precision
            )));
        }

        validate_windows(&self.peak_windows)?;
        self.detection.validate()
    }

    /// Load and validate a configuration from JSON. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, HotspotError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, HotspotError> {
        serde_json::to_string_pretty(self).map_err(HotspotError::JsonError)
    }
}
