//! Reading derivation
//!
//! This module derives every per-row field from a validated reading in one
//! pass:
//! - Calendar day, hour, weekday and month
//! - Peak / off-peak time bucket
//! - Exceedance ratios and composite pollution score
//! - AQI category and grid cell

use chrono::{Datelike, Timelike};

use crate::category;
use crate::config::AnalysisConfig;
use crate::error::HotspotError;
use crate::exceedance;
use crate::grid;
use crate::score;
use crate::temporal;
use crate::types::{DerivedReading, Reading};

/// Deriver for turning readings into derived readings
pub struct ReadingDeriver;

impl ReadingDeriver {
    /// Derive all computed fields for one reading
    pub fn derive(reading: Reading, config: &AnalysisConfig) -> DerivedReading {
        let day = reading.timestamp.date();
        let hour = reading.timestamp.hour();
        let exceedance = exceedance::evaluate(&reading, &config.limits);
        let pollution_score = score::compose(&exceedance, &config.weights);
        let aqi_category = category::classify(reading.pm2_5, config.limits.pm2_5);
        let cell = grid::cell_for(reading.latitude, reading.longitude, config.grid_precision);

        DerivedReading {
            day,
            hour,
            weekday: day.weekday(),
            month: day.month(),
            time_bucket: temporal::segment(hour, &config.peak_windows),
            exceedance,
            pollution_score,
            aqi_category,
            cell,
            reading,
        }
    }

    /// Validate and derive a whole population.
    ///
    /// Fails on the first invalid reading rather than letting a bad value
    /// reach a percentile or mean.
    pub fn derive_all(
        readings: &[Reading],
        config: &AnalysisConfig,
    ) -> Result<Vec<DerivedReading>, HotspotError> {
        config.validate()?;

        readings
            .iter()
            .map(|reading| {
                reading.validate()?;
                Ok(Self::derive(reading.clone(), config))
            })
            .collect()
    }
}
