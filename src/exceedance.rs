//! Guideline exceedance
//!
//! Converts raw concentrations into zero-floored exceedance ratios against
//! fixed WHO guideline limits.

use serde::{Deserialize, Serialize};

use crate::types::{Exceedance, Pollutant, Reading};

/// WHO PM2.5 guideline (µg/m³)
pub const PM25_GUIDELINE: f64 = 15.0;

/// WHO PM10 guideline (µg/m³)
pub const PM10_GUIDELINE: f64 = 45.0;

/// Reference limits per pollutant (µg/m³)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuidelineLimits {
    #[serde(rename = "PM2_5")]
    pub pm2_5: f64,
    #[serde(rename = "PM10")]
    pub pm10: f64,
}

impl Default for GuidelineLimits {
    fn default() -> Self {
        Self {
            pm2_5: PM25_GUIDELINE,
            pm10: PM10_GUIDELINE,
        }
    }
}

impl GuidelineLimits {
    pub fn limit(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Pm25 => self.pm2_5,
            Pollutant::Pm10 => self.pm10,
        }
    }
}

/// `max(0, concentration / limit - 1)`
pub fn exceedance_ratio(concentration: f64, limit: f64) -> f64 {
    (concentration / limit - 1.0).max(0.0)
}

/// Exceedance ratios of every tracked pollutant in a reading
pub fn evaluate(reading: &Reading, limits: &GuidelineLimits) -> Exceedance {
    Exceedance {
        pm2_5: exceedance_ratio(reading.pm2_5, limits.pm2_5),
        pm10: exceedance_ratio(reading.pm10, limits.pm10),
    }
}
