//! Composite pollution score
//!
//! Combines per-pollutant exceedance ratios into one severity scalar using a
//! fixed convex weighting.

use serde::{Deserialize, Serialize};

use crate::error::HotspotError;
use crate::types::Exceedance;

/// Tolerance when checking that weights sum to one
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Weight of each pollutant's exceedance in the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(rename = "PM2_5")]
    pub pm2_5: f64,
    #[serde(rename = "PM10")]
    pub pm10: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            pm2_5: 0.6,
            pm10: 0.4,
        }
    }
}

impl ScoreWeights {
    /// Weights must be finite, non-negative and sum to one
    pub fn validate(&self) -> Result<(), HotspotError> {
        for (name, w) in [("PM2_5", self.pm2_5), ("PM10", self.pm10)] {
            if !w.is_finite() || w < 0.0 {
                return Err(HotspotError::InvalidConfig(format!(
                    "score weight for {name} must be a non-negative number, got {w}"
                )));
            }
        }

        let sum = self.pm2_5 + self.pm10;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(HotspotError::InvalidConfig(format!(
                "score weights must sum to 1, got {sum}"
            )));
        }

        Ok(())
    }
}

/// Weighted sum of exceedance ratios
pub fn compose(exceedance: &Exceedance, weights: &ScoreWeights) -> f64 {
    weights.pm2_5 * exceedance.pm2_5 + weights.pm10 * exceedance.pm10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_only_when_all_zero() {
        let weights = ScoreWeights::default();
        assert_eq!(compose(&Exceedance::default(), &weights), 0.0);

        let only_pm10 = Exceedance { pm2_5: 0.0, pm10: 0.5 };
        assert!(compose(&only_pm10, &weights) > 0.0);
    }

    #[test]
    fn test_reference_weighting() {
        let exceedance = Exceedance { pm2_5: 1.0, pm10: 1.0 };
        assert!((compose(&exceedance, &ScoreWeights::default()) - 1.0).abs() < 1e-12);

        let exceedance = Exceedance { pm2_5: 2.0, pm10: 0.5 };
        // 0.6 * 2.0 + 0.4 * 0.5 = 1.4
        assert!((compose(&exceedance, &ScoreWeights::default()) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_monotonic_in_each_pollutant() {
        let weights = ScoreWeights::default();
        let steps = [0.0, 0.1, 0.5, 1.0, 2.5, 10.0];

        for fixed in steps {
            let mut prev_fine = f64::MIN;
            let mut prev_coarse = f64::MIN;
            for x in steps {
                let fine = compose(&Exceedance { pm2_5: x, pm10: fixed }, &weights);
                let coarse = compose(&Exceedance { pm2_5: fixed, pm10: x }, &weights);
                assert!(fine >= prev_fine);
                assert!(coarse >= prev_coarse);
                prev_fine = fine;
                prev_coarse = coarse;
            }
        }
    }

    #[test]
    fn test_weight_validation() {
        assert!(ScoreWeights::default().validate().is_ok());
        assert!(ScoreWeights { pm2_5: 0.7, pm10: 0.4 }.validate().is_err());
        assert!(ScoreWeights { pm2_5: 1.2, pm10: -0.2 }.validate().is_err());
        assert!(ScoreWeights { pm2_5: f64::NAN, pm10: 0.4 }.validate().is_err());
    }
}
