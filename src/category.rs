//! Air quality category classification
//!
//! Maps a single PM2.5 concentration to one of six ordered labels. Breakpoints
//! are integer multiples (1x to 5x) of the base guideline limit. Descriptive
//! only; the detector never reads it.

use crate::types::AqiCategory;

/// Classify a concentration against multiples of `base_limit`.
///
/// Each breakpoint is an inclusive upper bound.
pub fn classify(concentration: f64, base_limit: f64) -> AqiCategory {
    if concentration <= base_limit {
        AqiCategory::Good
    } else if concentration <= 2.0 * base_limit {
        AqiCategory::Moderate
    } else if concentration <= 3.0 * base_limit {
        AqiCategory::UnhealthyForSensitiveGroups
    } else if concentration <= 4.0 * base_limit {
        AqiCategory::Unhealthy
    } else if concentration <= 5.0 * base_limit {
        AqiCategory::VeryUnhealthy
    } else {
        AqiCategory::Hazardous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceedance::PM25_GUIDELINE;

    #[test]
    fn test_reference_breakpoints() {
        let cases = [
            (0.0, AqiCategory::Good),
            (15.0, AqiCategory::Good),
            (15.1, AqiCategory::Moderate),
            (30.0, AqiCategory::Moderate),
            (45.0, AqiCategory::UnhealthyForSensitiveGroups),
            (45.5, AqiCategory::Unhealthy),
            (60.0, AqiCategory::Unhealthy),
            (75.0, AqiCategory::VeryUnhealthy),
            (75.01, AqiCategory::Hazardous),
            (500.0, AqiCategory::Hazardous),
        ];

        for (concentration, expected) in cases {
            assert_eq!(
                classify(concentration, PM25_GUIDELINE),
                expected,
                "concentration {concentration}"
            );
        }
    }

    #[test]
    fn test_monotonic() {
        let mut prev = AqiCategory::Good;
        for i in 0..200 {
            let category = classify(i as f64 * 0.5, PM25_GUIDELINE);
            assert!(category >= prev);
            prev = category;
        }
    }
}
