//! Temporal segmentation
//!
//! Tags each reading's local hour as peak or off-peak traffic time.

use serde::{Deserialize, Serialize};

use crate::error::HotspotError;
use crate::types::TimeBucket;

/// Half-open hour range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour < self.end
    }
}

/// Morning rush, 08:00-11:00
pub const MORNING_PEAK: HourWindow = HourWindow::new(8, 11);

/// Evening rush, 17:00-20:00
pub const EVENING_PEAK: HourWindow = HourWindow::new(17, 20);

/// Default peak windows
pub fn default_peak_windows() -> Vec<HourWindow> {
    vec![MORNING_PEAK, EVENING_PEAK]
}

/// Classify an hour of day against the peak windows
pub fn segment(hour: u32, peak_windows: &[HourWindow]) -> TimeBucket {
    if peak_windows.iter().any(|w| w.contains(hour)) {
        TimeBucket::Peak
    } else {
        TimeBucket::OffPeak
    }
}

/// Windows must satisfy `start < end <= 24`
pub fn validate_windows(peak_windows: &[HourWindow]) -> Result<(), HotspotError> {
    for w in peak_windows {
        if w.start >= w.end || w.end > 24 {
            return Err(HotspotError::InvalidConfig(format!(
                "peak window [{}, {}) must satisfy start < end <= 24",
                w.start, w.end
            )));
        }
    }
    Ok(())
}
