//! Pipeline orchestration
//!
//! This module provides the public API for Airspot. It runs the full pipeline
//! from cleaned readings to ranked hotspot reports: one global detection plus
//! a peak and an off-peak re-run over the same derived population.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, DetectionParams};
use crate::detector::HotspotDetector;
use crate::deriver::ReadingDeriver;
use crate::error::HotspotError;
use crate::schema::{ReadingAdapter, RegionFilter};
use crate::summary::PopulationSummary;
use crate::types::{DerivedReading, HotspotReport, Reading, TimeBucket};

/// Full result of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: PopulationSummary,
    pub overall: HotspotReport,
    pub peak: HotspotReport,
    pub off_peak: HotspotReport,
}

impl Analysis {
    /// Reports in presentation order
    pub fn reports(&self) -> [&HotspotReport; 3] {
        [&self.overall, &self.peak, &self.off_peak]
    }
}

/// Run the full analysis over a CSV export.
///
/// # Arguments
/// * `csv` - CSV text with `local_time,latitude,longitude,PM2_5,PM10` columns
/// * `region` - Optional city/state filter
/// * `config` - Analysis configuration
///
/// # Example
/// ```ignore
/// let analysis = analyze_csv(&csv, None, &AnalysisConfig::default())?;
/// println!("{} hotspots", analysis.overall.hotspots.len());
/// ```
pub fn analyze_csv(
    csv: &str,
    region: Option<&RegionFilter>,
    config: &AnalysisConfig,
) -> Result<Analysis, HotspotError> {
    let records = ReadingAdapter::parse_csv_str(csv)?;
    let cleaned = ReadingAdapter::clean(&records, region);
    info!(
        "Data shape after cleaning: {} readings ({} dropped, {} outside region)",
        cleaned.readings.len(),
        cleaned.dropped.len(),
        cleaned.outside_region
    );

    HotspotAnalyzer::new(config.clone())?.analyze(&cleaned.readings)
}

/// Analyzer bound to one validated configuration
pub struct HotspotAnalyzer {
    config: AnalysisConfig,
}

impl HotspotAnalyzer {
    /// Create an analyzer; fails if the configuration is invalid
    pub fn new(config: AnalysisConfig) -> Result<Self, HotspotError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Validate and derive the population once
    pub fn derive(&self, readings: &[Reading]) -> Result<Vec<DerivedReading>, HotspotError> {
        ReadingDeriver::derive_all(readings, &self.config)
    }

    /// Run the detector with explicit parameters
    pub fn detect(
        &self,
        population: &[DerivedReading],
        params: &DetectionParams,
    ) -> Result<HotspotReport, HotspotError> {
        HotspotDetector::detect(population, params)
    }

    /// Run the detector with the configured parameters, optionally
    /// restricted to one time bucket
    pub fn detect_bucket(
        &self,
        population: &[DerivedReading],
        bucket: Option<TimeBucket>,
    ) -> Result<HotspotReport, HotspotError> {
        let params = DetectionParams {
            time_filter: bucket,
            ..self.config.detection.clone()
        };
        HotspotDetector::detect(population, &params)
    }

    /// Summary plus global, peak and off-peak detections
    pub fn analyze(&self, readings: &[Reading]) -> Result<Analysis, HotspotError> {
        let population = self.derive(readings)?;
        let summary = PopulationSummary::compute(&population, &self.config.limits);

        let overall = self.detect_bucket(&population, None)?;
        let peak = self.detect_bucket(&population, Some(TimeBucket::Peak))?;
        let off_peak = self.detect_bucket(&population, Some(TimeBucket::OffPeak))?;

        info!(
            "Hotspots: {} overall, {} peak, {} off-peak",
            overall.hotspots.len(),
            peak.hotspots.len(),
            off_peak.hotspots.len()
        );

        Ok(Analysis {
            summary,
            overall,
            peak,
            off_peak,
        })
    }
}
