//! Core types for the Airspot pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: validated readings, derived readings, grid cells, and hotspot output.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HotspotError;

/// Tracked pollutants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "PM2_5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
}

impl Pollutant {
    pub const ALL: [Pollutant; 2] = [Pollutant::Pm25, Pollutant::Pm10];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2_5",
            Pollutant::Pm10 => "PM10",
        }
    }
}

/// Peak / off-peak classification of a reading's local hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Peak,
    OffPeak,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Peak => "peak",
            TimeBucket::OffPeak => "off_peak",
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeBucket {
    type Err = HotspotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "peak" => Ok(TimeBucket::Peak),
            "off_peak" | "offpeak" => Ok(TimeBucket::OffPeak),
            other => Err(HotspotError::ParseError(format!(
                "unknown time bucket '{other}' (expected peak or off_peak)"
            ))),
        }
    }
}

/// Air quality category, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    /// Human-readable report label
    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

/// Scalar field of a derived reading that the detector can threshold on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    PollutionScore,
    #[serde(rename = "PM2_5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "PM2_5_exceedance")]
    Pm25Exceedance,
    #[serde(rename = "PM10_exceedance")]
    Pm10Exceedance,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::PollutionScore => "pollution_score",
            Metric::Pm25 => "PM2_5",
            Metric::Pm10 => "PM10",
            Metric::Pm25Exceedance => "PM2_5_exceedance",
            Metric::Pm10Exceedance => "PM10_exceedance",
        }
    }

    /// Read this metric off a derived reading
    pub fn value_of(&self, reading: &DerivedReading) -> f64 {
        match self {
            Metric::PollutionScore => reading.pollution_score,
            Metric::Pm25 => reading.reading.pm2_5,
            Metric::Pm10 => reading.reading.pm10,
            Metric::Pm25Exceedance => reading.exceedance.pm2_5,
            Metric::Pm10Exceedance => reading.exceedance.pm10,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = HotspotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pollution_score" => Ok(Metric::PollutionScore),
            "PM2_5" | "pm2_5" => Ok(Metric::Pm25),
            "PM10" | "pm10" => Ok(Metric::Pm10),
            "PM2_5_exceedance" | "pm2_5_exceedance" => Ok(Metric::Pm25Exceedance),
            "PM10_exceedance" | "pm10_exceedance" => Ok(Metric::Pm10Exceedance),
            other => Err(HotspotError::UnknownMetric(other.to_string())),
        }
    }
}

/// One validated sensor observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Local observation time
    pub timestamp: NaiveDateTime,
    /// Latitude (decimal degrees)
    pub latitude: f64,
    /// Longitude (decimal degrees)
    pub longitude: f64,
    /// Fine particulate concentration (µg/m³)
    pub pm2_5: f64,
    /// Coarse particulate concentration (µg/m³)
    pub pm10: f64,
}

impl Reading {
    pub fn concentration(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Pm25 => self.pm2_5,
            Pollutant::Pm10 => self.pm10,
        }
    }
}

/// Per-pollutant exceedance ratios
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Exceedance {
    pub pm2_5: f64,
    pub pm10: f64,
}

/// Grid cell identity: coordinates rounded to `precision` decimal places,
/// stored as integer multiples of 10^-precision so equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    lat_units: i64,
    lon_units: i64,
    precision: u32,
}

impl CellKey {
    pub(crate) fn from_units(lat_units: i64, lon_units: i64, precision: u32) -> Self {
        Self {
            lat_units,
            lon_units,
            precision,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Rounded latitude of the cell
    pub fn lat(&self) -> f64 {
        self.lat_units as f64 / 10f64.powi(self.precision as i32)
    }

    /// Rounded longitude of the cell
    pub fn lon(&self) -> f64 {
        self.lon_units as f64 / 10f64.powi(self.precision as i32)
    }
}

impl fmt::Display for CellKey {
    /// Coordinates printed at the cell's own precision
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.precision() as usize;
        write!(f, "({:.*}, {:.*})", digits, self.lat(), digits, self.lon())
    }
}

/// A reading with all per-row fields computed once
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedReading {
    pub reading: Reading,
    pub day: NaiveDate,
    pub hour: u32,
    pub weekday: Weekday,
    /// Calendar month (1-12)
    pub month: u32,
    pub time_bucket: TimeBucket,
    pub exceedance: Exceedance,
    pub pollution_score: f64,
    pub aqi_category: AqiCategory,
    pub cell: CellKey,
}

impl DerivedReading {
    /// English month name, e.g. "January"
    pub fn month_name(&self) -> String {
        self.day.format("%B").to_string()
    }
}

/// Metric aggregates for one calendar month within a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: String,
    pub avg: f64,
    pub max: f64,
    pub readings: usize,
}

/// A grid cell that qualified as a persistent hotspot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRecord {
    pub lat: f64,
    pub lon: f64,
    pub avg_value: f64,
    pub max_value: f64,
    pub days_total: usize,
    pub days_high_pollution: usize,
    pub consistency: f64,
    pub readings_count: usize,
    pub peak_hour: u32,
    /// Ordered January to December
    pub month_data: Vec<MonthlyStats>,
}

impl HotspotRecord {
    /// Look up the breakdown for a month by name
    pub fn month(&self, name: &str) -> Option<&MonthlyStats> {
        self.month_data
            .iter()
            .find(|m| m.month.eq_ignore_ascii_case(name))
    }
}

/// Result of one detector invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotReport {
    pub metric: Metric,
    pub percentile: f64,
    pub time_filter: Option<TimeBucket>,
    /// Global threshold for this run; absent when the population was empty
    pub threshold: Option<f64>,
    pub population: usize,
    pub cells_examined: usize,
    pub hotspots: Vec<HotspotRecord>,
}

impl HotspotReport {
    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }
}
