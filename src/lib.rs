//! Airspot - persistent air-quality hotspot identification
//!
//! Airspot turns geolocated PM2.5/PM10 readings into a ranked table of grid
//! cells that exceed a pollution threshold on many distinct days, through a
//! deterministic pipeline: input adaptation → per-reading derivation
//! (exceedance, composite score, grid cell, time bucket, AQI category) →
//! hotspot detection → report encoding.
//!
//! ## Modules
//!
//! - **Derivation**: `exceedance`, `score`, `grid`, `temporal`, `category`, `deriver`
//! - **Detection**: `detector`, with `stats` for percentiles and means
//! - **Plumbing**: `schema` (input), `encoder` (output), `summary`, `pipeline`

pub mod category;
pub mod config;
pub mod deriver;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod exceedance;
pub mod grid;
pub mod pipeline;
pub mod schema;
pub mod score;
pub mod stats;
pub mod summary;
pub mod temporal;
pub mod types;

pub use config::{AnalysisConfig, DetectionParams};
pub use detector::{HotspotDetector, MIN_CELL_READINGS};
pub use error::HotspotError;
pub use pipeline::{analyze_csv, Analysis, HotspotAnalyzer};

// Schema exports
pub use schema::{ReadingAdapter, ReadingRecord, RegionFilter};

pub use types::{
    AqiCategory, CellKey, DerivedReading, HotspotRecord, HotspotReport, Metric, MonthlyStats,
    Reading, TimeBucket,
};

/// Airspot version embedded in JSON reports
pub const AIRSPOT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for JSON reports
pub const PRODUCER_NAME: &str = "airspot";
