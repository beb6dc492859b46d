//! Reading input record schema
//!
//! One row of a cleaned sensor export. Column names follow the Air View+
//! hourly dataset: `local_time`, `latitude`, `longitude`, `PM2_5`, `PM10`,
//! plus optional `city` and `state` used for region filtering. Every value is
//! optional at this layer; a record only becomes a [`Reading`] once all
//! required fields are present and valid.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::Reading;

/// Accepted `local_time` layouts, tried in order
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Columns a CSV header must carry
pub const REQUIRED_COLUMNS: [&str; 5] = ["local_time", "latitude", "longitude", "PM2_5", "PM10"];

/// Raw input row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    #[serde(default)]
    pub local_time: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
    #[serde(rename = "PM2_5", default, deserialize_with = "csv::invalid_option")]
    pub pm2_5: Option<f64>,
    #[serde(rename = "PM10", default, deserialize_with = "csv::invalid_option")]
    pub pm10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl ReadingRecord {
    /// Convert to a validated reading
    pub fn to_reading(&self) -> Result<Reading, ValidationError> {
        let local_time = present(self.local_time.as_deref().map(str::trim), "local_time")?;
        let timestamp = parse_local_time(local_time)?;

        let reading = Reading {
            timestamp,
            latitude: present(self.latitude, "latitude")?,
            longitude: present(self.longitude, "longitude")?,
            pm2_5: present(self.pm2_5, "PM2_5")?,
            pm10: present(self.pm10, "PM10")?,
        };
        reading.validate()?;
        Ok(reading)
    }
}

fn present<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

/// Parse a local timestamp in any of [`TIMESTAMP_FORMATS`]
pub fn parse_local_time(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField("local_time"));
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| ValidationError::InvalidTimestamp(value.to_string()))
}

impl Reading {
    /// Check coordinates and concentrations are usable
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("PM2_5", self.pm2_5),
            ("PM10", self.pm10),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field });
            }
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::LongitudeOutOfRange(self.longitude));
        }

        for (field, value) in [("PM2_5", self.pm2_5), ("PM10", self.pm10)] {
            if value < 0.0 {
                return Err(ValidationError::NegativeConcentration { field, value });
            }
        }

        Ok(())
    }
}

/// Keeps records from one city and/or state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionFilter {
    pub city: Option<String>,
    pub state: Option<String>,
}

impl RegionFilter {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none()
    }

    /// Case-insensitive match on trimmed values. A record without the
    /// column never matches a filter on it.
    pub fn matches(&self, record: &ReadingRecord) -> bool {
        field_matches(self.city.as_deref(), record.city.as_deref())
            && field_matches(self.state.as_deref(), record.state.as_deref())
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(w), Some(a)) => w.trim().to_lowercase() == a.trim().to_lowercase(),
        (Some(_), None) => false,
    }
}

/// Validation errors for input records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unparseable local_time: {0}")]
    InvalidTimestamp(String),

    #[error("Non-finite value in {field}")]
    NonFinite { field: &'static str },

    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),

    #[error("Negative concentration in {field}: {value}")]
    NegativeConcentration { field: &'static str, value: f64 },
}
