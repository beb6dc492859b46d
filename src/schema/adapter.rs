//! Adapter for turning input records into validated readings
//!
//! Parses CSV or NDJSON exports into [`ReadingRecord`]s, applies the optional
//! region filter, and drops rows that cannot take part in the analysis.

use log::{debug, warn};
use std::io;

use crate::error::HotspotError;
use crate::schema::record::{ReadingRecord, RegionFilter, ValidationError, REQUIRED_COLUMNS};
use crate::types::Reading;

/// Adapter for converting input records to readings
pub struct ReadingAdapter;

impl ReadingAdapter {
    /// Parse a CSV export with a header row. Unknown columns are ignored and
    /// unparseable numeric cells are treated as missing, as are the trailing
    /// cells of a short row.
    ///
    /// Fails with [`HotspotError::MissingField`] if the header lacks any of
    /// [`REQUIRED_COLUMNS`].
    pub fn parse_csv<R: io::Read>(reader: R) -> Result<Vec<ReadingRecord>, HotspotError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?;
        if let Some(column) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|h| h == **column))
        {
            return Err(HotspotError::MissingField(column.to_string()));
        }

        let mut records = Vec::new();
        for row in csv_reader.deserialize::<ReadingRecord>() {
            records.push(row?);
        }
        Ok(records)
    }

    /// Parse CSV held in memory
    pub fn parse_csv_str(input: &str) -> Result<Vec<ReadingRecord>, HotspotError> {
        Self::parse_csv(input.as_bytes())
    }

    /// Parse NDJSON (one record object per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ReadingRecord>, HotspotError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ReadingRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(HotspotError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Keep records inside the region and convert them to readings.
    ///
    /// Records missing a required field or holding an invalid value are
    /// dropped and reported, never passed on.
    pub fn clean(records: &[ReadingRecord], region: Option<&RegionFilter>) -> CleanedReadings {
        let mut readings = Vec::with_capacity(records.len());
        let mut dropped = Vec::new();
        let mut outside_region = 0;

        for (index, record) in records.iter().enumerate() {
            if let Some(filter) = region {
                if !filter.matches(record) {
                    outside_region += 1;
                    continue;
                }
            }

            match record.to_reading() {
                Ok(reading) => readings.push(reading),
                Err(error) => {
                    debug!("Dropping record {index}: {error}");
                    dropped.push(ValidationResult { index, error });
                }
            }
        }

        if !dropped.is_empty() {
            warn!(
                "Dropped {} of {} records with missing or invalid values",
                dropped.len(),
                records.len()
            );
        }

        CleanedReadings {
            readings,
            outside_region,
            dropped,
        }
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[ReadingRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record
                    .to_reading()
                    .err()
                    .map(|error| ValidationResult { index, error })
            })
            .collect()
    }
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Zero-based record index (header excluded)
    pub index: usize,
    pub error: ValidationError,
}

/// Outcome of cleaning a batch of records
#[derive(Debug, Clone)]
pub struct CleanedReadings {
    pub readings: Vec<Reading>,
    /// Records skipped by the region filter
    pub outside_region: usize,
    /// Records dropped for missing or invalid values
    pub dropped: Vec<ValidationResult>,
}
