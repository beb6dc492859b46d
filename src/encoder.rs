//! Report encoding
//!
//! This module encodes hotspot reports for the reporting stage:
//! - Flat CSV, one row per hotspot, month breakdown dropped
//! - JSON envelope with producer metadata and nested month data

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

use crate::error::HotspotError;
use crate::summary::PopulationSummary;
use crate::types::{HotspotRecord, HotspotReport};
use crate::{AIRSPOT_VERSION, PRODUCER_NAME};

/// Column order of the flat CSV export
pub const CSV_COLUMNS: [&str; 9] = [
    "lat",
    "lon",
    "avg_value",
    "max_value",
    "days_total",
    "days_high_pollution",
    "consistency",
    "readings_count",
    "peak_hour",
];

/// Flat hotspot row
#[derive(Debug, Clone, Serialize)]
struct HotspotRow {
    lat: f64,
    lon: f64,
    avg_value: f64,
    max_value: f64,
    days_total: usize,
    days_high_pollution: usize,
    consistency: f64,
    readings_count: usize,
    peak_hour: u32,
}

impl From<&HotspotRecord> for HotspotRow {
    fn from(h: &HotspotRecord) -> Self {
        Self {
            lat: h.lat,
            lon: h.lon,
            avg_value: h.avg_value,
            max_value: h.max_value,
            days_total: h.days_total,
            days_high_pollution: h.days_high_pollution,
            consistency: h.consistency,
            readings_count: h.readings_count,
            peak_hour: h.peak_hour,
        }
    }
}

/// Producer metadata stamped on JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub run_id: String,
}

/// Complete JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub producer: ReportProducer,
    pub generated_at_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PopulationSummary>,
    pub reports: Vec<HotspotReport>,
}

/// Encoder for hotspot reports
pub struct ReportEncoder {
    run_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique run ID
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific run ID
    pub fn with_run_id(run_id: String) -> Self {
        Self { run_id }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Wrap reports in an envelope
    pub fn encode(
        &self,
        reports: &[HotspotReport],
        summary: Option<&PopulationSummary>,
    ) -> ReportEnvelope {
        ReportEnvelope {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: AIRSPOT_VERSION.to_string(),
                run_id: self.run_id.clone(),
            },
            generated_at_utc: Utc::now().to_rfc3339(),
            summary: summary.cloned(),
            reports: reports.to_vec(),
        }
    }

    /// Encode to a JSON string
    pub fn encode_to_json(
        &self,
        reports: &[HotspotReport],
        summary: Option<&PopulationSummary>,
        pretty: bool,
    ) -> Result<String, HotspotError> {
        let envelope = self.encode(reports, summary);
        let json = if pretty {
            serde_json::to_string_pretty(&envelope)
        } else {
            serde_json::to_string(&envelope)
        };
        json.map_err(HotspotError::JsonError)
    }

    /// Write hotspots as flat CSV rows. The header is always written, even
    /// for an empty table.
    pub fn write_csv<W: Write>(hotspots: &[HotspotRecord], writer: W) -> Result<(), HotspotError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(CSV_COLUMNS)?;
        for hotspot in hotspots {
            csv_writer.serialize(HotspotRow::from(hotspot))?;
        }
        csv_writer
            .flush()
            .map_err(|e| HotspotError::EncodingError(e.to_string()))
    }

    /// Encode hotspots as a CSV string
    pub fn encode_to_csv(hotspots: &[HotspotRecord]) -> Result<String, HotspotError> {
        let mut buffer = Vec::new();
        Self::write_csv(hotspots, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| HotspotError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metric, MonthlyStats, TimeBucket};
    use pretty_assertions::assert_eq;

    fn sample_report() -> HotspotReport {
        HotspotReport {
            metric: Metric::PollutionScore,
            percentile: 88.0,
            time_filter: Some(TimeBucket::Peak),
            threshold: Some(1.25),
            population: 420,
            cells_examined: 12,
            hotspots: vec![HotspotRecord {
                lat: 25.318,
                lon: 82.973,
                avg_value: 2.5,
                max_value: 4.0,
                days_total: 9,
                days_high_pollution: 6,
                consistency: 0.75,
                readings_count: 40,
                peak_hour: 9,
                month_data: vec![MonthlyStats {
                    month: "January".to_string(),
                    avg: 2.5,
                    max: 4.0,
                    readings: 40,
                }],
            }],
        }
    }

    #[test]
    fn test_csv_rows() {
        let csv = ReportEncoder::encode_to_csv(&sample_report().hotspots).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "lat,lon,avg_value,max_value,days_total,days_high_pollution,consistency,readings_count,peak_hour"
        );
        assert_eq!(lines[1], "25.318,82.973,2.5,4.0,9,6,0.75,40,9");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_csv_empty_table_has_header() {
        let csv = ReportEncoder::encode_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("lat,lon,"));
    }

    #[test]
    fn test_json_envelope() {
        let encoder = ReportEncoder::with_run_id("run-1".to_string());
        let json = encoder
            .encode_to_json(&[sample_report()], None, false)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["producer"]["name"], "airspot");
        assert_eq!(value["producer"]["run_id"], "run-1");
        assert!(value.get("summary").is_none());

        let report = &value["reports"][0];
        assert_eq!(report["metric"], "pollution_score");
        assert_eq!(report["time_filter"], "peak");
        assert_eq!(report["threshold"], 1.25);
        assert_eq!(report["hotspots"][0]["month_data"][0]["month"], "January");
        assert_eq!(report["hotspots"][0]["peak_hour"], 9);
    }

    #[test]
    fn test_new_encoders_get_distinct_run_ids() {
        assert_ne!(ReportEncoder::new().run_id(), ReportEncoder::new().run_id());
    }
}
