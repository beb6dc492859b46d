//! Error types for Airspot

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors that can occur during ingestion or detection
#[derive(Debug, Error)]
pub enum HotspotError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid reading: {0}")]
    InvalidReading(#[from] ValidationError),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Non-finite {metric} value at reading {index}")]
    NonFiniteMetric { metric: String, index: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
