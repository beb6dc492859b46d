//! Reading input schema
//!
//! This module defines the tabular input contract (CSV or NDJSON rows) and
//! the adapter that cleans it into validated readings.

mod adapter;
mod record;

pub use adapter::*;
pub use record::*;
