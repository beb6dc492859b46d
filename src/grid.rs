//! Spatial binning
//!
//! Quantizes coordinates into grid cells by rounding latitude and longitude
//! independently to a fixed number of decimal places.

use crate::types::CellKey;

/// Default rounding precision (3 decimal places, roughly a 110 m grid)
pub const DEFAULT_GRID_PRECISION: u32 = 3;

/// Largest precision whose scaled coordinates still fit comfortably in i64
pub const MAX_GRID_PRECISION: u32 = 9;

/// Map a coordinate pair to its grid cell.
///
/// Halfway values round to even, matching numpy's `round`.
pub fn cell_for(latitude: f64, longitude: f64, precision: u32) -> CellKey {
    let scale = 10f64.powi(precision as i32);
    CellKey::from_units(
        (latitude * scale).round_ties_even() as i64,
        (longitude * scale).round_ties_even() as i64,
        precision,
    )
}
