//! Hotspot detection
//!
//! Finds grid cells whose metric exceeds a per-run percentile threshold on a
//! large share of the distinct days they were observed, and ranks them.
//!
//! Detection stages:
//! 1. Optional time-bucket filter (an empty result is not an error)
//! 2. Global threshold = percentile of the metric over the filtered population
//! 3. Grouping by grid cell, in cell order
//! 4. Per-cell persistence statistics and qualification
//! 5. Stable ranking by consistency, then mean value

use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::DetectionParams;
use crate::error::HotspotError;
use crate::stats;
use crate::types::{CellKey, DerivedReading, HotspotRecord, HotspotReport, MonthlyStats};

/// Cells with fewer readings than this are never reported
pub const MIN_CELL_READINGS: usize = 10;

/// Detector for persistent pollution hotspots
pub struct HotspotDetector;

impl HotspotDetector {
    /// Run one detection over a derived population.
    ///
    /// The threshold is recomputed from whatever population remains after the
    /// time filter, so peak and off-peak runs each get their own threshold.
    pub fn detect(
        population: &[DerivedReading],
        params: &DetectionParams,
    ) -> Result<HotspotReport, HotspotError> {
        params.validate()?;

        let filtered: Vec<&DerivedReading> = match params.time_filter {
            Some(bucket) => population
                .iter()
                .filter(|r| r.time_bucket == bucket)
                .collect(),
            None => population.iter().collect(),
        };

        let values: Vec<f64> = filtered.iter().map(|r| params.metric.value_of(r)).collect();
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(HotspotError::NonFiniteMetric {
                metric: params.metric.to_string(),
                index,
            });
        }

        let Some(threshold) = stats::percentile(&values, params.percentile) else {
            info!(
                "No readings available for time category {}",
                params
                    .time_filter
                    .map(|b| b.as_str())
                    .unwrap_or("all")
            );
            return Ok(HotspotReport {
                metric: params.metric,
                percentile: params.percentile,
                time_filter: params.time_filter,
                threshold: None,
                population: 0,
                cells_examined: 0,
                hotspots: Vec::new(),
            });
        };

        info!(
            "Threshold for {} (percentile {}): {:.2}",
            params.metric, params.percentile, threshold
        );

        let mut cells: BTreeMap<CellKey, Vec<(&DerivedReading, f64)>> = BTreeMap::new();
        for (reading, value) in filtered.iter().zip(&values) {
            cells.entry(reading.cell).or_default().push((*reading, *value));
        }

        let mut hotspots = Vec::new();
        for (key, members) in &cells {
            if members.len() < MIN_CELL_READINGS {
                debug!(
                    "Skipping cell {}: {} readings",
                    key,
                    members.len()
                );
                continue;
            }

            let persistence = Persistence::measure(members, threshold);
            if persistence.days_total >= params.min_days_total
                && persistence.consistency >= params.min_consistency
            {
                hotspots.push(build_record(key, members, &persistence));
            } else {
                debug!(
                    "Cell {} not persistent: {}/{} high days",
                    key,
                    persistence.days_high,
                    persistence.days_total
                );
            }
        }

        rank_hotspots(&mut hotspots);

        info!(
            "Found {} hotspots among {} cells ({} readings)",
            hotspots.len(),
            cells.len(),
            filtered.len()
        );

        Ok(HotspotReport {
            metric: params.metric,
            percentile: params.percentile,
            time_filter: params.time_filter,
            threshold: Some(threshold),
            population: filtered.len(),
            cells_examined: cells.len(),
            hotspots,
        })
    }
}

/// Day-level persistence of one cell
struct Persistence {
    days_total: usize,
    days_high: usize,
    consistency: f64,
}

impl Persistence {
    fn measure(members: &[(&DerivedReading, f64)], threshold: f64) -> Self {
        let all_days: BTreeSet<NaiveDate> = members.iter().map(|(r, _)| r.day).collect();
        let high_days: BTreeSet<NaiveDate> = members
            .iter()
            .filter(|(_, v)| *v > threshold)
            .map(|(r, _)| r.day)
            .collect();

        let days_total = all_days.len();
        let days_high = high_days.len();
        let consistency = if days_total > 0 {
            days_high as f64 / days_total as f64
        } else {
            0.0
        };

        Self {
            days_total,
            days_high,
            consistency,
        }
    }
}

fn build_record(
    key: &CellKey,
    members: &[(&DerivedReading, f64)],
    persistence: &Persistence,
) -> HotspotRecord {
    let values: Vec<f64> = members.iter().map(|(_, v)| *v).collect();

    HotspotRecord {
        lat: key.lat(),
        lon: key.lon(),
        avg_value: stats::mean(&values).unwrap_or(0.0),
        max_value: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        days_total: persistence.days_total,
        days_high_pollution: persistence.days_high,
        consistency: persistence.consistency,
        readings_count: members.len(),
        peak_hour: most_frequent_hour(members),
        month_data: monthly_breakdown(members),
    }
}

/// Hour of day with the most readings; ties go to the earliest hour
fn most_frequent_hour(members: &[(&DerivedReading, f64)]) -> u32 {
    let mut counts = [0usize; 24];
    for (reading, _) in members {
        counts[reading.hour as usize % 24] += 1;
    }

    let mut best = 0;
    for hour in 1..24 {
        if counts[hour] > counts[best] {
            best = hour;
        }
    }
    best as u32
}

struct MonthAccumulator {
    name: String,
    sum: f64,
    max: f64,
    count: usize,
}

fn monthly_breakdown(members: &[(&DerivedReading, f64)]) -> Vec<MonthlyStats> {
    let mut months: BTreeMap<u32, MonthAccumulator> = BTreeMap::new();

    for (reading, value) in members {
        let acc = months
            .entry(reading.month)
            .or_insert_with(|| MonthAccumulator {
                name: reading.month_name(),
                sum: 0.0,
                max: f64::NEG_INFINITY,
                count: 0,
            });
        acc.sum += value;
        acc.max = acc.max.max(*value);
        acc.count += 1;
    }

    months
        .into_values()
        .map(|acc| MonthlyStats {
            avg: acc.sum / acc.count as f64,
            max: acc.max,
            readings: acc.count,
            month: acc.name,
        })
        .collect()
}

/// Descending by consistency, then by mean value. The sort is stable, so
/// exact ties keep cell order.
pub(crate) fn rank_hotspots(hotspots: &mut [HotspotRecord]) {
    hotspots.sort_by(|a, b| {
        b.consistency
            .total_cmp(&a.consistency)
            .then_with(|| b.avg_value.total_cmp(&a.avg_value))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::deriver::ReadingDeriver;
    use crate::types::{Metric, Reading, TimeBucket};
    use pretty_assertions::assert_eq;

    const HOT_LAT: f64 = 25.318;
    const HOT_LON: f64 = 82.973;
    const BG_LAT: f64 = 25.400;
    const BG_LON: f64 = 83.100;

    /// Reading on day-of-year `day` of 2024 at `hour`
    fn reading_at(day: u32, hour: u32, lat: f64, lon: f64, pm2_5: f64) -> DerivedReading {
        let reading = Reading {
            timestamp: NaiveDate::from_yo_opt(2024, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            latitude: lat,
            longitude: lon,
            pm2_5,
            pm10: 0.0,
        };
        ReadingDeriver::derive(reading, &AnalysisConfig::default())
    }

    /// Clean readings in a separate cell that pull the threshold down to zero
    fn background(count: u32) -> Vec<DerivedReading> {
        (0..count)
            .map(|i| reading_at(i % 30 + 1, 3, BG_LAT, BG_LON, 5.0))
            .collect()
    }

    fn record(consistency: f64, avg_value: f64) -> HotspotRecord {
        HotspotRecord {
            lat: 0.0,
            lon: 0.0,
            avg_value,
            max_value: avg_value,
            days_total: 10,
            days_high_pollution: 8,
            consistency,
            readings_count: 10,
            peak_hour: 0,
            month_data: Vec::new(),
        }
    }

    #[test]
    fn test_cell_below_reading_floor_excluded() {
        let mut population = background(100);
        for day in 1..=9 {
            population.push(reading_at(day, 9, HOT_LAT, HOT_LON, 100.0));
        }

        let report = HotspotDetector::detect(&population, &DetectionParams::default()).unwrap();
        assert_eq!(report.threshold, Some(0.0));
        assert!(report.hotspots.is_empty());
        assert_eq!(report.cells_examined, 2);
    }

    #[test]
    fn test_persistent_cell_included() {
        let mut population = background(100);
        // 4 high days, 3 clean days, 10 readings in total
        for day in 1..=4 {
            population.push(reading_at(day, 9, HOT_LAT, HOT_LON, 60.0));
        }
        for day in 5..=7 {
            population.push(reading_at(day, 14, HOT_LAT, HOT_LON, 10.0));
            population.push(reading_at(day, 15, HOT_LAT, HOT_LON, 12.0));
        }

        let report = HotspotDetector::detect(&population, &DetectionParams::default()).unwrap();
        assert_eq!(report.hotspots.len(), 1);

        let hotspot = &report.hotspots[0];
        assert!((hotspot.lat - HOT_LAT).abs() < 1e-9);
        assert!((hotspot.lon - HOT_LON).abs() < 1e-9);
        assert_eq!(hotspot.readings_count, 10);
        assert_eq!(hotspot.days_total, 7);
        assert_eq!(hotspot.days_high_pollution, 4);
        assert!((hotspot.consistency - 4.0 / 7.0).abs() < 1e-12);

        // score of 60 ug/m3 PM2.5 = 0.6 * 3 = 1.8
        assert!((hotspot.max_value - 1.8).abs() < 1e-12);
        assert!((hotspot.avg_value - 4.0 * 1.8 / 10.0).abs() < 1e-12);
        assert_eq!(hotspot.peak_hour, 9);
    }

    #[test]
    fn test_insufficient_days_excluded() {
        let mut population = background(100);
        // 12 high readings spread over only 6 days
        for i in 0..12 {
            population.push(reading_at(i % 6 + 1, 9, HOT_LAT, HOT_LON, 60.0));
        }

        let report = HotspotDetector::detect(&population, &DetectionParams::default()).unwrap();
        assert!(report.hotspots.is_empty());

        let relaxed = DetectionParams {
            min_days_total: 6,
            ..Default::default()
        };
        let report = HotspotDetector::detect(&population, &relaxed).unwrap();
        assert_eq!(report.hotspots.len(), 1);
        assert_eq!(report.hotspots[0].consistency, 1.0);
    }

    #[test]
    fn test_empty_time_bucket_is_not_an_error() {
        // every reading is at 03:00, so nothing is peak
        let population = background(50);
        let params = DetectionParams::default().for_bucket(TimeBucket::Peak);

        let report = HotspotDetector::detect(&population, &params).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.threshold, None);
        assert_eq!(report.population, 0);
        assert_eq!(report.time_filter, Some(TimeBucket::Peak));
    }

    #[test]
    fn test_empty_population() {
        let report = HotspotDetector::detect(&[], &DetectionParams::default()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.threshold, None);
    }

    #[test]
    fn test_threshold_recomputed_per_bucket() {
        let mut population = Vec::new();
        for day in 1..=20 {
            population.push(reading_at(day, 9, HOT_LAT, HOT_LON, 40.0 + day as f64));
            population.push(reading_at(day, 2, HOT_LAT, HOT_LON, 20.0));
        }

        let params = DetectionParams::default();
        let overall = HotspotDetector::detect(&population, &params).unwrap();
        let peak = HotspotDetector::detect(&population, &params.for_bucket(TimeBucket::Peak)).unwrap();
        let off_peak =
            HotspotDetector::detect(&population, &params.for_bucket(TimeBucket::OffPeak)).unwrap();

        assert_eq!(overall.population, 40);
        assert_eq!(peak.population, 20);
        assert_eq!(off_peak.population, 20);

        let overall_threshold = overall.threshold.unwrap();
        let peak_threshold = peak.threshold.unwrap();
        let off_peak_threshold = off_peak.threshold.unwrap();

        assert!((off_peak_threshold - 0.6 * (20.0 / 15.0 - 1.0)).abs() < 1e-12);
        assert!(off_peak_threshold < overall_threshold);
        assert!(overall_threshold < peak_threshold);

        // every off-peak value equals its own threshold, so no day is high
        assert!(off_peak.hotspots.is_empty());
    }

    #[test]
    fn test_peak_hour_tie_breaks_to_earliest() {
        let mut population = background(100);
        for day in 1..=10 {
            let hour = if day % 2 == 0 { 14 } else { 9 };
            population.push(reading_at(day, hour, HOT_LAT, HOT_LON, 60.0));
        }

        let report = HotspotDetector::detect(&population, &DetectionParams::default()).unwrap();
        assert_eq!(report.hotspots[0].peak_hour, 9);
    }

    #[test]
    fn test_monthly_breakdown() {
        let mut population = background(100);
        // 6 January days then 4 February days (day-of-year 32 = Feb 1)
        for day in [10, 11, 12, 13, 14, 15, 32, 33, 34, 35] {
            let pm2_5 = if day > 31 { 45.0 } else { 30.0 };
            population.push(reading_at(day, 9, HOT_LAT, HOT_LON, pm2_5));
        }

        let report = HotspotDetector::detect(&population, &DetectionParams::default()).unwrap();
        let hotspot = &report.hotspots[0];

        let expected = vec![
            MonthlyStats {
                month: "January".to_string(),
                avg: 0.6,
                max: 0.6,
                readings: 6,
            },
            MonthlyStats {
                month: "February".to_string(),
                avg: 1.2,
                max: 1.2,
                readings: 4,
            },
        ];
        assert_eq!(hotspot.month_data.len(), 2);
        for (got, want) in hotspot.month_data.iter().zip(&expected) {
            assert_eq!(got.month, want.month);
            assert_eq!(got.readings, want.readings);
            assert!((got.avg - want.avg).abs() < 1e-9);
            assert!((got.max - want.max).abs() < 1e-9);
        }
        assert_eq!(hotspot.month("february").unwrap().readings, 4);
    }

    #[test]
    fn test_rank_by_consistency_then_mean() {
        let mut hotspots = vec![record(0.8, 2.0), record(0.9, 1.0), record(0.8, 3.5)];
        rank_hotspots(&mut hotspots);

        let order: Vec<(f64, f64)> = hotspots
            .iter()
            .map(|h| (h.consistency, h.avg_value))
            .collect();
        assert_eq!(order, vec![(0.9, 1.0), (0.8, 3.5), (0.8, 2.0)]);
    }

    #[test]
    fn test_rank_is_stable_for_exact_ties() {
        let mut a = record(0.8, 2.0);
        a.lat = 1.0;
        let mut b = record(0.8, 2.0);
        b.lat = 2.0;

        let mut hotspots = vec![a, b];
        rank_hotspots(&mut hotspots);
        assert_eq!(hotspots[0].lat, 1.0);
        assert_eq!(hotspots[1].lat, 2.0);
    }

    fn mixed_population() -> Vec<DerivedReading> {
        let mut population = background(200);
        let cells = [(25.318, 82.973), (25.319, 82.973), (25.320, 82.990), (25.330, 82.950)];
        for (i, (lat, lon)) in cells.iter().enumerate() {
            for day in 1..=14u32 {
                let hot = (day + i as u32) % (i as u32 + 2) != 0;
                let pm2_5 = if hot { 40.0 + 7.0 * i as f64 + day as f64 } else { 8.0 };
                population.push(reading_at(day, 8 + day % 12, *lat, *lon, pm2_5));
            }
        }
        population
    }

    #[test]
    fn test_output_invariants() {
        let population = mixed_population();
        let params = DetectionParams {
            percentile: 60.0,
            ..Default::default()
        };
        let report = HotspotDetector::detect(&population, &params).unwrap();
        assert!(!report.hotspots.is_empty());

        for hotspot in &report.hotspots {
            assert!(hotspot.days_total >= params.min_days_total);
            assert!(hotspot.consistency >= params.min_consistency);
            assert!(hotspot.readings_count >= MIN_CELL_READINGS);
            assert!(hotspot.max_value >= hotspot.avg_value);
        }

        for pair in report.hotspots.windows(2) {
            assert!(pair[0].consistency >= pair[1].consistency);
            if pair[0].consistency == pair[1].consistency {
                assert!(pair[0].avg_value >= pair[1].avg_value);
            }
        }
    }

    #[test]
    fn test_detection_is_idempotent() {
        let population = mixed_population();
        let params = DetectionParams {
            percentile: 60.0,
            ..Default::default()
        };

        let first = HotspotDetector::detect(&population, &params).unwrap();
        let second = HotspotDetector::detect(&population, &params).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_alternate_metric() {
        let mut population = background(100);
        for day in 1..=10 {
            population.push(reading_at(day, 9, HOT_LAT, HOT_LON, 60.0));
        }

        let params = DetectionParams {
            metric: Metric::Pm25,
            ..Default::default()
        };
        let report = HotspotDetector::detect(&population, &params).unwrap();
        assert_eq!(report.threshold, Some(5.0));
        assert_eq!(report.hotspots.len(), 1);
        assert_eq!(report.hotspots[0].avg_value, 60.0);
    }

    #[test]
    fn test_non_finite_metric_rejected() {
        let mut population = background(20);
        population[7].pollution_score = f64::INFINITY;

        let result = HotspotDetector::detect(&population, &DetectionParams::default());
        assert!(matches!(
            result,
            Err(HotspotError::NonFiniteMetric { index: 7, .. })
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = DetectionParams {
            percentile: 150.0,
            ..Default::default()
        };
        assert!(matches!(
            HotspotDetector::detect(&background(20), &params),
            Err(HotspotError::InvalidConfig(_))
        ));
    }
}
