//! Population summary
//!
//! Descriptive statistics over a derived population, reported alongside the
//! hotspot tables: exceedance distributions, the share of readings above each
//! guideline, and the AQI category mix.

use serde::{Deserialize, Serialize};

use crate::exceedance::GuidelineLimits;
use crate::stats::Describe;
use crate::types::{AqiCategory, DerivedReading, Pollutant};

/// Exceedance statistics for one pollutant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantSummary {
    pub pollutant: Pollutant,
    pub guideline: f64,
    pub exceedance: Describe,
    /// Percentage of readings strictly above the guideline
    pub pct_above_guideline: f64,
}

/// Share of readings in one AQI category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: AqiCategory,
    pub label: String,
    pub readings: usize,
    pub pct: f64,
}

/// Summary of a derived population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub readings: usize,
    pub first_reading: Option<String>,
    pub last_reading: Option<String>,
    pub pollutants: Vec<PollutantSummary>,
    pub pollution_score: Option<Describe>,
    /// Every category, least severe first
    pub categories: Vec<CategoryShare>,
}

impl PopulationSummary {
    pub fn compute(population: &[DerivedReading], limits: &GuidelineLimits) -> Self {
        let total = population.len();
        let pct = |count: usize| {
            if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };

        let pollutants = Pollutant::ALL
            .iter()
            .filter_map(|&pollutant| {
                let guideline = limits.limit(pollutant);
                let ratios: Vec<f64> = population
                    .iter()
                    .map(|r| match pollutant {
                        Pollutant::Pm25 => r.exceedance.pm2_5,
                        Pollutant::Pm10 => r.exceedance.pm10,
                    })
                    .collect();
                let above = population
                    .iter()
                    .filter(|r| r.reading.concentration(pollutant) > guideline)
                    .count();

                Describe::of(&ratios).map(|exceedance| PollutantSummary {
                    pollutant,
                    guideline,
                    exceedance,
                    pct_above_guideline: pct(above),
                })
            })
            .collect();

        let scores: Vec<f64> = population.iter().map(|r| r.pollution_score).collect();

        let categories = AqiCategory::ALL
            .iter()
            .map(|&category| {
                let readings = population
                    .iter()
                    .filter(|r| r.aqi_category == category)
                    .count();
                CategoryShare {
                    category,
                    label: category.label().to_string(),
                    readings,
                    pct: pct(readings),
                }
            })
            .collect();

        let timestamps = population.iter().map(|r| r.reading.timestamp);

        Self {
            readings: total,
            first_reading: timestamps.clone().min().map(|t| t.to_string()),
            last_reading: timestamps.max().map(|t| t.to_string()),
            pollutants,
            pollution_score: Describe::of(&scores),
            categories,
        }
    }
}
