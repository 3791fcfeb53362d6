//! Ranking and display cells for the aggregated species.
//!
//! The output of this module is the complete data contract consumed by the
//! report renderers. It carries no markup.

use crate::core::aggregate::{SpeciesAggregate, SpeciesStat};
use crate::core::hours::HOURS_PER_DAY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Linear, clamped mapping from an hour's raw count to a display intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityScale {
    /// Intensity units per detection
    pub scale_factor: u32,
    /// Maximum intensity
    pub cap: u32,
}

impl Default for IntensityScale {
    fn default() -> Self {
        // Ten detections in an hour saturate an 8-bit color channel.
        Self {
            scale_factor: 25,
            cap: 255,
        }
    }
}

impl IntensityScale {
    pub fn intensity(&self, count: u32) -> u32 {
        count.saturating_mul(self.scale_factor).min(self.cap)
    }
}

/// One hour of a species' activity strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCell {
    pub hour: u8,
    pub count: u32,
    pub intensity: u32,
}

/// A species in rank order, with its display cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSpecies {
    #[serde(flatten)]
    pub stat: SpeciesStat,
    pub hours: Vec<HourCell>,
}

impl RankedSpecies {
    fn from_stat(stat: SpeciesStat, scale: &IntensityScale) -> Self {
        let hours = stat
            .hour_counts
            .iter()
            .enumerate()
            .map(|(hour, &count)| HourCell {
                hour: hour as u8,
                count,
                intensity: scale.intensity(count),
            })
            .collect();
        Self { stat, hours }
    }
}

/// Window metadata accompanying a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Unique id of this report run
    pub report_id: Uuid,
    /// Length of the window in hours
    pub hours: u32,
    pub window_start: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub station_token: String,
    /// Public page of the station
    pub station_url: String,
    /// Zone the hour buckets were computed in
    pub hour_zone: String,
}

/// Everything a renderer needs to produce the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub meta: ReportMeta,
    pub total_species: usize,
    pub total_detections: u64,
    pub species: Vec<RankedSpecies>,
}

impl ReportSummary {
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

/// Sort species by detection count, descending.
///
/// The sort is stable, so species with equal counts keep first-seen order.
pub fn rank(
    aggregate: SpeciesAggregate,
    scale: &IntensityScale,
    meta: ReportMeta,
) -> ReportSummary {
    let total_detections = aggregate.total_detections();
    let mut stats = aggregate.into_stats();
    stats.sort_by(|a, b| b.count.cmp(&a.count));

    let species: Vec<RankedSpecies> = stats
        .into_iter()
        .map(|stat| RankedSpecies::from_stat(stat, scale))
        .collect();

    debug_assert!(species.iter().all(|s| s.hours.len() == HOURS_PER_DAY));

    ReportSummary {
        meta,
        total_species: species.len(),
        total_detections,
        species,
    }
}
