//! Per-species accumulation of detections.
//!
//! Species are kept in first-seen order. Ranking sorts stably on top of that
//! order, so species with equal counts keep the order in which the fetch
//! first produced them.

use crate::core::hours::{HourZone, HOURS_PER_DAY};
use crate::fetcher::types::{DetectionRecord, Soundscape};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Running statistics for one species within the report window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStat {
    /// Common name, the aggregation key
    pub name: String,
    pub scientific_name: String,
    pub image_url: Option<String>,
    /// Detections folded into this stat
    pub count: u32,
    /// Highest confidence seen so far (0.0 before any detection)
    pub max_confidence: f64,
    /// Soundscape of the first detection that reached `max_confidence`
    pub best_soundscape: Option<Soundscape>,
    /// Detections per hour of day; always sums to `count`
    pub hour_counts: [u32; HOURS_PER_DAY],
}

impl SpeciesStat {
    /// An empty stat for a species that has not been folded yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scientific_name: String::new(),
            image_url: None,
            count: 0,
            max_confidence: 0.0,
            best_soundscape: None,
            hour_counts: [0; HOURS_PER_DAY],
        }
    }

    /// Fold one detection into this stat.
    ///
    /// Names and image are overwritten on every fold, so after a descending
    /// fetch they come from the oldest detection in the window. The best
    /// soundscape only moves on a strictly higher confidence.
    pub fn fold(&mut self, record: &DetectionRecord, hour: usize) {
        self.count += 1;
        self.scientific_name = record.species.scientific_name.clone();
        self.image_url = record.species.image_url.clone();

        if record.confidence > self.max_confidence {
            self.max_confidence = record.confidence;
            self.best_soundscape = record.soundscape.clone();
        }

        self.hour_counts[hour % HOURS_PER_DAY] += 1;
    }

    /// Sum of the hour histogram.
    pub fn hour_total(&self) -> u32 {
        self.hour_counts.iter().sum()
    }
}

/// Insertion-ordered map from common name to [`SpeciesStat`].
#[derive(Debug, Clone, Default)]
pub struct SpeciesAggregate {
    stats: Vec<SpeciesStat>,
    index: HashMap<String, usize>,
}

impl SpeciesAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stat for `name`, appending an empty one if it is new.
    pub fn get_or_create(&mut self, name: &str) -> &mut SpeciesStat {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let idx = self.stats.len();
                self.stats.push(SpeciesStat::new(name));
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.stats[idx]
    }

    /// Fold one detection, bucketing its hour in `zone`.
    pub fn fold(&mut self, record: &DetectionRecord, zone: HourZone) {
        let hour = zone.hour_of(&record.timestamp);
        self.get_or_create(&record.species.common_name)
            .fold(record, hour);
    }

    pub fn get(&self, name: &str) -> Option<&SpeciesStat> {
        self.index.get(name).map(|&idx| &self.stats[idx])
    }

    /// Number of distinct species.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Total detections across all species.
    pub fn total_detections(&self) -> u64 {
        self.stats.iter().map(|s| u64::from(s.count)).sum()
    }

    /// Stats in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &SpeciesStat> {
        self.stats.iter()
    }

    /// Consume the aggregate, yielding stats in first-seen order.
    pub fn into_stats(self) -> Vec<SpeciesStat> {
        self.stats
    }
}

/// Aggregate a fetched record sequence from scratch.
pub fn aggregate(records: &[DetectionRecord], zone: HourZone) -> SpeciesAggregate {
    let mut aggregate = SpeciesAggregate::new();
    for record in records {
        aggregate.fold(record, zone);
    }
    tracing::debug!(
        records = records.len(),
        species = aggregate.len(),
        zone = zone.name(),
        "Aggregated detections"
    );
    aggregate
}
