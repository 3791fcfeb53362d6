//! Core aggregation for the BirdWeather digest.
//!
//! This module contains:
//! - Hour-of-day bucketing in a configured zone
//! - Per-species accumulation of detections
//! - Ranking and display cells for the report

pub mod aggregate;
pub mod hours;
pub mod rank;

// Re-export commonly used types
pub use aggregate::{aggregate, SpeciesAggregate, SpeciesStat};
pub use hours::{HourZone, HOURS_PER_DAY};
pub use rank::{rank, HourCell, IntensityScale, RankedSpecies, ReportMeta, ReportSummary};
