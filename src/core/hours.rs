//! Hour-of-day bucketing.
//!
//! Detections carry the offset reported by the station, which differs across
//! stations and across DST changes. Buckets are therefore computed after
//! converting every timestamp into one configured zone, UTC unless a named
//! IANA zone is configured.

use chrono::{DateTime, FixedOffset, Timelike};
use chrono_tz::Tz;
use std::str::FromStr;

/// Number of hour buckets in a day.
pub const HOURS_PER_DAY: usize = 24;

/// The zone in which hour-of-day buckets are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HourZone {
    #[default]
    Utc,
    Named(Tz),
}

impl HourZone {
    /// Hour-of-day bucket (0-23) of a timestamp in this zone.
    pub fn hour_of(&self, timestamp: &DateTime<FixedOffset>) -> usize {
        let hour = match self {
            HourZone::Utc => timestamp.naive_utc().hour(),
            HourZone::Named(tz) => timestamp.with_timezone(tz).hour(),
        };
        hour as usize
    }

    /// Canonical name of the zone.
    pub fn name(&self) -> &'static str {
        match self {
            HourZone::Utc => "UTC",
            HourZone::Named(tz) => tz.name(),
        }
    }
}

impl FromStr for HourZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(HourZone::Utc);
        }
        trimmed
            .parse::<Tz>()
            .map(HourZone::Named)
            .map_err(|_| format!("Unknown time zone '{trimmed}'"))
    }
}

impl std::fmt::Display for HourZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
