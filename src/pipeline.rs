//! One report run: fetch, aggregate, rank.

use crate::config::{Config, ConfigError};
use crate::core::{aggregate, rank, ReportMeta, ReportSummary};
use crate::fetcher::{DetectionSource, FetchError, FetchStats, Paginator};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Errors that abort a report run.
#[derive(Debug)]
pub enum ReportError {
    Config(ConfigError),
    Fetch(FetchError),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Config(e) => write!(f, "Report configuration error: {e}"),
            ReportError::Fetch(e) => write!(f, "Report fetch failed: {e}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Config(e) => Some(e),
            ReportError::Fetch(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ReportError {
    fn from(e: ConfigError) -> Self {
        ReportError::Config(e)
    }
}

impl From<FetchError> for ReportError {
    fn from(e: FetchError) -> Self {
        ReportError::Fetch(e)
    }
}

/// A summary together with how the detections were fetched.
#[derive(Debug, Clone)]
pub struct ReportRun {
    pub summary: ReportSummary,
    pub fetch_stats: FetchStats,
}

/// Start of the window ending at `now`, or `None` if it is not representable.
pub fn window_start(now: DateTime<Utc>, hours: u32) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::hours(i64::from(hours)))
}

/// Build the summary for the window of `config.hours` hours ending at `now`.
pub fn generate_summary<S: DetectionSource>(
    config: &Config,
    source: S,
    now: DateTime<Utc>,
) -> Result<ReportRun, ReportError> {
    config.validate()?;
    let zone = config.zone()?;
    let from = window_start(now, config.hours).ok_or_else(|| {
        ConfigError::Invalid(format!("a {}-hour window is out of range", config.hours))
    })?;

    tracing::info!(
        hours = config.hours,
        from = %from.to_rfc3339(),
        page_size = config.page_size,
        "Fetching detections"
    );
    let outcome = Paginator::new(source, config.page_size)
        .with_retry(config.retry.clone())
        .fetch_window(from)?;

    let species = aggregate(&outcome.records, zone);
    tracing::info!(
        records = outcome.records.len(),
        species = species.len(),
        requests = outcome.stats.requests,
        "Aggregated detections"
    );

    let meta = ReportMeta {
        report_id: Uuid::new_v4(),
        hours: config.hours,
        window_start: from,
        generated_at: now,
        station_token: config.station_token.clone(),
        station_url: config.station_url(),
        hour_zone: zone.name().to_string(),
    };
    let summary = rank(species, &config.intensity, meta);

    Ok(ReportRun {
        summary,
        fetch_stats: outcome.stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap();
        assert_eq!(
            window_start(now, 24),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap())
        );
        assert_eq!(
            window_start(now, 3),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 4, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_window_start_out_of_range() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap();
        assert_eq!(window_start(now, u32::MAX), None);
    }
}
