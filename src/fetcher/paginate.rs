//! Cursor pagination over a report window.
//!
//! Pages are requested strictly one after another because each request's
//! cursor is the id of the last record of the previous page. Pagination ends
//! on the first short page, empty page, or page flagged `success: false`.

use crate::fetcher::source::{DetectionSource, FetchError, PageQuery};
use crate::fetcher::types::{DetectionRecord, PageResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff for page requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per page, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "crate::config::duration_millis_serde")]
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    #[serde(with = "crate::config::duration_millis_serde")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back with fewer records than requested
    ShortPage,
    /// A page came back with no records
    EmptyPage,
    /// The API answered `success: false`
    UpstreamRefused,
}

/// Bookkeeping for one pagination run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchStats {
    /// HTTP requests issued, retries included
    pub requests: u32,
    /// Pages whose records were appended
    pub pages: u32,
    /// Retries performed after transient failures
    pub retries: u32,
    pub stop_reason: StopReason,
}

/// All records of a window, in the order the API served them.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<DetectionRecord>,
    pub stats: FetchStats,
}

/// Drives a [`DetectionSource`] page by page.
pub struct Paginator<S> {
    source: S,
    page_size: usize,
    retry: RetryPolicy,
}

impl<S: DetectionSource> Paginator<S> {
    pub fn new(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every detection after `from`.
    ///
    /// Records are neither deduplicated nor reordered. Any fetch or
    /// validation error aborts the run; no partial result is returned.
    pub fn fetch_window(&self, from: DateTime<Utc>) -> Result<FetchOutcome, FetchError> {
        let mut records: Vec<DetectionRecord> = Vec::new();
        let mut stats = FetchStats {
            requests: 0,
            pages: 0,
            retries: 0,
            stop_reason: StopReason::EmptyPage,
        };
        let mut query = PageQuery::first(from, self.page_size);

        loop {
            let page = self.fetch_with_retry(&query, &mut stats)?;

            if !page.success {
                tracing::warn!(
                    requests = stats.requests,
                    cursor = query.cursor.as_ref().map(|c| c.as_str()),
                    "Upstream reported success=false, ending pagination"
                );
                stats.stop_reason = StopReason::UpstreamRefused;
                break;
            }
            if page.detections.is_empty() {
                stats.stop_reason = StopReason::EmptyPage;
                break;
            }

            let received = page.detections.len();
            for raw in page.detections {
                records.push(DetectionRecord::try_from(raw)?);
            }
            stats.pages += 1;
            tracing::info!(received, total = records.len(), "Fetched detections page");

            if received < self.page_size {
                stats.stop_reason = StopReason::ShortPage;
                break;
            }

            // The page was non-empty, so there is a last record.
            let Some(last) = records.last() else { break };
            query = query.after(last.id.clone());
        }

        tracing::debug!(
            requests = stats.requests,
            pages = stats.pages,
            retries = stats.retries,
            stop_reason = ?stats.stop_reason,
            "Pagination finished"
        );

        Ok(FetchOutcome { records, stats })
    }

    fn fetch_with_retry(
        &self,
        query: &PageQuery,
        stats: &mut FetchStats,
    ) -> Result<PageResponse, FetchError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            stats.requests += 1;

            match self.source.fetch_page(query) {
                Ok(page) => return Ok(page),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure fetching detections page, retrying"
                    );
                    stats.retries += 1;
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(err) if err.is_transient() && max_attempts > 1 => {
                    tracing::error!(attempt, error = %err, "Detections page retries exhausted");
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}
