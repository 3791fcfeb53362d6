//! The seam between pagination and the transport that serves pages.

use crate::fetcher::types::{DetectionId, MalformedRecord, PageResponse};
use chrono::{DateTime, SecondsFormat, Utc};

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// Start of the report window
    pub from: DateTime<Utc>,
    /// Requested page size
    pub limit: usize,
    /// Id of the last record of the previous page, absent on the first request
    pub cursor: Option<DetectionId>,
}

impl PageQuery {
    /// Create the query for the first page of a window.
    pub fn first(from: DateTime<Utc>, limit: usize) -> Self {
        Self {
            from,
            limit,
            cursor: None,
        }
    }

    /// The query for the page following the one that ended at `last_id`.
    pub fn after(&self, last_id: DetectionId) -> Self {
        Self {
            from: self.from,
            limit: self.limit,
            cursor: Some(last_id),
        }
    }

    /// Query string parameters, in the order the API documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (
                "from",
                self.from.to_rfc3339_opts(SecondsFormat::Secs, false),
            ),
            ("limit", self.limit.to_string()),
            ("order", "desc".to_string()),
        ];
        if let Some(cursor) = &self.cursor {
            params.push(("cursor", cursor.to_string()));
        }
        params
    }
}

/// Errors raised while fetching detections.
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure before a response arrived
    Network(String),
    /// The API answered with a non-success HTTP status
    Server { status: u16, message: String },
    /// The response body was not the expected JSON shape
    Decode(String),
    /// A page contained a record that failed validation
    Malformed(MalformedRecord),
    /// Retries on a transient failure were used up
    RetriesExhausted {
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether re-issuing the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Server { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Detections network error: {msg}"),
            FetchError::Server { status, message } => {
                write!(f, "Detections server error ({status}): {message}")
            }
            FetchError::Decode(msg) => write!(f, "Detections decode error: {msg}"),
            FetchError::Malformed(e) => write!(f, "Detections rejected: {e}"),
            FetchError::RetriesExhausted { attempts, last } => {
                write!(f, "Gave up after {attempts} attempts: {last}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Malformed(e) => Some(e),
            FetchError::RetriesExhausted { last, .. } => Some(last.as_ref()),
            _ => None,
        }
    }
}

impl From<MalformedRecord> for FetchError {
    fn from(e: MalformedRecord) -> Self {
        FetchError::Malformed(e)
    }
}

/// Anything that can serve one page of detections.
///
/// Implementations perform a single request per call; retrying and
/// cursor bookkeeping belong to the [`Paginator`](crate::fetcher::Paginator).
pub trait DetectionSource {
    fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError>;
}

impl<T: DetectionSource + ?Sized> DetectionSource for &T {
    fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError> {
        (**self).fetch_page(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_first_query_has_no_cursor() {
        let from = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let params = PageQuery::first(from, 100).params();

        assert_eq!(
            params,
            vec![
                ("from", "2024-05-01T06:00:00+00:00".to_string()),
                ("limit", "100".to_string()),
                ("order", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_next_query_carries_cursor() {
        let from = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let next = PageQuery::first(from, 100).after(DetectionId::new("991"));

        assert_eq!(next.from, from);
        assert_eq!(next.params().last(), Some(&("cursor", "991".to_string())));
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Network("reset".into()).is_transient());
        assert!(FetchError::Server {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(FetchError::Server {
            status: 429,
            message: String::new()
        }
        .is_transient());
        assert!(!FetchError::Server {
            status: 404,
            message: String::new()
        }
        .is_transient());
        assert!(!FetchError::Decode("bad".into()).is_transient());
    }
}
