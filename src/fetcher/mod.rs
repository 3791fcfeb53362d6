//! Detection fetching for the BirdWeather digest.
//!
//! This module turns the station API's cursor-paginated detections endpoint
//! into one ordered, validated record sequence.

pub mod paginate;
pub mod source;
pub mod types;

#[cfg(feature = "http")]
pub mod http;

// Re-export commonly used types
pub use paginate::{FetchOutcome, FetchStats, Paginator, RetryPolicy, StopReason};
pub use source::{DetectionSource, FetchError, PageQuery};
pub use types::{DetectionId, DetectionRecord, MalformedRecord, PageResponse, Soundscape, Species};

#[cfg(feature = "http")]
pub use http::{BlockingDetectionSource, HttpDetectionSource, StationEndpoint};
