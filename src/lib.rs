//! BirdWeather Digest - rolling-window species reports for BirdWeather stations.
//!
//! This library pulls a station's detections for the last N hours, folds
//! them into per-species statistics and ranks the species for a report.
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BirdWeather Digest                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Paginator  │──▶│ Aggregator  │──▶│   Ranker    │       │
//! │  │ (cursor/API)│   │ (per species│   │ (count desc,│       │
//! │  └─────────────┘   │  + 24h hist)│   │  hour cells)│       │
//! │                    └─────────────┘   └─────────────┘       │
//! │                                             │              │
//! │                                             ▼              │
//! │                     ┌─────────────┐   ┌─────────────┐       │
//! │                     │  Notifier   │◀──│  Renderer   │       │
//! │                     │(file / mail)│   │ (html/json) │       │
//! │                     └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way; nothing downstream mutates upstream state.
//!
//! # Example
//!
//! ```no_run
//! use birdweather_digest::{config::Config, fetcher, pipeline, report};
//!
//! let config = Config::load().expect("Failed to load config");
//! let endpoint = fetcher::StationEndpoint::new(
//!     config.api_base.clone(),
//!     config.station_token.clone(),
//!     config.request_timeout,
//! );
//! let source = fetcher::BlockingDetectionSource::new(endpoint).expect("client");
//! let run = pipeline::generate_summary(&config, &source, chrono::Utc::now())
//!     .expect("Failed to build report");
//! let html = report::render_html(&run.summary);
//! ```

pub mod config;
pub mod core;
pub mod fetcher;
pub mod notify;
pub mod pipeline;
pub mod report;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, SmtpConfig, WebhookConfig};
pub use crate::core::{
    aggregate, rank, HourCell, HourZone, IntensityScale, RankedSpecies, ReportMeta,
    ReportSummary, SpeciesAggregate, SpeciesStat,
};
pub use fetcher::{
    DetectionRecord, DetectionSource, FetchError, FetchStats, MalformedRecord, PageQuery,
    Paginator, RetryPolicy, StopReason,
};
pub use notify::{FileNotifier, Notifier, NotifyError, StdoutNotifier};
pub use pipeline::{generate_summary, ReportError, ReportRun};
pub use report::{Document, ReportFormat};

#[cfg(feature = "http")]
pub use fetcher::{BlockingDetectionSource, HttpDetectionSource, StationEndpoint};

#[cfg(feature = "http")]
pub use notify::WebhookNotifier;

#[cfg(feature = "smtp")]
pub use notify::SmtpNotifier;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
