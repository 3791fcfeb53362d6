//! Configuration for the BirdWeather digest.
//!
//! A single [`Config`] value is loaded once at startup and passed down to
//! the fetcher, the pipeline and the notifiers.

use crate::core::{HourZone, IntensityScale};
use crate::fetcher::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest page size the detections endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Longest report window, one year.
pub const MAX_HOURS: u32 = 24 * 365;

/// Main configuration for a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// BirdWeather station token
    pub station_token: String,

    /// Length of the report window in hours
    pub hours: u32,

    /// Detections requested per page
    pub page_size: usize,

    /// Root of the BirdWeather REST API
    pub api_base: String,

    /// Root of the public BirdWeather site, used for the station link
    pub site_base: String,

    /// Zone used for hour-of-day buckets ("UTC" or an IANA name)
    pub hour_zone: String,

    /// Display scale for hour cells
    pub intensity: IntensityScale,

    /// Retry policy for page requests
    pub retry: RetryPolicy,

    /// Timeout of a single HTTP request
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,

    /// Directory where rendered reports are written
    pub export_path: PathBuf,

    /// Optional webhook the finished report is posted to
    pub webhook: Option<WebhookConfig>,

    /// Optional mail relay the finished report is sent through
    pub smtp: Option<SmtpConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("birdweather-digest");

        Self {
            station_token: String::new(),
            hours: 24,
            page_size: MAX_PAGE_SIZE,
            api_base: "https://app.birdweather.com/api/v1".to_string(),
            site_base: "https://app.birdweather.com".to_string(),
            hour_zone: "UTC".to_string(),
            intensity: IntensityScale::default(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
            export_path: data_dir.join("reports"),
            webhook: None,
            smtp: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("birdweather-digest")
            .join("config.json")
    }

    /// Check that the configuration can drive a report run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.station_token.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "station_token must be set".to_string(),
            ));
        }
        if self.hours == 0 || self.hours > MAX_HOURS {
            return Err(ConfigError::Invalid(format!(
                "hours must be between 1 and {MAX_HOURS}, got {}",
                self.hours
            )));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        self.zone()?;
        Ok(())
    }

    /// The parsed hour-bucket zone.
    pub fn zone(&self) -> Result<HourZone, ConfigError> {
        self.hour_zone.parse().map_err(ConfigError::Invalid)
    }

    /// Public page of the configured station.
    pub fn station_url(&self) -> String {
        format!(
            "{}/stations/{}",
            self.site_base.trim_end_matches('/'),
            self.station_token
        )
    }
}

/// Where and how the finished report is posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Bearer token sent in the Authorization header
    pub token: Option<String>,
}

/// Mail relay and addresses for email delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Sender address, also used as the login user
    pub from: String,
    pub to: String,
    pub password: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole seconds.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for Duration as milliseconds.
pub(crate) mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
