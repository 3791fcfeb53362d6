//! HTTP client for the BirdWeather station detections endpoint.

use crate::fetcher::source::{DetectionSource, FetchError, PageQuery};
use crate::fetcher::types::PageResponse;
use std::time::Duration;

/// Where a station's detections are served from.
#[derive(Debug, Clone)]
pub struct StationEndpoint {
    /// API root, e.g. `https://app.birdweather.com/api/v1`
    pub api_base: String,
    /// Station token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl StationEndpoint {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.into(),
            timeout,
        }
    }

    /// Get the detections endpoint URL.
    pub fn detections_url(&self) -> String {
        format!(
            "{}/stations/{}/detections",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

/// Async client issuing one request per page.
pub struct HttpDetectionSource {
    endpoint: StationEndpoint,
    client: reqwest::Client,
}

impl HttpDetectionSource {
    pub fn new(endpoint: StationEndpoint) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .user_agent(concat!("birdweather-digest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { endpoint, client })
    }

    /// Fetch one page of detections.
    pub async fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError> {
        let response = self
            .client
            .get(self.endpoint.detections_url())
            .query(&query.params())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PageResponse>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    pub fn endpoint(&self) -> &StationEndpoint {
        &self.endpoint
    }
}

/// Blocking wrapper so the sequential pipeline can drive the async client.
pub struct BlockingDetectionSource {
    inner: HttpDetectionSource,
    runtime: tokio::runtime::Runtime,
}

impl BlockingDetectionSource {
    pub fn new(endpoint: StationEndpoint) -> Result<Self, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: HttpDetectionSource::new(endpoint)?,
            runtime,
        })
    }

    pub fn endpoint(&self) -> &StationEndpoint {
        self.inner.endpoint()
    }
}

impl DetectionSource for BlockingDetectionSource {
    fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError> {
        self.runtime.block_on(self.inner.fetch_page(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detections_url() {
        let endpoint = StationEndpoint::new(
            "https://app.birdweather.com/api/v1/",
            "abc123",
            Duration::from_secs(5),
        );
        assert_eq!(
            endpoint.detections_url(),
            "https://app.birdweather.com/api/v1/stations/abc123/detections"
        );
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is not expected to be listening.
        let endpoint =
            StationEndpoint::new("http://127.0.0.1:9/api/v1", "t", Duration::from_secs(2));
        let source = BlockingDetectionSource::new(endpoint).unwrap();
        let from = chrono::Utc::now();

        let err = source.fetch_page(&PageQuery::first(from, 10)).unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        assert!(err.is_transient());
    }
}
