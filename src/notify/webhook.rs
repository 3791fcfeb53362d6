//! Webhook delivery, e.g. to a mail relay.

use crate::config::WebhookConfig;
use crate::notify::{Notifier, NotifyError};
use crate::report::Document;
use serde::Serialize;
use std::time::Duration;

/// Payload posted to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload<'a> {
    pub subject: &'a str,
    pub content_type: &'a str,
    pub body: &'a str,
    /// Producer identifier
    pub source: &'static str,
    pub version: &'static str,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            subject: &document.subject,
            content_type: document.content_type(),
            body: &document.body,
            source: "birdweather-digest",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Posts the report as JSON to a configured URL.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig, timeout: Duration) -> Result<Self, NotifyError> {
        if config.url.trim().is_empty() {
            return Err(NotifyError::Config("webhook url is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to create HTTP client: {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            config,
            client,
            runtime,
        })
    }

    async fn post(&self, document: &Document) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&self.config.url)
            .json(&WebhookPayload::new(document));
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotifyError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn deliver(&self, document: &Document) -> Result<(), NotifyError> {
        self.runtime.block_on(self.post(document))?;
        tracing::info!(url = %self.config.url, "Report posted to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportFormat;

    #[test]
    fn test_payload_shape() {
        let document = Document {
            subject: "Subject".to_string(),
            format: ReportFormat::Html,
            body: "<p>hi</p>".to_string(),
        };
        let json = serde_json::to_value(WebhookPayload::new(&document)).unwrap();
        assert_eq!(json["subject"], "Subject");
        assert_eq!(json["content_type"], "text/html; charset=utf-8");
        assert_eq!(json["body"], "<p>hi</p>");
        assert_eq!(json["source"], "birdweather-digest");
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let config = WebhookConfig {
            url: " ".to_string(),
            token: None,
        };
        assert!(matches!(
            WebhookNotifier::new(config, Duration::from_secs(1)),
            Err(NotifyError::Config(_))
        ));
    }
}
