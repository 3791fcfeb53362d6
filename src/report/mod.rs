//! Report rendering.
//!
//! Renderers depend on [`ReportSummary`] and produce a finished
//! [`Document`]; the core never depends on anything in here.

pub mod html;
pub mod json;

use crate::core::ReportSummary;
use serde::{Deserialize, Serialize};

pub use html::render_html;
pub use json::render_json;

/// Subject line of every report.
pub const REPORT_SUBJECT: &str = "BirdWeather Report 🦉";

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    Json,
}

impl ReportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Html => "text/html; charset=utf-8",
            ReportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("Unknown report format '{other}' (expected html or json)")),
        }
    }
}

/// A finished, transport-ready report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub subject: String,
    pub format: ReportFormat,
    pub body: String,
}

impl Document {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Render a summary in the requested format.
pub fn render(summary: &ReportSummary, format: ReportFormat) -> Result<Document, serde_json::Error> {
    let body = match format {
        ReportFormat::Html => render_html(summary),
        ReportFormat::Json => render_json(summary)?,
    };
    Ok(Document {
        subject: REPORT_SUBJECT.to_string(),
        format,
        body,
    })
}
