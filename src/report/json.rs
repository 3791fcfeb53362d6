//! JSON rendering of a report summary.

use crate::core::ReportSummary;

pub fn render_json(summary: &ReportSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
