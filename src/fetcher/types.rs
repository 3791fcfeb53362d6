//! Detection records as served by the BirdWeather station API.
//!
//! The per-record wire types mirror the JSON payload with every field optional
//! so that a record missing a required field is rejected by
//! [`DetectionRecord::try_from`] instead of failing the whole page decode with
//! an opaque serde error. The page-level `success` flag is required.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Opaque ordering token for a detection, reused as the pagination cursor.
///
/// The API currently sends integer ids, but nothing downstream depends on
/// that; the token is kept in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionId(String);

impl DetectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DetectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recording excerpt that contains a detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Soundscape {
    pub url: String,
    /// Offset of the detection within the recording, in seconds
    pub start_time: f64,
    /// End offset of the detection within the recording, in seconds
    pub end_time: f64,
}

/// Species identification attached to a detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub common_name: String,
    pub scientific_name: String,
    pub image_url: Option<String>,
}

/// A validated detection event. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: DetectionId,
    /// When the detection happened, with the offset reported by the station
    pub timestamp: DateTime<FixedOffset>,
    pub species: Species,
    /// Classifier confidence in `[0.0, 1.0]`
    pub confidence: f64,
    pub soundscape: Option<Soundscape>,
}

// ============================================================================
// Wire format
// ============================================================================

/// One page of the `/stations/{token}/detections` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResponse {
    /// `false` ends pagination; a body without the flag does not decode
    pub success: bool,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDetection {
    pub id: Option<serde_json::Value>,
    pub timestamp: Option<String>,
    pub confidence: Option<f64>,
    pub species: Option<RawSpecies>,
    pub soundscape: Option<RawSoundscape>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSpecies {
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSoundscape {
    pub url: Option<String>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
}

impl RawDetection {
    /// Cursor token of this record, if it carries a usable id.
    pub fn cursor_id(&self) -> Option<DetectionId> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(DetectionId::new(s.clone())),
            serde_json::Value::Number(n) => Some(DetectionId::new(n.to_string())),
            _ => None,
        }
    }
}

/// A record that is missing a required field or carries an invalid value.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    /// Id of the offending record, when it has one
    pub id: Option<DetectionId>,
    /// Dotted path of the offending field, e.g. `species.commonName`
    pub field: &'static str,
    pub reason: String,
}

impl MalformedRecord {
    fn new(id: Option<DetectionId>, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            id,
            field,
            reason: reason.into(),
        }
    }

    fn missing(id: Option<DetectionId>, field: &'static str) -> Self {
        Self::new(id, field, "missing required field")
    }
}

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(
                f,
                "malformed detection {id}: {} ({})",
                self.field, self.reason
            ),
            None => write!(f, "malformed detection: {} ({})", self.field, self.reason),
        }
    }
}

impl std::error::Error for MalformedRecord {}

impl TryFrom<RawDetection> for DetectionRecord {
    type Error = MalformedRecord;

    fn try_from(raw: RawDetection) -> Result<Self, Self::Error> {
        let id = raw.cursor_id();
        let Some(record_id) = id.clone() else {
            return Err(MalformedRecord::missing(None, "id"));
        };

        let timestamp_str = raw
            .timestamp
            .ok_or_else(|| MalformedRecord::missing(id.clone(), "timestamp"))?;
        // RFC 3339 requires an offset, so zone-less timestamps are rejected here.
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str).map_err(|e| {
            MalformedRecord::new(
                id.clone(),
                "timestamp",
                format!("'{timestamp_str}' is not an RFC 3339 timestamp with offset: {e}"),
            )
        })?;

        let confidence = raw
            .confidence
            .ok_or_else(|| MalformedRecord::missing(id.clone(), "confidence"))?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(MalformedRecord::new(
                id,
                "confidence",
                format!("{confidence} is outside [0, 1]"),
            ));
        }

        let species = raw
            .species
            .ok_or_else(|| MalformedRecord::missing(id.clone(), "species"))?;
        let common_name = species
            .common_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| MalformedRecord::missing(id.clone(), "species.commonName"))?;
        let scientific_name = species
            .scientific_name
            .ok_or_else(|| MalformedRecord::missing(id.clone(), "species.scientificName"))?;

        let soundscape = match raw.soundscape {
            None => None,
            Some(s) => Some(Soundscape {
                url: s
                    .url
                    .ok_or_else(|| MalformedRecord::missing(id.clone(), "soundscape.url"))?,
                start_time: s
                    .start_time
                    .ok_or_else(|| MalformedRecord::missing(id.clone(), "soundscape.startTime"))?,
                end_time: s
                    .end_time
                    .ok_or_else(|| MalformedRecord::missing(id.clone(), "soundscape.endTime"))?,
            }),
        };

        Ok(Self {
            id: record_id,
            timestamp,
            species: Species {
                common_name,
                scientific_name,
                image_url: species.image_url,
            },
            confidence,
            soundscape,
        })
    }
}
