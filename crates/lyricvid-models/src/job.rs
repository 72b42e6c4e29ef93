//! Job payloads and results.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::lyric::LyricLine;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-job output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VideoSettings {
    /// Requested resolution label (e.g. "1080p"). Quality mode decides when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// Inbound job payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoJobRequest {
    /// Song title (required).
    #[validate(length(min = 1, message = "songTitle must not be empty"))]
    pub song_title: String,

    /// Artist name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    /// Time-stamped lyric lines (required, at least one).
    #[validate(length(min = 1, message = "lyrics must not be empty"))]
    pub lyrics: Vec<LyricLine>,

    /// Requested style name, matched best-effort against the style registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Song tempo in BPM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,

    /// Output settings.
    #[serde(default)]
    pub settings: VideoSettings,

    /// Progress/completion webhook URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Caller-supplied job ID; generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl VideoJobRequest {
    /// Effective job ID: the caller-supplied one or a fresh UUID.
    pub fn effective_job_id(&self) -> JobId {
        match &self.job_id {
            Some(id) if !id.is_empty() => JobId::from_string(id.clone()),
            _ => JobId::new(),
        }
    }

    /// Effective tempo.
    pub fn effective_bpm(&self) -> u32 {
        self.bpm.unwrap_or(crate::lyric::DEFAULT_BPM)
    }
}

/// Per-job performance and storage metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobMetrics {
    /// Total wall-clock time in seconds.
    pub total_seconds: f64,
    /// Scenes generated (may be fewer than lyric count on worker failures).
    pub scenes_generated: u32,
    /// Scene cache hits during synthesis.
    pub cache_hits: u32,
    /// Whether the parallel generation path was used.
    pub parallel: bool,
    /// Deletions currently pending in the lifecycle manager.
    pub pending_deletions: u32,
}

/// Outbound job result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoJobResult {
    pub success: bool,
    /// Time-limited access URL for the encoded video.
    pub video_url: String,
    /// Storage identifier of the uploaded asset.
    pub public_id: String,
    /// Total video duration in seconds.
    pub duration: f64,
    /// Container format (e.g. "mp4").
    pub format: String,
    /// Number of scenes in the output.
    pub scenes: u32,
    /// Display name of the style used.
    pub style: String,
    /// When the asset expires and is deleted.
    pub expires_at: DateTime<Utc>,
    /// Performance/storage metrics.
    pub metrics: JobMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn request(title: &str, lyrics: Vec<LyricLine>) -> VideoJobRequest {
        VideoJobRequest {
            song_title: title.to_string(),
            artist: None,
            lyrics,
            style: None,
            bpm: None,
            settings: VideoSettings::default(),
            webhook_url: None,
            job_id: None,
        }
    }

    #[test]
    fn test_validation_requires_lyrics() {
        let req = request("Test", vec![]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validation_requires_title() {
        let req = request("", vec![LyricLine::new("hello", 0.0)]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_valid_request_passes() {
        let req = request("Test", vec![LyricLine::new("hello world", 0.0)]);
        assert!(req.validate().is_ok());
        assert_eq!(req.effective_bpm(), 120);
    }

    #[test]
    fn test_payload_field_names() {
        let json = r#"{
            "songTitle": "Test",
            "lyrics": [{"text": "hello world", "time": 0}],
            "style": "minimalist"
        }"#;
        let req: VideoJobRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.song_title, "Test");
        assert_eq!(req.lyrics.len(), 1);
        assert_eq!(req.style.as_deref(), Some("minimalist"));
    }

    #[test]
    fn test_effective_job_id_respects_caller() {
        let mut req = request("Test", vec![LyricLine::new("hi", 0.0)]);
        req.job_id = Some("job-42".to_string());
        assert_eq!(req.effective_job_id().as_str(), "job-42");

        req.job_id = None;
        assert!(!req.effective_job_id().as_str().is_empty());
    }
}
