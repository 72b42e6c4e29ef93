//! Worker error types.
//!
//! Propagation policy: generation and rendering failures degrade toward the
//! guaranteed procedural/minimal path and never surface; encoding failures
//! are terminal; upload failures fall back to a local-file result.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Missing or invalid required input. Fatal before any work starts.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// AI texture service failed or was unavailable. Always recovered by
    /// the procedural fallback; surfaces only from the texture client.
    #[error("AI texture service failed: {0}")]
    AiService(String),

    /// A scene generation task failed; the scene is dropped and the job
    /// continues with fewer scenes.
    #[error("Scene task failed: {0}")]
    SceneTask(String),

    /// Encoding failed. Terminal: no safe degraded video can be produced.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Render error: {0}")]
    Render(#[from] lyricvid_render::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] lyricvid_storage::StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn input_validation(msg: impl Into<String>) -> Self {
        Self::InputValidation(msg.into())
    }

    pub fn ai_service(msg: impl Into<String>) -> Self {
        Self::AiService(msg.into())
    }

    pub fn scene_task(msg: impl Into<String>) -> Self {
        Self::SceneTask(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Whether this error aborts the whole job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WorkerError::InputValidation(_)
                | WorkerError::Encoding(_)
                | WorkerError::Render(lyricvid_render::RenderError::EncodingFailed(_))
                | WorkerError::Render(lyricvid_render::RenderError::FfmpegNotFound)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(WorkerError::input_validation("missing lyrics").is_fatal());
        assert!(WorkerError::encoding("ffmpeg exploded").is_fatal());
        assert!(!WorkerError::ai_service("503").is_fatal());
        assert!(!WorkerError::scene_task("worker died").is_fatal());
    }
}
