//! Error types for rendering and encoding.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and encoding.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Background render failed: {0}")]
    BackgroundFailed(String),

    #[error("Overlay render failed: {0}")]
    OverlayFailed(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn background_failed(msg: impl Into<String>) -> Self {
        Self::BackgroundFailed(msg.into())
    }

    pub fn overlay_failed(msg: impl Into<String>) -> Self {
        Self::OverlayFailed(msg.into())
    }

    pub fn encoding_failed(msg: impl Into<String>) -> Self {
        Self::EncodingFailed(msg.into())
    }
}
