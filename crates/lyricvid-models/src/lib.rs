//! Shared data models for the LyricVid pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Timed lyric lines and duration estimation
//! - Style profiles, font specs and color palettes
//! - Scenes and their rendering directives
//! - Encoding profiles and quality modes
//! - Job payloads and results

pub mod encoding;
pub mod job;
pub mod lyric;
pub mod scene;
pub mod style;

// Re-export common types
pub use encoding::{EncodingProfile, Quality, Resolution};
pub use job::{JobId, JobMetrics, VideoJobRequest, VideoJobResult, VideoSettings};
pub use lyric::{calculate_duration, LyricLine, DEFAULT_BPM};
pub use scene::{RenderingDirectives, Scene};
pub use style::{ColorPalette, FontSpec, Intensity, StyleLibrary, StyleProfile};
