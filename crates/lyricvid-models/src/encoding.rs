//! Encoding profiles and quality modes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Frame rate for rendered scenes
pub const DEFAULT_FPS: u32 = 24;

/// Requested encoding quality mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Fast,
    #[default]
    Balanced,
    Quality,
    Ultra,
}

impl Quality {
    pub const ALL: &'static [Quality] = &[
        Quality::Fast,
        Quality::Balanced,
        Quality::Quality,
        Quality::Ultra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Fast => "fast",
            Quality::Balanced => "balanced",
            Quality::Quality => "quality",
            Quality::Ultra => "ultra",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Quality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Quality::Fast),
            "balanced" => Ok(Quality::Balanced),
            "quality" => Ok(Quality::Quality),
            "ultra" => Ok(Quality::Ultra),
            _ => Err(QualityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown quality mode: {0}")]
pub struct QualityParseError(String);

/// Output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Smallest fixed size, used when the preview flag is set.
    pub const PREVIEW: Resolution = Resolution::new(640, 360);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Resolution for a quality mode; preview forces the smallest size.
    pub fn for_quality(quality: Quality, preview: bool) -> Self {
        if preview {
            return Self::PREVIEW;
        }
        match quality {
            Quality::Fast => Resolution::new(854, 480),
            Quality::Balanced => Resolution::new(1280, 720),
            Quality::Quality => Resolution::new(1920, 1080),
            Quality::Ultra => Resolution::new(2560, 1440),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Named bundle of encoder parameters selected by quality mode.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodingProfile {
    /// Encoder preset (e.g. "ultrafast", "fast", "medium", "slow")
    pub preset: String,
    /// Target bitrate (e.g. "5000k")
    pub bitrate: String,
    /// Constant Rate Factor (0-51, lower is better)
    pub crf: u8,
    /// Encoder thread count
    pub threads: u32,
    /// Quality label attached to result metadata
    pub quality_label: String,
}

impl EncodingProfile {
    /// Profile for a quality mode; the preview flag forces the fastest one.
    pub fn for_quality(quality: Quality, preview: bool) -> Self {
        let quality = if preview { Quality::Fast } else { quality };
        match quality {
            Quality::Fast => Self::new("ultrafast", "2000k", 28, 2, "low"),
            Quality::Balanced => Self::new("fast", "5000k", 23, 4, "medium"),
            Quality::Quality => Self::new("medium", "10000k", 18, 6, "high"),
            Quality::Ultra => Self::new("slow", "20000k", 14, 8, "ultra"),
        }
    }

    fn new(preset: &str, bitrate: &str, crf: u8, threads: u32, label: &str) -> Self {
        Self {
            preset: preset.to_string(),
            bitrate: bitrate.to_string(),
            crf,
            threads,
            quality_label: label.to_string(),
        }
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            DEFAULT_VIDEO_CODEC.to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-b:v".to_string(),
            self.bitrate.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-threads".to_string(),
            self.threads.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]
    }
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self::for_quality(Quality::Balanced, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parse() {
        assert_eq!("balanced".parse::<Quality>().unwrap(), Quality::Balanced);
        assert_eq!("ULTRA".parse::<Quality>().unwrap(), Quality::Ultra);
        assert!("hd".parse::<Quality>().is_err());
    }

    #[test]
    fn test_resolution_table() {
        assert_eq!(
            Resolution::for_quality(Quality::Fast, false),
            Resolution::new(854, 480)
        );
        assert_eq!(
            Resolution::for_quality(Quality::Ultra, false),
            Resolution::new(2560, 1440)
        );
    }

    #[test]
    fn test_preview_forces_smallest_resolution() {
        for q in Quality::ALL {
            assert_eq!(Resolution::for_quality(*q, true), Resolution::PREVIEW);
        }
    }

    #[test]
    fn test_preview_forces_fastest_profile() {
        let profile = EncodingProfile::for_quality(Quality::Ultra, true);
        assert_eq!(profile.preset, "ultrafast");
        assert_eq!(profile.crf, 28);
    }

    #[test]
    fn test_ffmpeg_args() {
        let profile = EncodingProfile::for_quality(Quality::Quality, false);
        let args = profile.to_ffmpeg_args();
        assert!(args.contains(&"-preset".to_string()));
        assert!(args.contains(&"medium".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"18".to_string()));
        assert!(args.contains(&"10000k".to_string()));
    }
}
