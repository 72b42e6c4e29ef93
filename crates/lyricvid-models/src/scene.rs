//! Scene definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::style::{Intensity, StyleProfile};

/// Rendering directives attached to a scene, copied from its style profile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderingDirectives {
    pub font_tag: String,
    pub animation_tag: String,
    pub effect_tag: String,
    pub color_tag: String,
    pub intensity: Intensity,
}

impl RenderingDirectives {
    /// Extract directives from a style profile.
    pub fn from_style(style: &StyleProfile) -> Self {
        Self {
            font_tag: style.font_tag.clone(),
            animation_tag: style.animation_tag.clone(),
            effect_tag: style.effect_tag.clone(),
            color_tag: style.color_tag.clone(),
            intensity: style.intensity,
        }
    }
}

/// One lyric line's rendered unit of video: a background plus a timed text
/// overlay. Created by the synthesis engine, consumed by rendering, and
/// never mutated afterwards except for reordering by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// 1-based sequence index matching lyric order.
    pub id: u32,
    /// Lyric text rendered as the overlay.
    pub lyric_text: String,
    /// Path to the generated background image.
    pub background: PathBuf,
    /// Start time within the song, in seconds.
    pub start_time: f64,
    /// On-screen duration in seconds.
    pub duration: f64,
    /// Display name of the style this scene was generated with.
    pub style_name: String,
    /// Rendering directives from the style profile.
    pub rendering_directives: RenderingDirectives,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleLibrary;

    #[test]
    fn test_directives_from_style() {
        let lib = StyleLibrary::builtin();
        let style = lib.select(Some("cyberpunk"));
        let directives = RenderingDirectives::from_style(style);
        assert_eq!(directives.animation_tag, style.animation_tag);
        assert_eq!(directives.intensity, Intensity::High);
    }

    #[test]
    fn test_scene_roundtrip() {
        let lib = StyleLibrary::builtin();
        let style = lib.default_profile();
        let scene = Scene {
            id: 1,
            lyric_text: "hello world".to_string(),
            background: PathBuf::from("/tmp/scene_1_bg.png"),
            start_time: 0.0,
            duration: 1.0,
            style_name: style.name.clone(),
            rendering_directives: RenderingDirectives::from_style(style),
        };
        let json = serde_json::to_string(&scene).unwrap();
        let back: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, 1);
        assert_eq!(back.lyric_text, "hello world");
    }
}
