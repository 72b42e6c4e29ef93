//! Style profiles, font specs and color palettes.
//!
//! A [`StyleProfile`] bundles the generation/animation/font/color directives
//! that govern one job's look. Profiles live in a [`StyleLibrary`] owned by
//! the pipeline (never a global) so tests can inject their own.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Animation intensity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    #[default]
    Medium,
    High,
}

impl Intensity {
    /// Scalar multiplier applied to motion amplitudes.
    pub fn multiplier(&self) -> f64 {
        match self {
            Intensity::Low => 0.6,
            Intensity::Medium => 1.0,
            Intensity::High => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = IntensityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            _ => Err(IntensityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown intensity: {0}")]
pub struct IntensityParseError(String);

/// A named bundle of generation/animation/font/color directives.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StyleProfile {
    /// Display name (e.g. "Dreamy Ethereal").
    pub name: String,
    /// Registry key (e.g. "dreamy_ethereal").
    pub key: String,
    /// Keyword templates fed into AI texture prompts.
    pub generation_keywords: Vec<String>,
    /// Mood tag describing the overall feel.
    pub mood_tag: String,
    /// Animation tag resolved by the motion engine.
    pub animation_tag: String,
    /// Font tag resolved by [`FontSpec::for_tag`].
    pub font_tag: String,
    /// Post-effect tag resolved by the effect registry.
    pub effect_tag: String,
    /// Color tag resolved by [`ColorPalette::for_tag`].
    pub color_tag: String,
    /// Motion intensity.
    pub intensity: Intensity,
    /// Suitable tempo range `[min, max]` in BPM.
    pub bpm_range: [u32; 2],
    /// Moods this style suits.
    pub suitable_moods: Vec<String>,
}

impl StyleProfile {
    /// Whether this style belongs to the soft-gradient-with-particles family
    /// (as opposed to the flat-minimal family) for procedural generation.
    pub fn is_soft_gradient_family(&self) -> bool {
        !self.key.contains("minimal") && !self.key.contains("brutalist")
    }
}

/// Registry of the built-in style profiles.
///
/// Selection is a best-effort substring match on the registry key; the
/// dreamy-ethereal profile is the guaranteed fallback.
#[derive(Debug, Clone)]
pub struct StyleLibrary {
    profiles: Vec<StyleProfile>,
}

impl StyleLibrary {
    /// Library with the full built-in catalogue.
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
        }
    }

    /// All registered profiles.
    pub fn profiles(&self) -> &[StyleProfile] {
        &self.profiles
    }

    /// Select a profile by best-effort substring match on the requested name.
    ///
    /// `None`, an empty string, or an unknown name all resolve to the
    /// default profile.
    pub fn select(&self, requested: Option<&str>) -> &StyleProfile {
        if let Some(req) = requested {
            let req = req.trim().to_lowercase();
            if !req.is_empty() {
                if let Some(profile) = self
                    .profiles
                    .iter()
                    .find(|p| p.key.contains(&req) || req.contains(&p.key))
                {
                    return profile;
                }
            }
        }
        self.default_profile()
    }

    /// The guaranteed fallback profile.
    pub fn default_profile(&self) -> &StyleProfile {
        self.profiles
            .iter()
            .find(|p| p.key == "dreamy_ethereal")
            .unwrap_or(&self.profiles[0])
    }
}

impl Default for StyleLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn profile(
    key: &str,
    name: &str,
    keywords: &[&str],
    mood_tag: &str,
    animation_tag: &str,
    font_tag: &str,
    effect_tag: &str,
    color_tag: &str,
    intensity: Intensity,
    bpm_range: [u32; 2],
    moods: &[&str],
) -> StyleProfile {
    StyleProfile {
        name: name.to_string(),
        key: key.to_string(),
        generation_keywords: keywords.iter().map(|s| s.to_string()).collect(),
        mood_tag: mood_tag.to_string(),
        animation_tag: animation_tag.to_string(),
        font_tag: font_tag.to_string(),
        effect_tag: effect_tag.to_string(),
        color_tag: color_tag.to_string(),
        intensity,
        bpm_range,
        suitable_moods: moods.iter().map(|s| s.to_string()).collect(),
    }
}

fn builtin_profiles() -> Vec<StyleProfile> {
    vec![
        profile(
            "dreamy_ethereal",
            "Dreamy Ethereal",
            &[
                "soft focus cinematography",
                "pastel color palette",
                "volumetric lighting",
                "subtle lens flare",
                "slow motion ethereal",
            ],
            "MOOD_ETHEREAL",
            "ANIMATION_WOBBLE_SPRING",
            "FONT_SERIF_THIN",
            "EFFECT_CHROMA_LEAK",
            "COLOR_PASTEL_PEACH",
            Intensity::Low,
            [60, 120],
            &["romantic", "melancholic", "dreamy", "peaceful", "nostalgic"],
        ),
        profile(
            "minimalist_typography",
            "Minimalist Typography",
            &["clean neutral background", "soft flat lighting", "subtle texture"],
            "MOOD_CLEAN",
            "ANIMATION_SLIDE_INERTIA",
            "FONT_GEOMETRIC_THIN",
            "EFFECT_NONE",
            "COLOR_MONOCHROME_HIGH",
            Intensity::Low,
            [70, 130],
            &["clean", "focused", "calm", "minimal", "elegant"],
        ),
        profile(
            "cyberpunk_glitch",
            "Cyberpunk Glitch",
            &[
                "cyberpunk aesthetic",
                "neon lighting",
                "glitch effect",
                "holographic interface",
            ],
            "MOOD_EDGY",
            "ANIMATION_SHATTER_COLLISION",
            "FONT_TECH_BOLD",
            "EFFECT_CHROMA_LEAK",
            "COLOR_NEON_DARK",
            Intensity::High,
            [120, 180],
            &["energetic", "anxious", "futuristic", "rebellious", "digital"],
        ),
        profile(
            "vintage_film",
            "Vintage Film",
            &[
                "16mm film grain",
                "vintage super 8",
                "film burn effect",
                "analog texture",
            ],
            "MOOD_NOSTALGIC",
            "ANIMATION_JITTER_DAMP",
            "FONT_SERIF_CLASSIC",
            "EFFECT_CHROMA_LEAK",
            "COLOR_VINTAGE_FADE",
            Intensity::Medium,
            [80, 140],
            &["nostalgic", "warm", "melancholic", "romantic", "retro"],
        ),
        profile(
            "lofi_aesthetic",
            "Lo-fi Aesthetic",
            &["VHS effect", "crushed blacks", "analog warmth", "home video"],
            "MOOD_CHILL",
            "ANIMATION_LOFI_WOBBLE",
            "FONT_HANDWRITTEN",
            "EFFECT_NONE",
            "COLOR_LOFI",
            Intensity::Medium,
            [70, 100],
            &["chill", "calm", "relaxed", "intimate", "cozy"],
        ),
        profile(
            "kinetic_typography",
            "Kinetic Typography",
            &[
                "kinetic typography",
                "motion graphics",
                "dynamic composition",
                "graphic design",
            ],
            "MOOD_DYNAMIC",
            "ANIMATION_TYPE_PULSE",
            "FONT_BOLD_MODERN",
            "EFFECT_NONE",
            "COLOR_HIGH_CONTRAST",
            Intensity::Medium,
            [90, 150],
            &["energetic", "powerful", "dramatic", "confident", "uplifting"],
        ),
        profile(
            "particle_abstract",
            "Particle Abstract",
            &[
                "abstract particles",
                "fluid simulation",
                "nebula clouds",
                "organic motion",
            ],
            "MOOD_ABSTRACT",
            "ANIMATION_PARTICLE_DECAY",
            "FONT_GEOMETRIC_THIN",
            "EFFECT_CHROMA_LEAK",
            "COLOR_GRADIENT_DARK",
            Intensity::Medium,
            [60, 140],
            &["ethereal", "mysterious", "flowing", "hypnotic", "atmospheric"],
        ),
        profile(
            "brutalist_bold",
            "Brutalist Bold",
            &[
                "brutalist architecture",
                "concrete texture",
                "bold typography",
                "high contrast",
            ],
            "MOOD_BOLD",
            "ANIMATION_SLIDE_INERTIA",
            "FONT_ARCHITECTURAL",
            "EFFECT_NONE",
            "COLOR_MONOCHROME_LOW",
            Intensity::High,
            [100, 160],
            &["bold", "powerful", "raw", "industrial", "confrontational"],
        ),
        profile(
            "floating_dream",
            "Floating Dream",
            &[
                "floating in space",
                "zero gravity",
                "soft movement",
                "dream sequence",
            ],
            "MOOD_DREAMY",
            "ANIMATION_FLOAT_FADE",
            "FONT_SERIF_THIN",
            "EFFECT_CHROMA_LEAK",
            "COLOR_PASTEL_BLUE",
            Intensity::Low,
            [50, 90],
            &["dreamy", "peaceful", "floaty", "meditative", "serene"],
        ),
        profile(
            "glitch_core",
            "Glitch Core",
            &[
                "data moshing",
                "digital corruption",
                "pixel sorting",
                "error artifacts",
            ],
            "MOOD_GLITCH",
            "ANIMATION_SHATTER_COLLISION",
            "FONT_TECH_BOLD",
            "EFFECT_CHROMA_LEAK",
            "COLOR_DIGITAL",
            Intensity::High,
            [130, 200],
            &["chaotic", "anxious", "digital", "futuristic", "disorienting"],
        ),
    ]
}

/// Font directives resolved from a font tag.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FontSpec {
    /// Font family passed to the text rasteriser.
    pub family: String,
    /// Point size at 1080p; scaled with the output resolution.
    pub size: u32,
    /// Extra letter spacing in pixels.
    pub letter_spacing: u32,
    /// Outline stroke width in pixels (0 = none).
    pub stroke_width: u32,
}

impl FontSpec {
    /// Resolve a font tag to a concrete spec. Unknown tags get the default.
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "FONT_SERIF_THIN" | "FONT_SERIF_CLASSIC" => Self {
                family: "Georgia".to_string(),
                size: 90,
                letter_spacing: 0,
                stroke_width: 0,
            },
            "FONT_GEOMETRIC_THIN" => Self {
                family: "Helvetica".to_string(),
                size: 110,
                letter_spacing: 8,
                stroke_width: 0,
            },
            "FONT_TECH_BOLD" | "FONT_BOLD_MODERN" | "FONT_ARCHITECTURAL" => Self {
                family: "Arial Bold".to_string(),
                size: 100,
                letter_spacing: 2,
                stroke_width: 2,
            },
            "FONT_HANDWRITTEN" => Self {
                family: "Comic Sans MS".to_string(),
                size: 84,
                letter_spacing: 0,
                stroke_width: 0,
            },
            _ => Self::default(),
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 90,
            letter_spacing: 0,
            stroke_width: 0,
        }
    }
}

/// Five-swatch color palette resolved from a color tag.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub shadow: String,
}

impl ColorPalette {
    /// Resolve a color tag to a palette. Unknown tags get pastel peach.
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "COLOR_MONOCHROME_HIGH" => Self::new("#FFFFFF", "#CCCCCC", "#000000", "#F5F5F5", "#333333"),
            "COLOR_MONOCHROME_LOW" => Self::new("#DDDDDD", "#888888", "#222222", "#2B2B2B", "#000000"),
            "COLOR_NEON_DARK" => Self::new("#FF2A6D", "#05D9E8", "#D1F7FF", "#0D0221", "#01012B"),
            "COLOR_VINTAGE_FADE" => Self::new("#E8D8C3", "#C9A66B", "#7D5A44", "#3E2C23", "#1F1510"),
            "COLOR_LOFI" => Self::new("#E6C9A8", "#A98467", "#6C584C", "#32292F", "#201A1E"),
            "COLOR_HIGH_CONTRAST" => Self::new("#FFFFFF", "#FFD400", "#FF0054", "#101010", "#000000"),
            "COLOR_GRADIENT_DARK" => Self::new("#C0B7E8", "#8C7AA9", "#5D4E7B", "#27203C", "#120D24"),
            "COLOR_PASTEL_BLUE" => Self::new("#D6E5FA", "#B8C6DB", "#F5E3E0", "#E4F1FE", "#C9D6DF"),
            "COLOR_DIGITAL" => Self::new("#00FF9F", "#00B8FF", "#BD00FF", "#001510", "#000A07"),
            _ => Self::new("#F8D8C9", "#B0E0E6", "#FFF5EE", "#F5F5F5", "#E6E6FA"),
        }
    }

    fn new(primary: &str, secondary: &str, accent: &str, background: &str, shadow: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            accent: accent.to_string(),
            background: background.to_string(),
            shadow: shadow.to_string(),
        }
    }

    /// Parse one of the palette swatches into RGB.
    pub fn rgb(hex: &str) -> [u8; 3] {
        parse_hex(hex).unwrap_or([128, 128, 128])
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_parse() {
        assert_eq!("low".parse::<Intensity>().unwrap(), Intensity::Low);
        assert_eq!("HIGH".parse::<Intensity>().unwrap(), Intensity::High);
        assert!("extreme".parse::<Intensity>().is_err());
    }

    #[test]
    fn test_select_substring_match() {
        let lib = StyleLibrary::builtin();
        assert_eq!(lib.select(Some("minimalist")).key, "minimalist_typography");
        assert_eq!(lib.select(Some("glitch_core")).key, "glitch_core");
        assert_eq!(lib.select(Some("vintage")).key, "vintage_film");
    }

    #[test]
    fn test_select_falls_back_to_default() {
        let lib = StyleLibrary::builtin();
        assert_eq!(lib.select(None).key, "dreamy_ethereal");
        assert_eq!(lib.select(Some("")).key, "dreamy_ethereal");
        assert_eq!(lib.select(Some("no_such_style")).key, "dreamy_ethereal");
    }

    #[test]
    fn test_profile_families() {
        let lib = StyleLibrary::builtin();
        assert!(lib.select(Some("dreamy")).is_soft_gradient_family());
        assert!(!lib.select(Some("minimalist")).is_soft_gradient_family());
        assert!(!lib.select(Some("brutalist")).is_soft_gradient_family());
    }

    #[test]
    fn test_font_spec_unknown_tag_defaults() {
        let spec = FontSpec::for_tag("FONT_NOT_A_TAG");
        assert_eq!(spec.family, "Arial");
    }

    #[test]
    fn test_palette_hex_parse() {
        assert_eq!(ColorPalette::rgb("#FFFFFF"), [255, 255, 255]);
        assert_eq!(ColorPalette::rgb("#0D0221"), [13, 2, 33]);
        // Malformed swatches fall back to gray instead of panicking
        assert_eq!(ColorPalette::rgb("garbage"), [128, 128, 128]);
    }

    #[test]
    fn test_all_palette_swatches_parse() {
        for p in StyleLibrary::builtin().profiles() {
            let palette = ColorPalette::for_tag(&p.color_tag);
            for hex in [
                &palette.primary,
                &palette.secondary,
                &palette.accent,
                &palette.background,
                &palette.shadow,
            ] {
                assert!(parse_hex(hex).is_some(), "bad swatch {} in {}", hex, p.key);
            }
        }
    }
}
