//! Text overlay rasterisation.
//!
//! The lyric text is wrapped to roughly 85% of the frame width with centered
//! lines, then rasterised once per scene onto a transparent canvas through
//! FFmpeg's `lavfi`/`drawtext` source. The resulting raster is composited
//! per frame by the scene compositor with motion-engine offsets.

use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use lyricvid_models::{ColorPalette, FontSpec, RenderingDirectives, Resolution};

use crate::encode::{FfmpegCommand, FfmpegRunner};
use crate::error::{RenderError, RenderResult};

/// Fraction of the frame width available to the text overlay.
pub const OVERLAY_WIDTH_FRACTION: f64 = 0.85;

/// Approximate glyph width as a fraction of the font size, used for wrapping.
const CHAR_WIDTH_FRACTION: f64 = 0.55;

/// Font size scaled from its 1080p reference to the output resolution.
pub fn scaled_font_size(font: &FontSpec, resolution: Resolution) -> u32 {
    let scaled = font.size as f64 * resolution.height as f64 / 1080.0;
    (scaled as u32).max(12)
}

/// Characters that fit on one wrapped line at the given font size.
pub fn chars_per_line(font_size: u32, resolution: Resolution) -> usize {
    let usable = resolution.width as f64 * OVERLAY_WIDTH_FRACTION;
    let char_width = font_size as f64 * CHAR_WIDTH_FRACTION;
    ((usable / char_width) as usize).max(1)
}

/// Greedy word wrap. Words longer than a line get their own line rather
/// than being split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Build the `drawtext` filter string for a pre-wrapped text file.
pub fn build_drawtext_filter(
    textfile: &Path,
    font: &FontSpec,
    font_size: u32,
    primary: &str,
    shadow: &str,
) -> String {
    let mut filter = format!(
        "drawtext=textfile='{}':font='{}':fontsize={}:fontcolor={}:\
         x=(w-text_w)/2:y=(h-text_h)/2:line_spacing={}",
        textfile.to_string_lossy(),
        font.family,
        font_size,
        primary,
        font_size / 4,
    );
    if font.stroke_width > 0 {
        filter.push_str(&format!(
            ":borderw={}:bordercolor={}",
            font.stroke_width, shadow
        ));
    }
    filter
}

/// Rasterise the lyric text onto a transparent canvas sized to the frame.
///
/// Writes the overlay PNG next to `work_dir` and returns the loaded raster.
pub async fn rasterize_overlay(
    text: &str,
    directives: &RenderingDirectives,
    resolution: Resolution,
    work_dir: &Path,
    scene_id: u32,
) -> RenderResult<RgbaImage> {
    let font = FontSpec::for_tag(&directives.font_tag);
    let palette = ColorPalette::for_tag(&directives.color_tag);
    let font_size = scaled_font_size(&font, resolution);

    let wrapped = wrap_text(text, chars_per_line(font_size, resolution)).join("\n");
    let textfile = work_dir.join(format!("scene_{}_text.txt", scene_id));
    tokio::fs::write(&textfile, &wrapped).await?;

    let output = work_dir.join(format!("scene_{}_overlay.png", scene_id));
    let canvas = format!(
        "color=c=black@0.0:s={}x{},format=rgba",
        resolution.width, resolution.height
    );
    let filter = build_drawtext_filter(&textfile, &font, font_size, &palette.primary, &palette.shadow);

    let cmd = FfmpegCommand::new(canvas, &output)
        .input_arg("-f")
        .input_arg("lavfi")
        .video_filter(filter)
        .single_frame();

    FfmpegRunner::new()
        .run(&cmd)
        .await
        .map_err(|e| RenderError::overlay_failed(e.to_string()))?;

    debug!(scene_id = scene_id, overlay = %output.display(), "Rasterised overlay");

    let raster = image::open(&output)
        .map_err(|e| RenderError::overlay_failed(format!("failed to load overlay: {}", e)))?
        .to_rgba8();
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricvid_models::Intensity;

    const RES: Resolution = Resolution::new(1280, 720);

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 15);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() <= 15, "line too long: {:?}", line);
        }
    }

    #[test]
    fn test_wrap_preserves_words() {
        let text = "hello wonderful world";
        let lines = wrap_text(text, 10);
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_long_word_kept_whole() {
        let lines = wrap_text("a supercalifragilistic b", 8);
        assert!(lines.contains(&"supercalifragilistic".to_string()));
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn test_font_scaling() {
        let font = FontSpec::default();
        let full = scaled_font_size(&font, Resolution::new(1920, 1080));
        let half = scaled_font_size(&font, Resolution::new(960, 540));
        assert_eq!(full, font.size);
        assert_eq!(half, font.size / 2);
    }

    #[test]
    fn test_chars_per_line_nonzero() {
        assert!(chars_per_line(90, RES) > 0);
        // Even an absurd font size yields at least one column
        assert_eq!(chars_per_line(100_000, RES), 1);
    }

    #[test]
    fn test_drawtext_filter_contents() {
        let directives = RenderingDirectives {
            font_tag: "FONT_TECH_BOLD".to_string(),
            animation_tag: "ANIMATION_FLOAT_FADE".to_string(),
            effect_tag: "EFFECT_NONE".to_string(),
            color_tag: "COLOR_NEON_DARK".to_string(),
            intensity: Intensity::Medium,
        };
        let font = FontSpec::for_tag(&directives.font_tag);
        let filter = build_drawtext_filter(
            Path::new("/tmp/text.txt"),
            &font,
            64,
            "#FF2A6D",
            "#01012B",
        );
        assert!(filter.contains("textfile='/tmp/text.txt'"));
        assert!(filter.contains("fontsize=64"));
        assert!(filter.contains("fontcolor=#FF2A6D"));
        // Bold tech font carries a stroke
        assert!(filter.contains("borderw=2"));
        assert!(filter.contains("x=(w-text_w)/2"));
    }
}
