//! Deterministic procedural background generators.
//!
//! The guaranteed terminal fallback of the background source chain: seeded
//! from a hash of the lyric text so regeneration is reproducible, with
//! content-adaptive decoration driven by mood-indicating words. Two
//! families: soft gradients with particle motifs, and flat minimal
//! compositions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lyricvid_models::{ColorPalette, Resolution, StyleProfile};

/// Deterministic seed derived from the lyric text.
pub fn seed_from_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Generate a background for a lyric line in the given style family.
///
/// Always succeeds; this is the terminal fallback of the synthesis chain.
pub fn generate_background(
    lyric_text: &str,
    style: &StyleProfile,
    resolution: Resolution,
) -> RgbaImage {
    let seed = seed_from_text(lyric_text);
    let palette = ColorPalette::for_tag(&style.color_tag);
    if style.is_soft_gradient_family() {
        soft_gradient_background(lyric_text, seed, &palette, resolution)
    } else {
        flat_minimal_background(lyric_text, seed, &palette, resolution)
    }
}

/// Plain vertical gradient built from a style's palette.
///
/// Used when a scene's stored background cannot be loaded at render time,
/// so the pipeline never aborts on a single scene's failure.
pub fn gradient_fallback(palette: &ColorPalette, resolution: Resolution) -> RgbaImage {
    let top = ColorPalette::rgb(&palette.background);
    let bottom = ColorPalette::rgb(&palette.accent);
    vertical_gradient(resolution, top, bottom)
}

/// Soft-gradient family: pastel gradient, particle motifs, mood extras.
pub fn soft_gradient_background(
    lyric_text: &str,
    seed: u64,
    palette: &ColorPalette,
    resolution: Resolution,
) -> RgbaImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let (w, h) = (resolution.width, resolution.height);

    // Gradient endpoints drift around the palette so repeated lyrics in the
    // same style still differ.
    let top = jitter_color(ColorPalette::rgb(&palette.background), &mut rng, 18);
    let bottom = jitter_color(ColorPalette::rgb(&palette.secondary), &mut rng, 18);
    let mut img = vertical_gradient(resolution, top, bottom);

    let text = lyric_text.to_lowercase();
    let motifs = particle_motifs(&text);
    let count = rng.random_range(150..400);

    for _ in 0..count {
        let x = rng.random_range(0..w) as i32;
        let y = rng.random_range(0..h) as i32;
        match motifs[rng.random_range(0..motifs.len())] {
            Motif::Ray => {
                let dx = rng.random_range(-50..=50);
                let dy = rng.random_range(-100..=100);
                let alpha = rng.random_range(20..80) as u8;
                draw_line(&mut img, x, y, x + dx, y + dy, Rgba([255, 255, 255, alpha]));
            }
            Motif::Flare => {
                let r = rng.random_range(5..40);
                let alpha = rng.random_range(10..60) as u8;
                fill_disc(&mut img, x, y, r, Rgba([255, 250, 200, alpha]));
            }
            Motif::Sparkle => {
                let r = rng.random_range(1..4);
                let alpha = rng.random_range(50..200) as u8;
                fill_disc(&mut img, x, y, r, Rgba([255, 255, 255, alpha]));
            }
            Motif::Bubble => {
                let r = rng.random_range(10..50);
                let alpha = rng.random_range(30..100) as u8;
                ring(&mut img, x, y, r, Rgba([255, 255, 255, alpha]));
            }
        }
    }

    // Lens flare cluster
    let fx = rng.random_range(w / 6..w * 5 / 6) as i32;
    let fy = rng.random_range(h / 5..h * 4 / 5) as i32;
    for i in (1..=5).rev() {
        fill_disc(&mut img, fx, fy, i * 40, Rgba([255, 255, 200, (i * 10) as u8]));
    }

    if contains_any(&text, &["sad", "tear", "lonely", "cry"]) {
        for _ in 0..120 {
            let x = rng.random_range(0..w) as i32;
            let y = rng.random_range(0..h) as i32;
            let len = rng.random_range(10..30);
            let alpha = rng.random_range(10..40) as u8;
            draw_line(&mut img, x, y, x, y + len, Rgba([200, 220, 255, alpha]));
        }
    }
    if contains_any(&text, &["happy", "joy", "dance", "smile"]) {
        let confetti = [
            [255u8, 100, 100],
            [255, 200, 100],
            [255, 255, 100],
            [100, 255, 100],
            [100, 100, 255],
            [200, 100, 255],
        ];
        for _ in 0..100 {
            let x = rng.random_range(0..w) as i32;
            let y = rng.random_range(0..h) as i32;
            let c = confetti[rng.random_range(0..confetti.len())];
            let alpha = rng.random_range(20..60) as u8;
            fill_disc(&mut img, x, y, 10, Rgba([c[0], c[1], c[2], alpha]));
        }
    }

    img
}

/// Flat-minimal family: flat field, grain, sparse rules, word-driven geometry.
pub fn flat_minimal_background(
    lyric_text: &str,
    seed: u64,
    palette: &ColorPalette,
    resolution: Resolution,
) -> RgbaImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let (w, h) = (resolution.width, resolution.height);
    let base = ColorPalette::rgb(&palette.background);
    let mut img = RgbaImage::from_pixel(w, h, Rgba([base[0], base[1], base[2], 255]));

    // Fine grain
    for _ in 0..(w * h / 400) {
        let x = rng.random_range(0..w);
        let y = rng.random_range(0..h);
        let v = rng.random_range(-10i16..=10);
        let p = img.get_pixel_mut(x, y);
        for c in 0..3 {
            p.0[c] = (p.0[c] as i16 + v).clamp(0, 255) as u8;
        }
    }

    // Sparse rules
    let shadow = ColorPalette::rgb(&palette.shadow);
    for _ in 0..rng.random_range(3..8) {
        let x0 = rng.random_range(0..w.saturating_sub(100).max(1)) as i32;
        let y0 = rng.random_range(0..h.saturating_sub(100).max(1)) as i32;
        let horizontal = rng.random_range(0..2) == 0;
        let len = rng.random_range(200..500);
        let (x1, y1) = if horizontal { (x0 + len, y0) } else { (x0, y0 + len) };
        draw_line(
            &mut img,
            x0,
            y0,
            x1,
            y1,
            Rgba([shadow[0], shadow[1], shadow[2], 255]),
        );
    }

    let text = lyric_text.to_lowercase();
    if contains_any(&text, &["circle", "round", "sun", "moon"]) {
        let accent = ColorPalette::rgb(&palette.accent);
        for _ in 0..8 {
            let x = rng.random_range(0..w) as i32;
            let y = rng.random_range(0..h) as i32;
            let r = rng.random_range(20..80);
            fill_disc(&mut img, x, y, r, Rgba([accent[0], accent[1], accent[2], 255]));
        }
    }
    if contains_any(&text, &["line", "straight", "road", "edge"]) {
        let primary = ColorPalette::rgb(&palette.primary);
        for _ in 0..5 {
            let x0 = rng.random_range(0..w) as i32;
            let y0 = rng.random_range(0..h) as i32;
            let x1 = x0 + rng.random_range(-200..=200);
            let y1 = y0 + rng.random_range(-200..=200);
            draw_line(
                &mut img,
                x0,
                y0,
                x1,
                y1,
                Rgba([primary[0], primary[1], primary[2], 255]),
            );
        }
    }

    img
}

#[derive(Clone, Copy)]
enum Motif {
    Ray,
    Flare,
    Sparkle,
    Bubble,
}

fn particle_motifs(text: &str) -> &'static [Motif] {
    if contains_any(text, &["light", "bright", "shine", "glow"]) {
        &[Motif::Ray, Motif::Flare]
    } else if contains_any(text, &["dark", "night", "shadow", "moon", "star"]) {
        &[Motif::Sparkle, Motif::Sparkle, Motif::Flare]
    } else if contains_any(text, &["float", "fly", "soar", "drift"]) {
        &[Motif::Bubble, Motif::Flare]
    } else {
        &[Motif::Sparkle, Motif::Ray, Motif::Flare]
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn jitter_color(rgb: [u8; 3], rng: &mut StdRng, amount: i16) -> [u8; 3] {
    let mut out = [0u8; 3];
    for (i, c) in rgb.iter().enumerate() {
        let v = rng.random_range(-amount..=amount);
        out[i] = (*c as i16 + v).clamp(0, 255) as u8;
    }
    out
}

fn vertical_gradient(resolution: Resolution, top: [u8; 3], bottom: [u8; 3]) -> RgbaImage {
    let (w, h) = (resolution.width, resolution.height);
    RgbaImage::from_fn(w, h, |_, y| {
        let f = y as f32 / h.max(1) as f32;
        let mix = |a: u8, b: u8| (a as f32 * (1.0 - f) + b as f32 * f) as u8;
        Rgba([mix(top[0], bottom[0]), mix(top[1], bottom[1]), mix(top[2], bottom[2]), 255])
    })
}

/// Alpha-blend a single pixel if it is inside the image.
fn blend(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let p = img.get_pixel_mut(x as u32, y as u32);
    let a = color.0[3] as f32 / 255.0;
    for c in 0..3 {
        p.0[c] = (p.0[c] as f32 * (1.0 - a) + color.0[c] as f32 * a) as u8;
    }
}

fn fill_disc(img: &mut RgbaImage, cx: i32, cy: i32, r: i32, color: Rgba<u8>) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                blend(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn ring(img: &mut RgbaImage, cx: i32, cy: i32, r: i32, color: Rgba<u8>) {
    let steps = (r * 8).max(16);
    for i in 0..steps {
        let a = i as f32 / steps as f32 * std::f32::consts::TAU;
        let x = cx + (a.cos() * r as f32) as i32;
        let y = cy + (a.sin() * r as f32) as i32;
        blend(img, x, y, color);
    }
}

fn draw_line(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = x0 + ((x1 - x0) as f32 * t) as i32;
        let y = y0 + ((y1 - y0) as f32 * t) as i32;
        blend(img, x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricvid_models::StyleLibrary;

    const RES: Resolution = Resolution::new(320, 180);

    #[test]
    fn test_seed_deterministic() {
        assert_eq!(seed_from_text("hello"), seed_from_text("hello"));
        assert_ne!(seed_from_text("hello"), seed_from_text("world"));
    }

    #[test]
    fn test_generation_is_reproducible() {
        let lib = StyleLibrary::builtin();
        let style = lib.select(Some("dreamy"));
        let a = generate_background("the light shines", style, RES);
        let b = generate_background("the light shines", style, RES);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_different_lyrics_differ() {
        let lib = StyleLibrary::builtin();
        let style = lib.select(Some("dreamy"));
        let a = generate_background("walking in the rain", style, RES);
        let b = generate_background("dancing in the sun", style, RES);
        assert_ne!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_minimal_family_dispatch() {
        let lib = StyleLibrary::builtin();
        let style = lib.select(Some("minimalist"));
        let img = generate_background("a straight line", style, RES);
        assert_eq!(img.dimensions(), (320, 180));
    }

    #[test]
    fn test_gradient_fallback_dimensions() {
        let palette = ColorPalette::for_tag("COLOR_PASTEL_PEACH");
        let img = gradient_fallback(&palette, RES);
        assert_eq!(img.dimensions(), (320, 180));
        // Top row comes from the background swatch, bottom from the accent
        assert_ne!(img.get_pixel(0, 0), img.get_pixel(0, 179));
    }
}
