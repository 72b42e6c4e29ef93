//! Style post-effects applied to scene backgrounds.
//!
//! Closed registry keyed by effect tag. Unknown tags resolve to the no-op
//! effect rather than failing the scene.

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Apply the post-effect selected by an effect tag.
///
/// `seed` keeps the randomized decoration deterministic per scene.
pub fn apply_effect(tag: &str, image: RgbaImage, seed: u64) -> RgbaImage {
    match tag {
        "EFFECT_CHROMA_LEAK" => chroma_leak(image, seed),
        "EFFECT_NONE" => image,
        _ => image,
    }
}

/// Whether a tag names a registered effect.
pub fn is_known_effect(tag: &str) -> bool {
    matches!(tag, "EFFECT_CHROMA_LEAK" | "EFFECT_NONE")
}

/// Chromatic aberration plus warm light leaks and a soft bloom.
fn chroma_leak(image: RgbaImage, seed: u64) -> RgbaImage {
    let (w, h) = image.dimensions();
    let offset = 2i32;

    // Shift red right and blue left by a couple of pixels.
    let mut shifted = RgbaImage::new(w, h);
    for (x, y, px) in shifted.enumerate_pixels_mut() {
        let xi = x as i32;
        let r = sample(&image, xi - offset, y).0[0];
        let g = image.get_pixel(x, y).0[1];
        let b = sample(&image, xi + offset, y).0[2];
        *px = Rgba([r, g, b, 255]);
    }

    // Warm light-leak blobs.
    let mut rng = StdRng::seed_from_u64(seed ^ LEAK_SEED);
    for _ in 0..10 {
        let cx = rng.random_range(0..w) as i32;
        let cy = rng.random_range(0..h) as i32;
        let radius = rng.random_range(50..200);
        let alpha = rng.random_range(10..40) as f32 / 255.0;
        soft_blob(&mut shifted, cx, cy, radius, [255, 255, 200], alpha);
    }

    // Soft bloom and a slight lift.
    let blurred = image::imageops::blur(&shifted, 1.0);
    let mut out = RgbaImage::new(w, h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let p = blurred.get_pixel(x, y);
        *px = Rgba([
            lift(p.0[0]),
            lift(p.0[1]),
            lift(p.0[2]),
            255,
        ]);
    }
    out
}

fn lift(v: u8) -> u8 {
    ((v as f32 * 1.05).min(255.0)) as u8
}

fn sample(img: &RgbaImage, x: i32, y: u32) -> Rgba<u8> {
    let x = x.clamp(0, img.width() as i32 - 1) as u32;
    *img.get_pixel(x, y)
}

fn soft_blob(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, rgb: [u8; 3], alpha: f32) {
    let (w, h) = img.dimensions();
    let x0 = (cx - radius).max(0);
    let x1 = (cx + radius).min(w as i32 - 1);
    let y0 = (cy - radius).max(0);
    let y1 = (cy + radius).min(h as i32 - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = (x - cx) as f32;
            let dy = (y - cy) as f32;
            let d = (dx * dx + dy * dy).sqrt() / radius as f32;
            if d > 1.0 {
                continue;
            }
            let a = alpha * (1.0 - d);
            let p = img.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                p.0[c] = (p.0[c] as f32 * (1.0 - a) + rgb[c] as f32 * a) as u8;
            }
        }
    }
}

/// Decorrelates leak placement from the background generator's seed.
const LEAK_SEED: u64 = 0x5eed_1eaf;

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| {
            let v = (x * 255 / w.max(1)) as u8;
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_none_is_identity() {
        let img = gradient(64, 32);
        let out = apply_effect("EFFECT_NONE", img.clone(), 1);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_unknown_tag_is_identity() {
        let img = gradient(64, 32);
        let out = apply_effect("EFFECT_DATA_MOSH", img.clone(), 1);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_chroma_leak_changes_pixels() {
        let img = gradient(64, 32);
        let out = apply_effect("EFFECT_CHROMA_LEAK", img.clone(), 7);
        assert_eq!(out.dimensions(), img.dimensions());
        assert_ne!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_chroma_leak_deterministic() {
        let img = gradient(64, 32);
        let a = apply_effect("EFFECT_CHROMA_LEAK", img.clone(), 7);
        let b = apply_effect("EFFECT_CHROMA_LEAK", img, 7);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_known_effects() {
        assert!(is_known_effect("EFFECT_NONE"));
        assert!(is_known_effect("EFFECT_CHROMA_LEAK"));
        assert!(!is_known_effect("EFFECT_VHS"));
    }
}
