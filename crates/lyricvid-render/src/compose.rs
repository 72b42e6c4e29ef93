//! Per-scene frame composition.
//!
//! Composites the scene background and the rasterised text overlay into a
//! sequence of frames, sampling the motion engine at each frame time.
//! Overlay-family motions offset the overlay placement; frame-family motions
//! apply an affine transform plus an opacity scalar to the composed frame.

use std::path::Path;

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use tracing::debug;

use lyricvid_models::{Intensity, Resolution};

use crate::error::RenderResult;
use crate::motion::{FrameTransform, Motion};

/// Resize a background to the target resolution if needed.
pub fn fit_background(background: &RgbaImage, resolution: Resolution) -> RgbaImage {
    if background.dimensions() == (resolution.width, resolution.height) {
        return background.clone();
    }
    image::imageops::resize(
        background,
        resolution.width,
        resolution.height,
        FilterType::Triangle,
    )
}

/// Compose one frame at time `t`.
pub fn compose_frame(
    background: &RgbaImage,
    overlay: &RgbaImage,
    motion: &Motion,
    t: f64,
    duration: f64,
    intensity: Intensity,
) -> RgbaImage {
    match motion {
        Motion::Overlay(f) => {
            let sample = f(t, duration, intensity);
            let mut frame = background.clone();
            place_overlay(&mut frame, overlay, sample.dx, sample.dy, sample.opacity);
            frame
        }
        Motion::Frame(f) => {
            let transform = f(t, duration, intensity);
            let mut frame = background.clone();
            place_overlay(&mut frame, overlay, 0.0, 0.0, 1.0);
            if transform.is_identity() {
                frame
            } else {
                apply_frame_transform(&frame, &transform)
            }
        }
    }
}

/// Blend the overlay onto the frame, centered plus an offset, with an
/// opacity multiplier applied to the overlay's alpha channel.
pub fn place_overlay(frame: &mut RgbaImage, overlay: &RgbaImage, dx: f64, dy: f64, opacity: f64) {
    if opacity <= 0.0 {
        return;
    }
    let opacity = opacity.min(1.0);
    let (fw, fh) = frame.dimensions();
    let (ow, oh) = overlay.dimensions();
    let origin_x = (fw as i64 - ow as i64) / 2 + dx.round() as i64;
    let origin_y = (fh as i64 - oh as i64) / 2 + dy.round() as i64;

    for (x, y, src) in overlay.enumerate_pixels() {
        let alpha = src.0[3] as f64 / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }
        let fx = origin_x + x as i64;
        let fy = origin_y + y as i64;
        if fx < 0 || fy < 0 || fx >= fw as i64 || fy >= fh as i64 {
            continue;
        }
        let dst = frame.get_pixel_mut(fx as u32, fy as u32);
        for c in 0..3 {
            dst.0[c] = (dst.0[c] as f64 * (1.0 - alpha) + src.0[c] as f64 * alpha) as u8;
        }
    }
}

/// Apply an affine transform (translation, uniform scale, rotation about the
/// frame center) plus an opacity scalar, via inverse mapping with nearest
/// sampling. Pixels mapped from outside the source are black.
pub fn apply_frame_transform(frame: &RgbaImage, transform: &FrameTransform) -> RgbaImage {
    let (w, h) = frame.dimensions();
    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;
    let scale = if transform.scale.abs() < 1e-6 {
        1e-6
    } else {
        transform.scale
    };
    let angle = -transform.rotation.to_radians();
    let (sin, cos) = angle.sin_cos();
    let opacity = transform.opacity.clamp(0.0, 1.0);

    RgbaImage::from_fn(w, h, |x, y| {
        // Inverse map: undo translation, then rotation and scale about center
        let rx = x as f64 - cx - transform.dx;
        let ry = y as f64 - cy - transform.dy;
        let sx = (rx * cos - ry * sin) / scale + cx;
        let sy = (rx * sin + ry * cos) / scale + cy;

        let px = sx.round();
        let py = sy.round();
        if px < 0.0 || py < 0.0 || px >= w as f64 || py >= h as f64 {
            return Rgba([0, 0, 0, 255]);
        }
        let src = frame.get_pixel(px as u32, py as u32);
        Rgba([
            (src.0[0] as f64 * opacity) as u8,
            (src.0[1] as f64 * opacity) as u8,
            (src.0[2] as f64 * opacity) as u8,
            255,
        ])
    })
}

/// Render a scene's frame sequence into `frames_dir` as `frame_%05d.png`.
///
/// Returns the number of frames written. CPU-bound; callers run it on a
/// blocking thread.
pub fn render_scene_frames(
    background: &RgbaImage,
    overlay: &RgbaImage,
    motion: &Motion,
    duration: f64,
    intensity: Intensity,
    fps: u32,
    frames_dir: &Path,
) -> RenderResult<usize> {
    let frame_count = ((duration * fps as f64).ceil() as usize).max(1);
    std::fs::create_dir_all(frames_dir)?;

    for i in 0..frame_count {
        let t = i as f64 / fps as f64;
        let frame = compose_frame(background, overlay, motion, t, duration, intensity);
        let path = frames_dir.join(format!("frame_{:05}.png", i));
        frame.save(&path)?;
    }

    debug!(
        frames = frame_count,
        dir = %frames_dir.display(),
        "Rendered scene frames"
    );
    Ok(frame_count)
}
