//! Animation/physics motion engine.
//!
//! Maps an animation tag to a deterministic, time-parameterized transform.
//! Two families:
//!
//! - **Overlay family** — offsets (and fade windows) applied to the text
//!   overlay's position and opacity.
//! - **Frame family** — closed-form physics models producing an affine
//!   transform plus an opacity scalar applied to every rendered frame.
//!
//! Every function is a total, pure function of `t` so it can be sampled at
//! arbitrary, possibly non-monotonic times. Unknown tags resolve to a fixed
//! 0.5 s fade-in/fade-out. `ANIMATION_` and `PHYSICS_` prefixes are stripped
//! before lookup; the `PHYSICS_` prefix selects the frame family.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use lyricvid_models::Intensity;

/// Position offset and opacity applied to the text overlay at time `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySample {
    pub dx: f64,
    pub dy: f64,
    pub opacity: f64,
}

impl OverlaySample {
    fn centered(opacity: f64) -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            opacity,
        }
    }
}

/// Affine transform plus opacity applied to a whole frame at time `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub dx: f64,
    pub dy: f64,
    pub scale: f64,
    /// Rotation angle in degrees.
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

impl FrameTransform {
    /// Whether this transform leaves the frame untouched.
    pub fn is_identity(&self) -> bool {
        self.dx == 0.0
            && self.dy == 0.0
            && self.scale == 1.0
            && self.rotation == 0.0
            && self.opacity == 1.0
    }
}

pub type OverlayFn = fn(t: f64, duration: f64, intensity: Intensity) -> OverlaySample;
pub type FrameFn = fn(t: f64, duration: f64, intensity: Intensity) -> FrameTransform;

/// A registered motion function from either family.
#[derive(Debug, Clone, Copy)]
pub enum Motion {
    Overlay(OverlayFn),
    Frame(FrameFn),
}

/// Closed registry of motion functions, validated at construction.
#[derive(Debug)]
pub struct MotionRegistry {
    overlay: HashMap<&'static str, OverlayFn>,
    frame: HashMap<&'static str, FrameFn>,
}

impl MotionRegistry {
    /// Registry with all built-in motion functions.
    pub fn builtin() -> Self {
        let mut overlay: HashMap<&'static str, OverlayFn> = HashMap::new();
        overlay.insert("fade", simple_fade);
        overlay.insert("simple_fade", simple_fade);
        overlay.insert("float_fade", simple_fade);
        overlay.insert("wobble_pop", wobble_pop);
        overlay.insert("wobble_spring", wobble_pop);
        overlay.insert("jitter_shake", jitter_shake);
        overlay.insert("jitter_damp", jitter_shake);
        overlay.insert("wipe_type", wipe_type);
        overlay.insert("type_pulse", type_flicker);
        overlay.insert("type_flicker", type_flicker);
        overlay.insert("lofi_wobble", type_flicker);
        overlay.insert("slide_snap", slide_snap);
        overlay.insert("slide_inertia", slide_snap);
        overlay.insert("shatter_shift", shatter_shift);
        overlay.insert("shatter_collision", shatter_shift);
        overlay.insert("depth_fluid", depth_fluid);
        overlay.insert("depth_gravity", depth_fluid);
        overlay.insert("particle_dissolve", particle_dissolve);
        overlay.insert("particle_decay", particle_dissolve);
        overlay.insert("pulse_morph", pulse_morph);
        overlay.insert("abstract_breath", pulse_morph);

        let mut frame: HashMap<&'static str, FrameFn> = HashMap::new();
        frame.insert("float_fade", physics_float_fade);
        frame.insert("jitter_damp", physics_jitter_damp);
        frame.insert("type_pulse", physics_type_pulse);
        frame.insert("wobble_spring", physics_wobble_spring);
        frame.insert("shatter_collision", physics_shatter_collision);
        frame.insert("slide_inertia", physics_slide_inertia);
        frame.insert("depth_gravity", physics_depth_gravity);
        frame.insert("lofi_wobble", physics_lofi_wobble);
        frame.insert("particle_decay", physics_particle_decay);
        frame.insert("abstract_breath", physics_abstract_breath);

        Self { overlay, frame }
    }

    /// Resolve a tag to a motion function.
    ///
    /// `PHYSICS_`-prefixed tags select the frame family; everything else the
    /// overlay family. Unknown tags fall back to the simple fade.
    pub fn resolve(&self, tag: &str) -> Motion {
        let physics = tag.starts_with("PHYSICS_");
        let name = strip_tag(tag);

        if physics {
            if let Some(&f) = self.frame.get(name.as_str()) {
                return Motion::Frame(f);
            }
        } else if let Some(&f) = self.overlay.get(name.as_str()) {
            return Motion::Overlay(f);
        }

        tracing::warn!(tag = tag, "Unknown animation tag, using fade fallback");
        Motion::Overlay(simple_fade)
    }

    /// Return the tags from `tags` that do not resolve to a registered
    /// function. Intended for startup validation of style catalogues.
    pub fn unknown_tags<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        tags.into_iter()
            .filter(|tag| {
                let name = strip_tag(tag);
                if tag.starts_with("PHYSICS_") {
                    !self.frame.contains_key(name.as_str())
                } else {
                    !self.overlay.contains_key(name.as_str())
                }
            })
            .map(|t| t.to_string())
            .collect()
    }
}

impl Default for MotionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Strip the namespacing prefix and normalise case.
fn strip_tag(tag: &str) -> String {
    tag.trim_start_matches("ANIMATION_")
        .trim_start_matches("PHYSICS_")
        .to_lowercase()
}

/// Fade opacity for symmetric in/out windows.
fn fade_window(t: f64, duration: f64, fade_in: f64, fade_out: f64) -> f64 {
    if fade_in > 0.0 && t < fade_in {
        (t / fade_in).clamp(0.0, 1.0)
    } else if fade_out > 0.0 && t > duration - fade_out {
        ((duration - t) / fade_out).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Overlay family
// ---------------------------------------------------------------------------

/// Fixed 0.5 s fade-in/fade-out; also the unknown-tag fallback.
fn simple_fade(t: f64, duration: f64, _intensity: Intensity) -> OverlaySample {
    let fade = 0.5f64.min(duration * 0.3);
    OverlaySample::centered(fade_window(t, duration, fade, fade))
}

/// Damped pop followed by a gentle two-axis wobble.
fn wobble_pop(t: f64, duration: f64, intensity: Intensity) -> OverlaySample {
    let m = intensity.multiplier();
    let pop = if t < 0.3 {
        1.0 - (t / 0.3) * 0.2
    } else {
        0.8 + 0.2 * (t * 2.0).sin()
    };
    OverlaySample {
        dx: (t * 8.0).sin() * 8.0 * pop * m,
        dy: (t * 6.0).cos() * 6.0 * pop * m,
        opacity: fade_window(t, duration, 0.3, 0.3),
    }
}

/// High-frequency jitter scaled by intensity.
fn jitter_shake(t: f64, duration: f64, intensity: Intensity) -> OverlaySample {
    let m = intensity.multiplier();
    OverlaySample {
        dx: (t * 15.0).sin() * 12.0 * m,
        dy: (t * 18.0).cos() * 8.0 * m,
        opacity: fade_window(t, duration, 0.1, 0.1),
    }
}

/// Typewriter wipe: slide in from the left over a fixed window.
fn wipe_type(t: f64, duration: f64, _intensity: Intensity) -> OverlaySample {
    let dx = if t < 0.4 {
        (1.0 - t / 0.4) * -150.0
    } else {
        0.0
    };
    OverlaySample {
        dx,
        dy: 0.0,
        opacity: fade_window(t, duration, 0.1, 0.0),
    }
}

/// Slide in, hold, slide out, with linear ease over fixed windows.
fn slide_snap(t: f64, duration: f64, _intensity: Intensity) -> OverlaySample {
    let window = 0.25;
    let dx = if t < window {
        (1.0 - t / window) * -200.0
    } else if t > duration - window {
        (1.0 - (duration - t) / window) * 200.0
    } else {
        0.0
    };
    OverlaySample {
        dx,
        dy: 0.0,
        opacity: fade_window(t, duration, 0.2, 0.2),
    }
}

/// Multi-frequency glitch offsets.
fn shatter_shift(t: f64, duration: f64, intensity: Intensity) -> OverlaySample {
    let m = intensity.multiplier();
    OverlaySample {
        dx: ((t * 25.0).sin() * 15.0 + (t * 40.0).sin() * 8.0) * m,
        dy: ((t * 20.0).cos() * 10.0 + (t * 35.0).cos() * 5.0) * m,
        opacity: fade_window(t, duration, 0.05, 0.05),
    }
}

/// Slow kinetic drift.
fn depth_fluid(t: f64, duration: f64, _intensity: Intensity) -> OverlaySample {
    let fade = 1.0f64.min(duration * 0.3);
    OverlaySample {
        dx: (t * 0.8).sin() * 40.0,
        dy: (t * 0.6).cos() * 25.0,
        opacity: fade_window(t, duration, fade, fade),
    }
}

/// Intermittent one-pixel flicker, fade-in only.
fn type_flicker(t: f64, duration: f64, _intensity: Intensity) -> OverlaySample {
    let flicker = ((t * 15.0) as i64) % 7 == 0;
    let offset = if flicker { 1.0 } else { 0.0 };
    let fade = if duration > 1.0 { 0.5 } else { duration * 0.5 };
    OverlaySample {
        dx: offset,
        dy: offset,
        opacity: fade_window(t, duration, fade, 0.0),
    }
}

/// Vertical float with long fades.
fn particle_dissolve(t: f64, duration: f64, _intensity: Intensity) -> OverlaySample {
    let fade_in = 1.0f64.min(duration * 0.3);
    let fade_out = 0.5f64.min(duration * 0.2);
    OverlaySample {
        dx: 0.0,
        dy: (t * 1.2).sin() * 15.0,
        opacity: fade_window(t, duration, fade_in, fade_out),
    }
}

/// Pulsing two-axis wobble.
fn pulse_morph(t: f64, duration: f64, intensity: Intensity) -> OverlaySample {
    let m = intensity.multiplier();
    OverlaySample {
        dx: (t * 4.0).sin() * 20.0 * m,
        dy: (t * 3.0).cos() * 15.0 * m,
        opacity: fade_window(t, duration, 0.2, 0.2),
    }
}

// ---------------------------------------------------------------------------
// Frame family: closed-form physics models
// ---------------------------------------------------------------------------

const GRAVITY: f64 = 98.0;

/// Simple harmonic motion: `y(t) = A sin(ωt)`.
fn physics_float_fade(t: f64, _duration: f64, intensity: Intensity) -> FrameTransform {
    FrameTransform {
        dy: 20.0 * intensity.multiplier() * (t * 1.2).sin(),
        ..Default::default()
    }
}

/// Damped oscillator: `A(t) = A₀ e^(−ζωt) sin(ωt)`.
fn physics_jitter_damp(t: f64, _duration: f64, intensity: Intensity) -> FrameTransform {
    let amplitude = 20.0 * intensity.multiplier() * (-t * 5.0).exp();
    FrameTransform {
        dx: amplitude * (t * 30.0).sin(),
        dy: amplitude * (t * 30.0).cos(),
        ..Default::default()
    }
}

/// Underdamped spring pulse expressed as a scale oscillation.
fn physics_type_pulse(t: f64, _duration: f64, intensity: Intensity) -> FrameTransform {
    let damping = (-t * 3.0).exp();
    FrameTransform {
        scale: 1.0 + damping * (t * 20.0).sin() * 0.1 * intensity.multiplier(),
        ..Default::default()
    }
}

/// Superposed springs: `x(t) = Σ Aᵢ sin(ωᵢ t + φᵢ)`.
fn physics_wobble_spring(t: f64, _duration: f64, intensity: Intensity) -> FrameTransform {
    let m = intensity.multiplier();
    FrameTransform {
        dx: 10.0 * m * ((t * 1.5).sin() + 0.5 * (t * 2.2).cos()),
        dy: 8.0 * m * ((t * 1.3).cos() + 0.7 * (t * 1.9).sin()),
        rotation: 2.0 * ((t * 1.7).sin() + (t * 1.4).cos()),
        ..Default::default()
    }
}

/// Two-phase elastic collision: explosion ramp, then decaying rebound.
fn physics_shatter_collision(t: f64, _duration: f64, intensity: Intensity) -> FrameTransform {
    let velocity = if t < 0.2 {
        100.0 * (1.0 - (-t * 15.0).exp())
    } else {
        let snap = t - 0.2;
        -80.0 * (-snap * 8.0).exp() * (snap * 20.0).sin()
    };
    let m = intensity.multiplier();
    FrameTransform {
        dx: velocity * (t * 5.0).sin() * m,
        dy: velocity * (t * 5.0).cos() * m,
        rotation: velocity * 0.05,
        ..Default::default()
    }
}

/// Inertial slide: ease-in, then a decaying overshoot settle.
fn physics_slide_inertia(t: f64, _duration: f64, _intensity: Intensity) -> FrameTransform {
    let dx = if t < 0.3 {
        150.0 * (1.0 - (-t * 10.0).exp())
    } else {
        let settle = t - 0.3;
        120.0 + 30.0 * (-settle * 6.0).exp() * (settle * 15.0).sin()
    };
    FrameTransform {
        dx,
        ..Default::default()
    }
}

/// Free fall `y = ½gt²` until impact, then a damped rebound, with a
/// secondary scale term for depth cueing.
fn physics_depth_gravity(t: f64, _duration: f64, _intensity: Intensity) -> FrameTransform {
    let fall_time = 0.5;
    let distance = if t < fall_time {
        0.5 * GRAVITY * t * t
    } else {
        let impact_velocity = GRAVITY * fall_time;
        let bounce = t - fall_time;
        let d = impact_velocity * bounce - 0.5 * GRAVITY * bounce * bounce;
        d * (-bounce * 3.0).exp()
    };
    let clamped = distance.min(100.0).max(0.0);
    FrameTransform {
        dy: clamped,
        scale: 1.0 - clamped * 0.002,
        ..Default::default()
    }
}

/// Damped periodic vertical roll with a hint of rotation.
fn physics_lofi_wobble(t: f64, _duration: f64, _intensity: Intensity) -> FrameTransform {
    let damping = 0.5 + 0.5 * (-t * 0.5).exp();
    let roll = damping * (TAU * 0.3 * t).sin();
    FrameTransform {
        dy: 3.0 * roll,
        rotation: 0.2 * roll,
        ..Default::default()
    }
}

/// Exponential decay: `opacity = e^(−t/τ)` plus decaying positional drift.
fn physics_particle_decay(t: f64, _duration: f64, _intensity: Intensity) -> FrameTransform {
    let tau = 0.5;
    let opacity = (-t / tau).exp();
    FrameTransform {
        dx: 10.0 * (1.0 - opacity) * (t * 3.0).sin(),
        dy: 10.0 * (1.0 - opacity) * (t * 2.5).cos(),
        opacity,
        ..Default::default()
    }
}

/// Constant-frequency breathing scale oscillation.
fn physics_abstract_breath(t: f64, _duration: f64, intensity: Intensity) -> FrameTransform {
    let rate = 0.2;
    FrameTransform {
        scale: 1.0 + 0.1 * intensity.multiplier() * (TAU * rate * t).sin(),
        rotation: (PI * rate * t).sin(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stripping() {
        let registry = MotionRegistry::builtin();
        assert!(matches!(
            registry.resolve("ANIMATION_WOBBLE_SPRING"),
            Motion::Overlay(_)
        ));
        assert!(matches!(
            registry.resolve("PHYSICS_WOBBLE_SPRING"),
            Motion::Frame(_)
        ));
        assert!(matches!(registry.resolve("wobble_spring"), Motion::Overlay(_)));
    }

    #[test]
    fn test_unknown_tag_falls_back_to_fade() {
        let registry = MotionRegistry::builtin();
        let Motion::Overlay(f) = registry.resolve("ANIMATION_NOT_REGISTERED") else {
            panic!("fallback must be an overlay fade");
        };
        // Mid-scene the fallback is fully opaque and centered
        let sample = f(2.0, 4.0, Intensity::Medium);
        assert_eq!(sample, OverlaySample::centered(1.0));
        // Fades over the first half second
        assert!(f(0.25, 4.0, Intensity::Medium).opacity < 1.0);
    }

    #[test]
    fn test_builtin_style_tags_resolve() {
        let registry = MotionRegistry::builtin();
        let library = lyricvid_models::StyleLibrary::builtin();
        let tags: Vec<&str> = library
            .profiles()
            .iter()
            .map(|p| p.animation_tag.as_str())
            .collect();
        assert!(registry.unknown_tags(tags).is_empty());
    }

    #[test]
    fn test_unknown_tags_reported() {
        let registry = MotionRegistry::builtin();
        let unknown = registry.unknown_tags(["ANIMATION_BOGUS", "ANIMATION_FLOAT_FADE"]);
        assert_eq!(unknown, vec!["ANIMATION_BOGUS".to_string()]);
    }

    #[test]
    fn test_overlay_functions_pure_in_t() {
        let registry = MotionRegistry::builtin();
        for tag in [
            "wobble_pop",
            "jitter_shake",
            "wipe_type",
            "slide_snap",
            "shatter_shift",
            "depth_fluid",
            "type_flicker",
            "particle_dissolve",
            "pulse_morph",
            "fade",
        ] {
            let Motion::Overlay(f) = registry.resolve(tag) else {
                panic!("{} should be overlay", tag)
            };
            // Non-monotonic sampling: same t must yield the same sample
            for &t in &[1.7, 0.1, 3.0, 0.1, 1.7] {
                assert_eq!(f(t, 4.0, Intensity::High), f(t, 4.0, Intensity::High));
            }
        }
    }

    #[test]
    fn test_frame_functions_pure_in_t() {
        let registry = MotionRegistry::builtin();
        for tag in [
            "PHYSICS_FLOAT_FADE",
            "PHYSICS_JITTER_DAMP",
            "PHYSICS_TYPE_PULSE",
            "PHYSICS_WOBBLE_SPRING",
            "PHYSICS_SHATTER_COLLISION",
            "PHYSICS_SLIDE_INERTIA",
            "PHYSICS_DEPTH_GRAVITY",
            "PHYSICS_LOFI_WOBBLE",
            "PHYSICS_PARTICLE_DECAY",
            "PHYSICS_ABSTRACT_BREATH",
        ] {
            let Motion::Frame(f) = registry.resolve(tag) else {
                panic!("{} should be frame family", tag)
            };
            for &t in &[0.0, 2.5, 0.4, 2.5, 0.0] {
                let a = f(t, 4.0, Intensity::Medium);
                let b = f(t, 4.0, Intensity::Medium);
                assert_eq!(a, b, "{} not pure at t={}", tag, t);
            }
        }
    }

    #[test]
    fn test_jitter_damp_decays() {
        let early = physics_jitter_damp(0.05, 4.0, Intensity::Medium);
        let late = physics_jitter_damp(3.0, 4.0, Intensity::Medium);
        let mag = |t: &FrameTransform| (t.dx * t.dx + t.dy * t.dy).sqrt();
        assert!(mag(&early) > mag(&late));
        assert!(mag(&late) < 0.01);
    }

    #[test]
    fn test_particle_decay_opacity() {
        let t0 = physics_particle_decay(0.0, 4.0, Intensity::Medium);
        assert!((t0.opacity - 1.0).abs() < 1e-9);
        let t2 = physics_particle_decay(2.0, 4.0, Intensity::Medium);
        assert!(t2.opacity < 0.05);
    }

    #[test]
    fn test_intensity_scales_amplitude() {
        let low = jitter_shake(0.7, 4.0, Intensity::Low);
        let high = jitter_shake(0.7, 4.0, Intensity::High);
        assert!(high.dx.abs() > low.dx.abs());
    }

    #[test]
    fn test_depth_gravity_bounded() {
        for i in 0..100 {
            let t = i as f64 * 0.05;
            let tr = physics_depth_gravity(t, 5.0, Intensity::Medium);
            assert!(tr.dy >= 0.0 && tr.dy <= 100.0);
            assert!(tr.scale >= 0.8 && tr.scale <= 1.0);
        }
    }
}
