//! Background synthesis, motion engine and FFmpeg encode pipeline.
//!
//! This crate owns the visual half of the pipeline:
//! - Procedural background generators and post-effects
//! - Perceptual fingerprints for near-duplicate rejection
//! - The animation/physics motion engine
//! - Text overlay rasterisation and per-frame composition
//! - FFmpeg-backed clip encoding, concatenation and batching

pub mod compose;
pub mod effects;
pub mod encode;
pub mod error;
pub mod fingerprint;
pub mod motion;
pub mod overlay;
pub mod procedural;

pub use compose::{compose_frame, fit_background, render_scene_frames};
pub use encode::{check_ffmpeg, concat_clips, encode_frames_to_clip, encode_in_batches};
pub use error::{RenderError, RenderResult};
pub use fingerprint::{fingerprint, similarity, AcceptOutcome, UniquenessLedger};
pub use motion::{FrameTransform, Motion, MotionRegistry, OverlaySample};
pub use procedural::{generate_background, gradient_fallback, seed_from_text};
