//! Lyric video generation pipeline worker.
//!
//! Turns a time-stamped list of lyric lines plus a chosen visual style into
//! a rendered, encoded, uploaded video with a time-limited access URL.

pub mod cache;
pub mod config;
pub mod error;
pub mod keywords;
pub mod orchestrator;
pub mod pipeline;
pub mod synthesis;
pub mod texture;
pub mod webhook;

pub use cache::SceneContentCache;
pub use config::PipelineConfig;
pub use error::{WorkerError, WorkerResult};
pub use orchestrator::SceneOrchestrator;
pub use pipeline::VideoPipeline;
pub use synthesis::{SceneSynthesizer, SynthesisSource};
pub use texture::TextureClient;
pub use webhook::WebhookNotifier;
