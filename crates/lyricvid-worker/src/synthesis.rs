//! Scene synthesis engine.
//!
//! Produces one background per lyric line through an ordered source chain:
//! content cache, AI texture service (when configured), then the seeded
//! procedural generator. Each source's failure mode is explicit and falls
//! through to the next; the procedural generator always succeeds.
//!
//! `generate_scene` wraps synthesis in a bounded retry loop against the
//! job's shared uniqueness ledger, accepting the first background that is
//! either unique or produced by the final attempt.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use lyricvid_models::{LyricLine, RenderingDirectives, Resolution, Scene, StyleProfile};
use lyricvid_render::fingerprint::{fingerprint, UniquenessLedger};
use lyricvid_render::procedural;

use crate::cache::{cache_key, SceneContentCache};
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::keywords::build_texture_prompt;
use crate::texture::TextureClient;

/// Which source produced a background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisSource {
    Cache,
    AiService,
    Procedural,
}

/// Scene synthesis engine shared by the sequential and parallel paths.
pub struct SceneSynthesizer {
    cache: Arc<SceneContentCache>,
    texture: Option<TextureClient>,
    config: Arc<PipelineConfig>,
    cache_hits: AtomicU32,
}

impl SceneSynthesizer {
    pub fn new(
        cache: Arc<SceneContentCache>,
        texture: Option<TextureClient>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            cache,
            texture,
            config,
            cache_hits: AtomicU32::new(0),
        }
    }

    /// Cache hits recorded since construction.
    pub fn cache_hits(&self) -> u32 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Produce a background for a lyric line. Never fails: the procedural
    /// generator is the guaranteed terminal fallback.
    ///
    /// `attempt` 0 consults the cache; retries bypass it and salt the
    /// procedural seed so a regenerated background can actually differ.
    pub async fn synthesize(
        &self,
        lyric: &LyricLine,
        style: &StyleProfile,
        resolution: Resolution,
        attempt: u32,
    ) -> (Arc<RgbaImage>, SynthesisSource) {
        let key = cache_key(&lyric.text, &style.key, lyric.mood_or_default());

        if attempt == 0 {
            if let Some(cached) = self.cache.get(&key).await {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(lyric = %lyric.text, "Background cache hit");
                return (cached, SynthesisSource::Cache);
            }
        }

        if let Some(texture) = &self.texture {
            let prompt = build_texture_prompt(&lyric.text, lyric.mood_or_default(), style);
            match texture.generate(&prompt, resolution).await {
                Ok(image) => {
                    let image = Arc::new(image);
                    self.cache.put(key, Arc::clone(&image)).await;
                    return (image, SynthesisSource::AiService);
                }
                Err(e) => {
                    warn!(error = %e, "AI texture generation failed, falling back to procedural");
                }
            }
        }

        let image = Arc::new(self.procedural_background(lyric, style, resolution, attempt).await);
        self.cache.put(key, Arc::clone(&image)).await;
        (image, SynthesisSource::Procedural)
    }

    /// Run the procedural generator on a blocking thread.
    async fn procedural_background(
        &self,
        lyric: &LyricLine,
        style: &StyleProfile,
        resolution: Resolution,
        attempt: u32,
    ) -> RgbaImage {
        let text = if attempt == 0 {
            lyric.text.clone()
        } else {
            // Salt the seed so retries can escape a near-duplicate
            format!("{}#{}", lyric.text, attempt)
        };
        let style = style.clone();

        tokio::task::spawn_blocking(move || {
            procedural::generate_background(&text, &style, resolution)
        })
        .await
        .unwrap_or_else(|e| {
            // A panicked generator task still must not sink the scene
            warn!(error = %e, "Procedural generator task failed, using gradient");
            let palette = lyricvid_models::ColorPalette::for_tag("COLOR_PASTEL_PEACH");
            procedural::gradient_fallback(&palette, resolution)
        })
    }

    /// Generate a complete scene with uniqueness retries.
    pub async fn generate_scene(
        &self,
        index: usize,
        lyric: &LyricLine,
        style: &StyleProfile,
        bpm: u32,
        ledger: &UniquenessLedger,
        resolution: Resolution,
        work_dir: &Path,
    ) -> WorkerResult<Scene> {
        let scene_id = (index + 1) as u32;
        let max_attempts = self.config.max_attempts.max(1);

        let mut accepted: Option<Arc<RgbaImage>> = None;
        for attempt in 0..max_attempts {
            let (image, source) = self.synthesize(lyric, style, resolution, attempt).await;
            let fp = fingerprint(&image);

            let last_attempt = attempt + 1 == max_attempts;
            let outcome = ledger.try_accept(fp, last_attempt).await;
            if outcome.is_accepted() {
                debug!(
                    scene_id = scene_id,
                    attempt = attempt + 1,
                    source = ?source,
                    "Accepted background"
                );
                accepted = Some(image);
                break;
            }

            info!(
                scene_id = scene_id,
                attempt = attempt + 1,
                "Background too similar to a prior scene, regenerating"
            );
        }

        let image = accepted.ok_or_else(|| {
            // Unreachable: the final attempt force-accepts
            WorkerError::scene_task(format!("scene {} produced no background", scene_id))
        })?;

        let background_path = work_dir.join(format!("scene_{}_bg.png", scene_id));
        image
            .save(&background_path)
            .map_err(|e| WorkerError::scene_task(format!("failed to store background: {}", e)))?;

        Ok(Scene {
            id: scene_id,
            lyric_text: lyric.text.clone(),
            background: background_path,
            start_time: lyric.time,
            duration: lyric.effective_duration(bpm),
            style_name: style.name.clone(),
            rendering_directives: RenderingDirectives::from_style(style),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricvid_models::StyleLibrary;

    fn synthesizer() -> SceneSynthesizer {
        SceneSynthesizer::new(
            Arc::new(SceneContentCache::new(10)),
            None,
            Arc::new(PipelineConfig::default()),
        )
    }

    const RES: Resolution = Resolution::new(320, 180);

    #[tokio::test]
    async fn test_synthesize_falls_back_to_procedural() {
        let synth = synthesizer();
        let lib = StyleLibrary::builtin();
        let lyric = LyricLine::new("walking through the night", 0.0);
        let (image, source) = synth.synthesize(&lyric, lib.default_profile(), RES, 0).await;
        assert_eq!(source, SynthesisSource::Procedural);
        assert_eq!(image.dimensions(), (320, 180));
    }

    #[tokio::test]
    async fn test_synthesize_second_call_hits_cache() {
        let synth = synthesizer();
        let lib = StyleLibrary::builtin();
        let lyric = LyricLine::new("walking through the night", 0.0);
        let style = lib.default_profile();

        let _ = synth.synthesize(&lyric, style, RES, 0).await;
        let (_, source) = synth.synthesize(&lyric, style, RES, 0).await;
        assert_eq!(source, SynthesisSource::Cache);
        assert_eq!(synth.cache_hits(), 1);
    }

    #[tokio::test]
    async fn test_retry_bypasses_cache() {
        let synth = synthesizer();
        let lib = StyleLibrary::builtin();
        let lyric = LyricLine::new("walking through the night", 0.0);
        let style = lib.default_profile();

        let _ = synth.synthesize(&lyric, style, RES, 0).await;
        let (_, source) = synth.synthesize(&lyric, style, RES, 1).await;
        assert_eq!(source, SynthesisSource::Procedural);
    }

    #[tokio::test]
    async fn test_generate_scene_fields() {
        let synth = synthesizer();
        let lib = StyleLibrary::builtin();
        let ledger = UniquenessLedger::new();
        let dir = tempfile::tempdir().unwrap();

        let lyric = LyricLine::new("hello world", 12.5);
        let scene = synth
            .generate_scene(0, &lyric, lib.default_profile(), 120, &ledger, RES, dir.path())
            .await
            .unwrap();

        assert_eq!(scene.id, 1);
        assert_eq!(scene.lyric_text, "hello world");
        assert_eq!(scene.start_time, 12.5);
        // max(1.0, max(1, 2/4) * 60/120) = 1.0
        assert_eq!(scene.duration, 1.0);
        assert!(scene.background.exists());
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_lyrics_force_accept_after_retries() {
        let synth = synthesizer();
        let lib = StyleLibrary::builtin();
        let ledger = UniquenessLedger::new();
        let dir = tempfile::tempdir().unwrap();
        let style = lib.default_profile();

        let lyric = LyricLine::new("same line every time", 0.0);
        let first = synth
            .generate_scene(0, &lyric, style, 120, &ledger, RES, dir.path())
            .await
            .unwrap();
        // The identical lyric hits the cache with an identical background;
        // retries salt the seed, and if every attempt stays too similar the
        // final one is kept rather than failing the job.
        let second = synth
            .generate_scene(1, &lyric, style, 120, &ledger, RES, dir.path())
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(ledger.len().await, 2);
    }
}
