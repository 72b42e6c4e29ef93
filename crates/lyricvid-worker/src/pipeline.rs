//! End-to-end video generation pipeline.
//!
//! validate -> select style -> generate scenes (sequential or parallel) ->
//! render + encode clips -> concatenate with the quality profile ->
//! upload with lifecycle management -> signed URL + result.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use tracing::{info, warn};
use validator::Validate;

use lyricvid_models::{
    ColorPalette, EncodingProfile, JobId, JobMetrics, Resolution, Scene, StyleLibrary,
    VideoJobRequest, VideoJobResult,
};
use lyricvid_render::{
    compose, effects, encode, overlay, procedural, MotionRegistry, RenderResult,
};
use lyricvid_storage::{LifecycleManager, StorageClient, StorageUsage};

use crate::cache::SceneContentCache;
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::orchestrator::SceneOrchestrator;
use crate::synthesis::SceneSynthesizer;
use crate::texture::TextureClient;
use crate::webhook::WebhookNotifier;

/// The video generation pipeline.
///
/// Owns its registries and caches explicitly so tests can construct
/// isolated instances.
pub struct VideoPipeline {
    config: Arc<PipelineConfig>,
    styles: StyleLibrary,
    motion: MotionRegistry,
    orchestrator: SceneOrchestrator,
    synthesizer: Arc<SceneSynthesizer>,
    storage: Option<StorageClient>,
    lifecycle: Option<Arc<LifecycleManager>>,
    webhook: WebhookNotifier,
}

impl VideoPipeline {
    /// Build a pipeline. `storage` is optional; without it, results carry a
    /// local-file reference instead of an uploaded URL.
    pub fn new(config: PipelineConfig, storage: Option<StorageClient>) -> Self {
        let config = Arc::new(config);
        let cache = Arc::new(SceneContentCache::new(config.cache_capacity));
        let texture = TextureClient::from_env(config.ai_timeout);
        let synthesizer = Arc::new(SceneSynthesizer::new(cache, texture, Arc::clone(&config)));
        let orchestrator =
            SceneOrchestrator::new(Arc::clone(&synthesizer), Arc::clone(&config));

        let styles = StyleLibrary::builtin();
        let motion = MotionRegistry::builtin();
        let unknown =
            motion.unknown_tags(styles.profiles().iter().map(|p| p.animation_tag.as_str()));
        if !unknown.is_empty() {
            warn!(tags = ?unknown, "Style catalogue references unregistered animation tags");
        }

        let lifecycle = storage.clone().map(LifecycleManager::new);

        Self {
            config,
            styles,
            motion,
            orchestrator,
            synthesizer,
            storage,
            lifecycle,
            webhook: WebhookNotifier::new(),
        }
    }

    /// Lifecycle manager handle, for spawning the process-wide sweeper.
    pub fn lifecycle(&self) -> Option<&Arc<LifecycleManager>> {
        self.lifecycle.as_ref()
    }

    /// Run a job and send the completion or failure webhook.
    pub async fn execute(&self, request: VideoJobRequest) -> WorkerResult<VideoJobResult> {
        let job_id = request.effective_job_id();
        let webhook_url = request.webhook_url.clone();

        match self.run(&request, &job_id).await {
            Ok(result) => {
                self.webhook
                    .completed(webhook_url.as_deref(), &job_id, &result)
                    .await;
                Ok(result)
            }
            Err(e) => {
                counter!("lyricvid_jobs_failed_total").increment(1);
                self.webhook
                    .failed(webhook_url.as_deref(), &job_id, &e.to_string())
                    .await;
                Err(e)
            }
        }
    }

    async fn run(&self, request: &VideoJobRequest, job_id: &JobId) -> WorkerResult<VideoJobResult> {
        let started = Instant::now();

        request
            .validate()
            .map_err(|e| WorkerError::input_validation(e.to_string()))?;

        counter!("lyricvid_jobs_started_total").increment(1);
        info!(
            job_id = %job_id,
            song = %request.song_title,
            lyrics = request.lyrics.len(),
            "Starting video generation"
        );

        let webhook_url = request.webhook_url.as_deref();
        self.webhook
            .progress(webhook_url, job_id, 5, "Initializing style profile...")
            .await;

        let style = self.styles.select(request.style.as_deref());
        let resolution = self.resolution_for(request);
        info!(style = %style.name, resolution = %resolution, "Style selected");

        self.webhook
            .progress(
                webhook_url,
                job_id,
                15,
                &format!("Style selected: {}", style.name),
            )
            .await;

        std::fs::create_dir_all(&self.config.work_dir)?;
        let work = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job_id))
            .tempdir_in(&self.config.work_dir)?;

        let bpm = request.effective_bpm();
        let scenes = self
            .orchestrator
            .generate_scenes(&request.lyrics, style, bpm, resolution, work.path())
            .await?;
        if scenes.is_empty() {
            return Err(WorkerError::scene_task("no scenes survived generation"));
        }
        counter!("lyricvid_scenes_generated_total").increment(scenes.len() as u64);

        self.webhook
            .progress(
                webhook_url,
                job_id,
                40,
                &format!("Created {} scenes", scenes.len()),
            )
            .await;

        let output = self
            .render_and_encode(&scenes, resolution, work.path())
            .await?;

        self.webhook
            .progress(webhook_url, job_id, 70, "Video rendered, uploading...")
            .await;

        let total_duration: f64 = scenes.iter().map(|s| s.duration).sum();
        let upload = self.upload_with_lifecycle(&output, job_id).await;

        self.webhook
            .progress(webhook_url, job_id, 100, "Video generation completed")
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        histogram!("lyricvid_job_seconds").record(elapsed);

        Ok(VideoJobResult {
            success: true,
            video_url: upload.video_url,
            public_id: upload.public_id,
            duration: total_duration,
            format: "mp4".to_string(),
            scenes: scenes.len() as u32,
            style: style.name.clone(),
            expires_at: upload.expires_at,
            metrics: JobMetrics {
                total_seconds: elapsed,
                scenes_generated: scenes.len() as u32,
                cache_hits: self.synthesizer.cache_hits(),
                parallel: request.lyrics.len() > self.config.parallel_threshold,
                pending_deletions: upload.usage.pending_deletions,
            },
        })
    }

    /// Render every scene to a clip, then concatenate with the quality
    /// profile. Large scene counts are encoded in fixed-size batches first.
    async fn render_and_encode(
        &self,
        scenes: &[Scene],
        resolution: Resolution,
        work_dir: &Path,
    ) -> WorkerResult<PathBuf> {
        let mut clips = Vec::with_capacity(scenes.len());
        for scene in scenes {
            let clip = self.render_scene_clip(scene, resolution, work_dir).await?;
            clips.push(clip);
        }

        let profile = EncodingProfile::for_quality(self.config.quality, self.config.preview);
        let output = work_dir.join("output.mp4");

        if scenes.len() > self.config.batch_threshold {
            info!(
                scenes = scenes.len(),
                batch_size = self.config.batch_size,
                "Encoding in batches to bound memory"
            );
            let segments =
                encode::encode_in_batches(&clips, &output, self.config.batch_size, &profile)
                    .await
                    .map_err(|e| WorkerError::encoding(e.to_string()))?;
            encode::concat_clips(&segments, &output, &profile)
                .await
                .map_err(|e| WorkerError::encoding(e.to_string()))?;
        } else {
            encode::concat_clips(&clips, &output, &profile)
                .await
                .map_err(|e| WorkerError::encoding(e.to_string()))?;
        }

        Ok(output)
    }

    /// Render one scene into a time-bounded clip.
    ///
    /// Background and overlay failures degrade (gradient fallback,
    /// background-only clip); encode failures are terminal.
    async fn render_scene_clip(
        &self,
        scene: &Scene,
        resolution: Resolution,
        work_dir: &Path,
    ) -> WorkerResult<PathBuf> {
        let directives = &scene.rendering_directives;

        let background = match image::open(&scene.background) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!(
                    scene_id = scene.id,
                    error = %e,
                    "Background missing, using palette gradient"
                );
                let palette = ColorPalette::for_tag(&directives.color_tag);
                procedural::gradient_fallback(&palette, resolution)
            }
        };

        let text_overlay = match overlay::rasterize_overlay(
            &scene.lyric_text,
            directives,
            resolution,
            work_dir,
            scene.id,
        )
        .await
        {
            Ok(raster) => raster,
            Err(e) => {
                warn!(
                    scene_id = scene.id,
                    error = %e,
                    "Overlay rasterisation failed, rendering background-only clip"
                );
                image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 0]))
            }
        };

        let motion = self.motion.resolve(&directives.animation_tag);
        let effect_tag = directives.effect_tag.clone();
        let intensity = directives.intensity;
        let duration = scene.duration;
        let fps = self.config.fps;
        let seed = procedural::seed_from_text(&scene.lyric_text);
        let frames_dir = work_dir.join(format!("scene_{}_frames", scene.id));
        let frames_dir_task = frames_dir.clone();

        tokio::task::spawn_blocking(move || -> RenderResult<usize> {
            let background = compose::fit_background(&background, resolution);
            let background = effects::apply_effect(&effect_tag, background, seed);
            compose::render_scene_frames(
                &background,
                &text_overlay,
                &motion,
                duration,
                intensity,
                fps,
                &frames_dir_task,
            )
        })
        .await
        .map_err(|e| WorkerError::scene_task(format!("render task panicked: {}", e)))??;

        let clip = work_dir.join(format!("scene_{}.mp4", scene.id));
        encode::encode_frames_to_clip(&frames_dir, fps, &clip)
            .await
            .map_err(|e| WorkerError::encoding(e.to_string()))?;

        // Frames are bulky; drop them as soon as the clip exists
        tokio::fs::remove_dir_all(&frames_dir).await.ok();

        Ok(clip)
    }

    /// Resolution from the explicit setting, else the quality table.
    fn resolution_for(&self, request: &VideoJobRequest) -> Resolution {
        if self.config.preview {
            return Resolution::PREVIEW;
        }
        match request.settings.resolution.as_deref() {
            Some("480p") => Resolution::new(854, 480),
            Some("720p") => Resolution::new(1280, 720),
            Some("1080p") => Resolution::new(1920, 1080),
            Some(other) => {
                if !other.is_empty() {
                    warn!(resolution = other, "Unknown resolution label, using quality table");
                }
                Resolution::for_quality(self.config.quality, false)
            }
            None => Resolution::for_quality(self.config.quality, false),
        }
    }

    /// Upload with expiry metadata and schedule deletion. Upload failures
    /// fall back to a local-file reference rather than failing the job.
    async fn upload_with_lifecycle(&self, output: &Path, job_id: &JobId) -> UploadOutcome {
        let (Some(storage), Some(lifecycle)) = (&self.storage, &self.lifecycle) else {
            warn!("Storage not configured, returning local file reference");
            return self.local_fallback(output, job_id).await;
        };

        let expires_at = lifecycle.expires_at();
        match storage
            .upload_video(output, job_id.as_str(), expires_at)
            .await
        {
            Ok(receipt) => {
                Arc::clone(lifecycle)
                    .schedule_deletion(receipt.public_id.clone())
                    .await;
                let video_url = match lifecycle.signed_url(&receipt.public_id).await {
                    Ok(url) => url,
                    Err(e) => {
                        warn!(error = %e, "Presign failed, returning direct URL");
                        receipt.secure_url.clone()
                    }
                };
                UploadOutcome {
                    video_url,
                    public_id: receipt.public_id,
                    expires_at,
                    usage: lifecycle.usage().await,
                }
            }
            Err(e) => {
                warn!(error = %e, "Upload failed, returning local file reference");
                self.local_fallback(output, job_id).await
            }
        }
    }

    /// Persist the output outside the job's temp dir and reference it.
    async fn local_fallback(&self, output: &Path, job_id: &JobId) -> UploadOutcome {
        let stable = PathBuf::from(&self.config.work_dir).join(format!("{}.mp4", job_id));
        let path = match tokio::fs::copy(output, &stable).await {
            Ok(_) => stable,
            Err(e) => {
                warn!(error = %e, "Failed to persist local output");
                output.to_path_buf()
            }
        };
        UploadOutcome {
            video_url: format!("file://{}", path.display()),
            public_id: format!("local-{}", job_id),
            expires_at: Utc::now() + chrono::Duration::hours(24),
            usage: StorageUsage::default(),
        }
    }
}

struct UploadOutcome {
    video_url: String,
    public_id: String,
    expires_at: DateTime<Utc>,
    usage: StorageUsage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricvid_models::{LyricLine, Quality, VideoSettings};

    fn pipeline() -> VideoPipeline {
        let mut config = PipelineConfig::default();
        config.work_dir = std::env::temp_dir()
            .join("lyricvid-test")
            .to_string_lossy()
            .to_string();
        VideoPipeline::new(config, None)
    }

    fn request(lyrics: Vec<LyricLine>) -> VideoJobRequest {
        VideoJobRequest {
            song_title: "Test".to_string(),
            artist: None,
            lyrics,
            style: Some("minimalist".to_string()),
            bpm: None,
            settings: VideoSettings::default(),
            webhook_url: None,
            job_id: Some("test-job".to_string()),
        }
    }

    #[tokio::test]
    async fn test_missing_lyrics_fails_validation() {
        let pipe = pipeline();
        let err = pipe.execute(request(vec![])).await.unwrap_err();
        assert!(matches!(err, WorkerError::InputValidation(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_missing_title_fails_validation() {
        let pipe = pipeline();
        let mut req = request(vec![LyricLine::new("hello", 0.0)]);
        req.song_title = String::new();
        let err = pipe.execute(req).await.unwrap_err();
        assert!(matches!(err, WorkerError::InputValidation(_)));
    }

    #[test]
    fn test_resolution_label_mapping() {
        let pipe = pipeline();
        let mut req = request(vec![LyricLine::new("hello", 0.0)]);

        req.settings.resolution = Some("480p".to_string());
        assert_eq!(pipe.resolution_for(&req), Resolution::new(854, 480));

        req.settings.resolution = Some("1080p".to_string());
        assert_eq!(pipe.resolution_for(&req), Resolution::new(1920, 1080));

        req.settings.resolution = Some("4320p".to_string());
        assert_eq!(
            pipe.resolution_for(&req),
            Resolution::for_quality(Quality::Balanced, false)
        );

        req.settings.resolution = None;
        assert_eq!(
            pipe.resolution_for(&req),
            Resolution::for_quality(Quality::Balanced, false)
        );
    }

    #[test]
    fn test_preview_overrides_resolution_label() {
        let mut config = PipelineConfig::default();
        config.preview = true;
        let pipe = VideoPipeline::new(config, None);
        let mut req = request(vec![LyricLine::new("hello", 0.0)]);
        req.settings.resolution = Some("1080p".to_string());
        assert_eq!(pipe.resolution_for(&req), Resolution::PREVIEW);
    }
}
