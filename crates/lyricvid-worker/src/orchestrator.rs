//! Parallel scene orchestration.
//!
//! Fans scene synthesis out across a bounded worker pool when the lyric
//! count exceeds a threshold, then restores original lyric order. Every
//! task runs the full retry/uniqueness loop against the job's shared
//! ledger; the ledger serialises its check-and-append internally, so two
//! workers cannot both accept a mutually-similar pair.
//!
//! A failed task is logged and its scene dropped; the job proceeds with
//! fewer scenes.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use lyricvid_models::{LyricLine, Resolution, Scene, StyleProfile};
use lyricvid_render::fingerprint::UniquenessLedger;

use crate::config::PipelineConfig;
use crate::error::WorkerResult;
use crate::synthesis::SceneSynthesizer;

/// Orchestrates sequential and parallel scene generation.
pub struct SceneOrchestrator {
    synthesizer: Arc<SceneSynthesizer>,
    config: Arc<PipelineConfig>,
}

impl SceneOrchestrator {
    pub fn new(synthesizer: Arc<SceneSynthesizer>, config: Arc<PipelineConfig>) -> Self {
        Self {
            synthesizer,
            config,
        }
    }

    /// Generate scenes for all lyric lines, sorted by scene id.
    ///
    /// Chooses the parallel path when the lyric count exceeds the configured
    /// threshold, sequential otherwise.
    pub async fn generate_scenes(
        &self,
        lyrics: &[LyricLine],
        style: &StyleProfile,
        bpm: u32,
        resolution: Resolution,
        work_dir: &Path,
    ) -> WorkerResult<Vec<Scene>> {
        let ledger = UniquenessLedger::with_threshold(self.config.similarity_threshold);

        let mut scenes = if lyrics.len() > self.config.parallel_threshold {
            info!(
                lyrics = lyrics.len(),
                workers = self.config.max_workers,
                "Generating scenes in parallel"
            );
            self.generate_parallel(lyrics, style, bpm, &ledger, resolution, work_dir)
                .await
        } else {
            info!(lyrics = lyrics.len(), "Generating scenes sequentially");
            self.generate_sequential(lyrics, style, bpm, &ledger, resolution, work_dir)
                .await
        };

        // Completion order is arbitrary under the parallel path; restore
        // lyric order before returning.
        scenes.sort_by_key(|s| s.id);
        Ok(scenes)
    }

    async fn generate_sequential(
        &self,
        lyrics: &[LyricLine],
        style: &StyleProfile,
        bpm: u32,
        ledger: &UniquenessLedger,
        resolution: Resolution,
        work_dir: &Path,
    ) -> Vec<Scene> {
        let mut scenes = Vec::with_capacity(lyrics.len());
        for (index, lyric) in lyrics.iter().enumerate() {
            match self
                .synthesizer
                .generate_scene(index, lyric, style, bpm, ledger, resolution, work_dir)
                .await
            {
                Ok(scene) => scenes.push(scene),
                Err(e) => {
                    error!(
                        scene_id = index + 1,
                        error = %e,
                        "Scene generation failed, dropping scene"
                    );
                }
            }
        }
        scenes
    }

    async fn generate_parallel(
        &self,
        lyrics: &[LyricLine],
        style: &StyleProfile,
        bpm: u32,
        ledger: &UniquenessLedger,
        resolution: Resolution,
        work_dir: &Path,
    ) -> Vec<Scene> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));

        let futures: Vec<_> = lyrics
            .iter()
            .enumerate()
            .map(|(index, lyric)| {
                let semaphore = Arc::clone(&semaphore);
                let synthesizer = &self.synthesizer;
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .expect("semaphore never closed");
                    synthesizer
                        .generate_scene(index, lyric, style, bpm, ledger, resolution, work_dir)
                        .await
                        .map_err(|e| (index, e))
                }
            })
            .collect();

        let mut scenes = Vec::with_capacity(lyrics.len());
        for result in join_all(futures).await {
            match result {
                Ok(scene) => scenes.push(scene),
                Err((index, e)) => {
                    error!(
                        scene_id = index + 1,
                        error = %e,
                        "Parallel scene task failed, dropping scene"
                    );
                }
            }
        }
        scenes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SceneContentCache;
    use lyricvid_models::StyleLibrary;

    const RES: Resolution = Resolution::new(256, 144);

    fn orchestrator() -> SceneOrchestrator {
        let config = Arc::new(PipelineConfig::default());
        let cache = Arc::new(SceneContentCache::new(50));
        let synthesizer = Arc::new(SceneSynthesizer::new(cache, None, Arc::clone(&config)));
        SceneOrchestrator::new(synthesizer, config)
    }

    fn lyrics(n: usize) -> Vec<LyricLine> {
        (0..n)
            .map(|i| LyricLine::new(format!("unique lyric line number {}", i), i as f64 * 2.0))
            .collect()
    }

    #[tokio::test]
    async fn test_sequential_path_preserves_order() {
        let orch = orchestrator();
        let lib = StyleLibrary::builtin();
        let dir = tempfile::tempdir().unwrap();

        // 3 lyrics with threshold 3: sequential path
        let scenes = orch
            .generate_scenes(&lyrics(3), lib.default_profile(), 120, RES, dir.path())
            .await
            .unwrap();

        let ids: Vec<u32> = scenes.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_parallel_path_restores_order() {
        let orch = orchestrator();
        let lib = StyleLibrary::builtin();
        let dir = tempfile::tempdir().unwrap();

        // 10 lyrics with threshold 3: parallel path
        let scenes = orch
            .generate_scenes(&lyrics(10), lib.default_profile(), 120, RES, dir.path())
            .await
            .unwrap();

        assert!(scenes.len() <= 10);
        let ids: Vec<u32> = scenes.iter().map(|s| s.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted, "scene ids must be strictly increasing");
        // With no injected failures, every lyric yields a scene
        assert_eq!(scenes.len(), 10);
        assert_eq!(ids, (1..=10).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_scene_ids_match_lyric_positions() {
        let orch = orchestrator();
        let lib = StyleLibrary::builtin();
        let dir = tempfile::tempdir().unwrap();

        let input = lyrics(6);
        let scenes = orch
            .generate_scenes(&input, lib.default_profile(), 120, RES, dir.path())
            .await
            .unwrap();

        for scene in &scenes {
            let lyric = &input[(scene.id - 1) as usize];
            assert_eq!(scene.lyric_text, lyric.text);
            assert_eq!(scene.start_time, lyric.time);
        }
    }
}
