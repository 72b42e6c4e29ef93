//! Pipeline configuration.

use std::time::Duration;

use lyricvid_models::Quality;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Encoding quality mode
    pub quality: Quality,
    /// Preview mode: smallest resolution and fastest encoder profile
    pub preview: bool,
    /// Lyric count above which the parallel generation path is used
    pub parallel_threshold: usize,
    /// Bounded worker pool size for parallel scene generation
    pub max_workers: usize,
    /// Background generation attempts per scene before accepting a duplicate
    pub max_attempts: u32,
    /// Similarity above which a background counts as a duplicate
    pub similarity_threshold: f64,
    /// Frame rate for rendered scenes
    pub fps: u32,
    /// Scene content cache capacity (entries)
    pub cache_capacity: usize,
    /// Clips per batch when batched encoding is used
    pub batch_size: usize,
    /// Scene count above which clips are encoded in batches
    pub batch_threshold: usize,
    /// Timeout for a single AI texture request
    pub ai_timeout: Duration,
    /// Work directory for per-job scratch files
    pub work_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quality: Quality::Balanced,
            preview: false,
            parallel_threshold: 3,
            max_workers: 4,
            max_attempts: 3,
            similarity_threshold: 0.85,
            fps: 24,
            cache_capacity: 100,
            batch_size: 5,
            batch_threshold: 40,
            ai_timeout: Duration::from_secs(20),
            work_dir: "/tmp/lyricvid".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            quality: std::env::var("LYRICVID_QUALITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.quality),
            preview: std::env::var("LYRICVID_PREVIEW")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.preview),
            parallel_threshold: env_parse("LYRICVID_PARALLEL_THRESHOLD", defaults.parallel_threshold),
            max_workers: env_parse("LYRICVID_MAX_WORKERS", defaults.max_workers),
            max_attempts: env_parse("LYRICVID_MAX_ATTEMPTS", defaults.max_attempts),
            similarity_threshold: env_parse(
                "LYRICVID_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            ),
            fps: env_parse("LYRICVID_FPS", defaults.fps),
            cache_capacity: env_parse("LYRICVID_CACHE_CAPACITY", defaults.cache_capacity),
            batch_size: env_parse("LYRICVID_BATCH_SIZE", defaults.batch_size),
            batch_threshold: env_parse("LYRICVID_BATCH_THRESHOLD", defaults.batch_threshold),
            ai_timeout: Duration::from_secs(env_parse("LYRICVID_AI_TIMEOUT_SECS", 20u64)),
            work_dir: std::env::var("LYRICVID_WORK_DIR").unwrap_or(defaults.work_dir),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.parallel_threshold, 3);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.max_attempts, 3);
        assert!((config.similarity_threshold - 0.85).abs() < 1e-9);
        assert_eq!(config.quality, Quality::Balanced);
    }
}
