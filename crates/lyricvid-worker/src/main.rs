//! Lyric video worker binary.
//!
//! Reads a job payload (JSON) from the path given as the first argument,
//! runs the pipeline, and prints the result to stdout.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lyricvid_models::VideoJobRequest;
use lyricvid_storage::StorageClient;
use lyricvid_worker::{PipelineConfig, VideoPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("lyricvid=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting lyricvid-worker");

    let payload_path = std::env::args()
        .nth(1)
        .context("usage: lyricvid-worker <job-payload.json>")?;
    let payload = tokio::fs::read_to_string(&payload_path)
        .await
        .with_context(|| format!("failed to read job payload {}", payload_path))?;
    let request: VideoJobRequest =
        serde_json::from_str(&payload).context("invalid job payload")?;

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let storage = match StorageClient::from_env().await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = VideoPipeline::new(config, storage);

    // The hourly sweep runs for the lifetime of the process
    if let Some(lifecycle) = pipeline.lifecycle() {
        std::sync::Arc::clone(lifecycle).spawn_sweeper();
    }

    match pipeline.execute(request).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            info!(video_url = %result.video_url, "Completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Video generation failed: {}", e);
            std::process::exit(1);
        }
    }
}
