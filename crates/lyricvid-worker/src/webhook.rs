//! Best-effort webhook notification.
//!
//! Progress and completion callbacks are fire-and-report: failures are
//! logged and never affect the job.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use lyricvid_models::{JobId, VideoJobResult};

const PROGRESS_TIMEOUT: Duration = Duration::from_secs(5);
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook notifier shared across a job.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Send a progress update. No-op without a webhook URL.
    pub async fn progress(&self, url: Option<&str>, job_id: &JobId, progress: u8, message: &str) {
        let Some(url) = url else { return };

        let payload = json!({
            "job_id": job_id.as_str(),
            "status": "processing",
            "progress": progress,
            "message": message,
        });

        match self
            .client
            .post(url)
            .timeout(PROGRESS_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => {
                debug!(progress = progress, status = %response.status(), "Progress update sent");
            }
            Err(e) => {
                warn!(error = %e, "Failed to send progress update");
            }
        }
    }

    /// Send the completion payload. No-op without a webhook URL.
    pub async fn completed(&self, url: Option<&str>, job_id: &JobId, result: &VideoJobResult) {
        let Some(url) = url else { return };

        let payload = json!({
            "job_id": job_id.as_str(),
            "status": "completed",
            "video_url": result.video_url,
            "public_id": result.public_id,
            "duration": result.duration,
            "format": result.format,
            "scenes": result.scenes,
            "style": result.style,
            "expires_at": result.expires_at,
        });

        if let Err(e) = self
            .client
            .post(url)
            .timeout(COMPLETION_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            warn!(error = %e, "Failed to send completion webhook");
        }
    }

    /// Send a failure notification. No-op without a webhook URL.
    pub async fn failed(&self, url: Option<&str>, job_id: &JobId, error: &str) {
        let Some(url) = url else { return };

        let payload = json!({
            "job_id": job_id.as_str(),
            "status": "failed",
            "error": error,
            "message": "Video generation failed",
        });

        if let Err(e) = self
            .client
            .post(url)
            .timeout(COMPLETION_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            warn!(error = %e, "Failed to send failure webhook");
        }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}
