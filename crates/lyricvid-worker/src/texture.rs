//! AI texture generation client.
//!
//! Talks to an HTTP text-to-image inference endpoint. Construction is gated
//! on credentials being present; a missing token simply disables the AI
//! step of the background source chain. Requests carry their own short
//! timeout so one slow call cannot stall the worker pool.

use std::time::Duration;

use image::RgbaImage;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use lyricvid_models::Resolution;

use crate::error::{WorkerError, WorkerResult};

/// Default inference endpoint (FLUX.1-dev text-to-image).
const DEFAULT_API_URL: &str =
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-dev";

/// Texture generation request body.
#[derive(Debug, Serialize)]
struct TextureRequest<'a> {
    inputs: &'a str,
    parameters: TextureParameters,
}

#[derive(Debug, Serialize)]
struct TextureParameters {
    width: u32,
    height: u32,
}

/// HTTP client for the AI texture service.
pub struct TextureClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl TextureClient {
    /// Create a client from environment variables.
    ///
    /// Returns `None` when `TEXTURE_API_TOKEN` is not set; the synthesis
    /// chain then skips straight to the procedural generator.
    pub fn from_env(timeout: Duration) -> Option<Self> {
        let api_token = std::env::var("TEXTURE_API_TOKEN").ok()?;
        if api_token.is_empty() {
            return None;
        }
        let api_url =
            std::env::var("TEXTURE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .ok()?;

        info!(api_url = %api_url, "AI texture client configured");
        Some(Self {
            client,
            api_url,
            api_token,
        })
    }

    /// Generate a texture for the prompt at the given resolution.
    pub async fn generate(&self, prompt: &str, resolution: Resolution) -> WorkerResult<RgbaImage> {
        debug!(prompt = %prompt, "Requesting AI texture");

        let request = TextureRequest {
            inputs: prompt,
            parameters: TextureParameters {
                width: resolution.width,
                height: resolution.height,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::ai_service(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WorkerError::ai_service(format!(
                "service returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkerError::ai_service(format!("body read failed: {}", e)))?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| WorkerError::ai_service(format!("invalid image payload: {}", e)))?
            .to_rgba8();

        debug!(
            width = image.width(),
            height = image.height(),
            "AI texture received"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_without_token() {
        std::env::remove_var("TEXTURE_API_TOKEN");
        assert!(TextureClient::from_env(Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_request_serialization() {
        let request = TextureRequest {
            inputs: "abstract texture",
            parameters: TextureParameters {
                width: 1280,
                height: 720,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"], "abstract texture");
        assert_eq!(json["parameters"]["width"], 1280);
    }
}
