//! S3-compatible storage client for encoded videos.
//!
//! Uploaded assets carry expiry metadata and tags so the lifecycle manager
//! (and any bucket-side rules) can identify them; listing exposes creation
//! timestamps for the age-based sweep.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Namespace prefix under which all encoded videos are stored.
pub const VIDEO_FOLDER: &str = "lyric-videos";

/// Configuration for the storage client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2-style endpoints)
    pub region: String,
}

impl StorageConfig {
    /// Create config from environment variables.
    ///
    /// Returns `None` when the required variables are absent so callers can
    /// fall back to local-file results instead of failing the job.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            endpoint_url: std::env::var("STORAGE_ENDPOINT_URL").ok()?,
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID").ok()?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY").ok()?,
            bucket_name: std::env::var("STORAGE_BUCKET_NAME").ok()?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Receipt returned by a successful upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadReceipt {
    /// Storage key of the asset.
    pub public_id: String,
    /// Direct URL (unsigned; callers should hand out presigned URLs).
    pub secure_url: String,
    /// Container format.
    pub format: String,
}

/// Information about a stored asset.
#[derive(Debug, Clone)]
pub struct AssetInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    bucket: String,
    endpoint_url: String,
}

impl StorageClient {
    /// Create a new client from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "lyricvid",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            endpoint_url: config.endpoint_url,
        })
    }

    /// Create from environment variables, or `None` when unconfigured.
    pub async fn from_env() -> StorageResult<Option<Self>> {
        match StorageConfig::from_env() {
            Some(config) => Ok(Some(Self::new(config).await?)),
            None => Ok(None),
        }
    }

    /// Storage key for a job's encoded video.
    pub fn video_key(job_id: &str) -> String {
        format!("{}/{}.mp4", VIDEO_FOLDER, job_id)
    }

    /// Upload an encoded video with expiry metadata and lifecycle tags.
    pub async fn upload_video(
        &self,
        path: impl AsRef<Path>,
        job_id: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<UploadReceipt> {
        let path = path.as_ref();
        let key = Self::video_key(job_id);
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type("video/mp4")
            .metadata("expires-at", expires_at.to_rfc3339())
            .metadata("auto-delete", "true")
            .tagging("ttl=24h&kind=lyric-video")
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(UploadReceipt {
            secure_url: format!("{}/{}/{}", self.endpoint_url, self.bucket, key),
            public_id: key,
            format: "mp4".to_string(),
        })
    }

    /// Delete an asset. "Not found" counts as success: both deletion
    /// triggers race to the same operation and either may lose.
    pub async fn delete_asset(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("NoSuchKey") || msg.contains("NotFound") {
                    debug!("Asset {} already gone", key);
                    Ok(())
                } else {
                    Err(StorageError::delete_failed(msg))
                }
            }
        }
    }

    /// List assets under a prefix with creation timestamps.
    pub async fn list_assets(&self, prefix: &str) -> StorageResult<Vec<AssetInfo>> {
        debug!("Listing assets with prefix: {}", prefix);

        let mut assets = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            if let Some(ref contents) = response.contents {
                for obj in contents {
                    let created_at = obj
                        .last_modified
                        .as_ref()
                        .and_then(|t| t.to_millis().ok())
                        .and_then(DateTime::<Utc>::from_timestamp_millis);
                    assets.push(AssetInfo {
                        key: obj.key.clone().unwrap_or_default(),
                        size: obj.size.unwrap_or(0) as u64,
                        created_at,
                    });
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(assets)
    }

    /// Generate a presigned URL that expires with the asset.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Check if an asset exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("NotFound") || msg.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::AwsSdk(msg))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_key_namespace() {
        assert_eq!(
            StorageClient::video_key("job-123"),
            "lyric-videos/job-123.mp4"
        );
    }

    #[test]
    fn test_config_from_env_absent() {
        // Missing variables must not error; the pipeline falls back to a
        // local-file result instead.
        std::env::remove_var("STORAGE_ENDPOINT_URL");
        assert!(StorageConfig::from_env().is_none());
    }
}
