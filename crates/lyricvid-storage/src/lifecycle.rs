//! Asset lifecycle management with a strict time-to-live.
//!
//! Every uploaded asset moves through `uploaded -> deletion_pending ->
//! deleted`. Two independent triggers race to the same idempotent delete:
//! a one-shot timer started at upload time, and an hourly sweep that lists
//! the video namespace and deletes anything older than the window. Either
//! trigger may lose the race; "not found" counts as success.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::client::{StorageClient, VIDEO_FOLDER};
use crate::error::StorageResult;

/// Deletion window applied to every uploaded asset.
pub const EXPIRY: Duration = Duration::from_secs(24 * 3600);

/// Interval between sweep cycles.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Snapshot of lifecycle state for result metrics.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StorageUsage {
    /// Deletions currently outstanding.
    pub pending_deletions: u32,
}

/// Process-wide manager enforcing the deletion window.
pub struct LifecycleManager {
    storage: StorageClient,
    pending: Mutex<HashMap<String, DateTime<Utc>>>,
    expiry: Duration,
}

impl LifecycleManager {
    /// Manager with the standard 24-hour window.
    pub fn new(storage: StorageClient) -> Arc<Self> {
        Self::with_expiry(storage, EXPIRY)
    }

    /// Manager with a custom window (used by tests).
    pub fn with_expiry(storage: StorageClient, expiry: Duration) -> Arc<Self> {
        Arc::new(Self {
            storage,
            pending: Mutex::new(HashMap::new()),
            expiry,
        })
    }

    /// Expiry timestamp for an asset uploaded now.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::from_std(self.expiry).unwrap_or(chrono::Duration::hours(24))
    }

    /// Record an asset and start its one-shot deletion timer.
    ///
    /// Each asset has exactly one scheduled deletion outstanding at a time;
    /// re-scheduling the same key replaces the pending entry.
    pub async fn schedule_deletion(self: Arc<Self>, asset_id: String) {
        let expiry_time = self.expires_at();
        self.pending
            .lock()
            .await
            .insert(asset_id.clone(), expiry_time);

        info!(asset_id = %asset_id, expires_at = %expiry_time, "Scheduled deletion");

        let manager = Arc::clone(&self);
        let delay = self.expiry;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = manager.delete_asset(&asset_id).await {
                // The hourly sweep retries anything the timer missed
                error!(asset_id = %asset_id, error = %e, "Timed deletion failed");
            }
        });
    }

    /// Delete an asset immediately. Tolerates the asset already being gone.
    pub async fn delete_asset(&self, asset_id: &str) -> StorageResult<()> {
        self.storage.delete_asset(asset_id).await?;
        self.pending.lock().await.remove(asset_id);
        debug!(asset_id = %asset_id, "Asset deleted");
        Ok(())
    }

    /// Run the sweep loop forever. One cycle's error never cancels the
    /// schedule; the next tick retries.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let manager = self;
        tokio::spawn(async move {
            info!(interval_secs = SWEEP_INTERVAL.as_secs(), "Starting lifecycle sweeper");
            let mut ticker = interval(SWEEP_INTERVAL);
            // The first tick fires immediately; skip it so a fresh process
            // doesn't sweep before any asset could have expired.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match manager.sweep_once().await {
                    Ok(deleted) if deleted > 0 => {
                        info!(deleted = deleted, "Sweep cycle completed");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "Sweep cycle failed, retrying next tick");
                    }
                }
            }
        })
    }

    /// Run a single sweep cycle: delete every asset in the video namespace
    /// whose age exceeds the window. Returns the number deleted.
    pub async fn sweep_once(&self) -> StorageResult<u32> {
        let prefix = format!("{}/", VIDEO_FOLDER);
        let assets = self.storage.list_assets(&prefix).await?;
        let now = Utc::now();

        let mut deleted = 0u32;
        for asset in assets {
            let Some(created_at) = asset.created_at else {
                continue;
            };
            if !is_expired(created_at, now, self.expiry) {
                continue;
            }
            match self.delete_asset(&asset.key).await {
                Ok(()) => {
                    deleted += 1;
                    debug!(key = %asset.key, "Swept expired asset");
                }
                Err(e) => {
                    // Retried on the next cycle
                    warn!(key = %asset.key, error = %e, "Failed to sweep asset");
                }
            }
        }

        self.prune_pending(now).await;
        Ok(deleted)
    }

    /// Drop pending entries whose expiry has long passed (their remote
    /// object was already removed by the sweep or bucket rules).
    async fn prune_pending(&self, now: DateTime<Utc>) {
        let grace = chrono::Duration::from_std(self.expiry).unwrap_or(chrono::Duration::hours(24));
        let mut pending = self.pending.lock().await;
        pending.retain(|asset_id, expiry_time| {
            let keep = now < *expiry_time + grace;
            if !keep {
                debug!(asset_id = %asset_id, "Pruned stale pending deletion");
            }
            keep
        });
    }

    /// Time-limited access URL for an asset, valid for the deletion window.
    pub async fn signed_url(&self, asset_id: &str) -> StorageResult<String> {
        self.storage.presign_get(asset_id, self.expiry).await
    }

    /// Lifecycle state snapshot.
    pub async fn usage(&self) -> StorageUsage {
        StorageUsage {
            pending_deletions: self.pending.lock().await.len() as u32,
        }
    }

    /// Number of outstanding pending deletions.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Whether an asset created at `created_at` has outlived the window.
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>, expiry: Duration) -> bool {
    let age = now.signed_duration_since(created_at);
    match chrono::Duration::from_std(expiry) {
        Ok(window) => age >= window,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired_boundaries() {
        let now = Utc::now();
        let window = Duration::from_secs(24 * 3600);

        let fresh = now - chrono::Duration::hours(1);
        assert!(!is_expired(fresh, now, window));

        let exactly = now - chrono::Duration::hours(24);
        assert!(is_expired(exactly, now, window));

        let stale = now - chrono::Duration::hours(25);
        assert!(is_expired(stale, now, window));
    }

    #[test]
    fn test_is_expired_future_creation() {
        // Clock skew: an asset "created in the future" is not expired
        let now = Utc::now();
        let future = now + chrono::Duration::hours(1);
        assert!(!is_expired(future, now, Duration::from_secs(3600)));
    }
}
