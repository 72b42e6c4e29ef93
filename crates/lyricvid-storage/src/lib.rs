//! Object storage client and asset lifecycle management.
//!
//! Uploads encoded videos with expiry metadata, enforces a strict 24-hour
//! time-to-live via a one-shot timer plus an hourly sweep, and issues
//! presigned time-limited access URLs.

pub mod client;
pub mod error;
pub mod lifecycle;

pub use client::{AssetInfo, StorageClient, StorageConfig, UploadReceipt, VIDEO_FOLDER};
pub use error::{StorageError, StorageResult};
pub use lifecycle::{is_expired, LifecycleManager, StorageUsage, EXPIRY, SWEEP_INTERVAL};
