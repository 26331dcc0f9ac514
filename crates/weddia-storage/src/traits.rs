//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

/// Storage abstraction trait
///
/// All storage backends (S3-compatible, local filesystem) must implement this
/// trait. The worker and the API handlers work against it without coupling to
/// a specific provider, and tests substitute an in-memory fake.
///
/// **Key format:** callers pass fully derived keys (see `keys`); backends never
/// invent key structure themselves.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a specific storage key. Returns the public URL for the
    /// uploaded object.
    async fn upload(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Download an object by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by its storage key
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Generate a presigned/temporary URL for direct access (GET)
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a presigned PUT URL for direct client uploads.
    ///
    /// Only supported by S3-compatible backends; others return `ConfigError`.
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Delete objects under the `temp/` namespace last modified before the
    /// cutoff. Returns the number of objects removed. Used by the operator
    /// sweep that reclaims staged files whose job registration never happened.
    async fn sweep_stale_temp(&self, older_than: Duration) -> StorageResult<usize>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
