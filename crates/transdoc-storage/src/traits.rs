//! Blob store abstraction trait
//!
//! This module defines the BlobStore trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Listing failed: {0}")]
    ListFailed(String),

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

/// Key-addressed object store.
///
/// Implementations are stateless from the caller's point of view and safe to
/// share across sessions behind an `Arc`. Keys use `/` as separator and never
/// start with `/`.
///
/// Stores may be eventually consistent: an object that was just written can be
/// missing from `head` and `list` for a while.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether an object exists under `key`.
    async fn head(&self, key: &str) -> StorageResult<bool>;

    /// All keys under `prefix`, in lexicographic order.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Read a whole object.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Write a whole object, replacing any previous content.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()>;

    /// Temporary URL a browser can use to download `key`.
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Location of `key` as understood by services reading the store directly
    /// (for S3 that is `s3://bucket/key`).
    fn location_uri(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
