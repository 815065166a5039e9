//! Transdoc Storage Library
//!
//! The blob store collaborator: a `BlobStore` trait with S3, local filesystem
//! and in-memory implementations.
//!
//! # Key format
//!
//! - **Uploaded documents**: `{UPLOAD_PREFIX}{epoch_millis}-{filename}`
//! - **Translated documents**: under `{OUTPUT_PREFIX}`, named by the translation service
//!
//! Keys use `/` as separator and must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{BlobStore, StorageError, StorageResult};
pub use transdoc_core::StorageBackend;
