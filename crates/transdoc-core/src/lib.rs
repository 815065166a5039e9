//! Transdoc Core Library
//!
//! This crate provides the configuration, error types, domain models and key
//! helpers shared by the storage, job-service, orchestration and CLI crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod keys;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, LogFormat, OutputNaming, TranslatorConfig};
pub use error::ConfigError;
pub use keys::{file_name_of, normalize_shared_key, share_link, upload_key_for};
pub use models::{
    content_kind_for, map_remote_status, supported_languages, validate_language_code,
    ContentKind, FailureStage, InvalidLanguageCode, JobStatus, Language, ResultDescriptor,
    SessionError, SessionPhase, SessionSnapshot, TranslationJob,
};
pub use storage_types::StorageBackend;
