//! Job service abstraction trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use transdoc_core::{map_remote_status, JobStatus};

/// Job service errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobServiceError {
    /// The service refused the request (validation, quota, permissions).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The request did not complete (network, timeout, throttling, 5xx).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl JobServiceError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, JobServiceError::Transport(_))
    }
}

/// Result type for job service operations
pub type JobServiceResult<T> = Result<T, JobServiceError>;

/// Parameters of one translation job submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartJobRequest {
    pub job_name: String,
    /// Location of the single input document (e.g. `s3://bucket/uploads/1-report.pdf`).
    pub input_location: String,
    /// Prefix the service writes its output under (e.g. `s3://bucket/translated/`).
    pub output_location_prefix: String,
    pub source_language: String,
    pub target_language: String,
    /// `None` lets the service detect the document type.
    pub content_type: Option<String>,
    /// Role the service assumes to read the input and write the output.
    pub access_role_ref: String,
    /// Deduplication token for the submission.
    pub client_token: String,
}

/// Remote view of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JobDescription {
    /// Raw status as reported by the service.
    pub status: String,
    pub target_languages: Vec<String>,
    pub failure_message: Option<String>,
    /// Output location as reported by the service. Informational only; its
    /// format is not stable enough to address the result directly.
    pub output_location: Option<String>,
}

impl JobDescription {
    pub fn mapped_status(&self) -> JobStatus {
        map_remote_status(&self.status)
    }
}

/// Asynchronous translation job service.
///
/// Implementations are stateless and reentrant. `start_job` is not
/// idempotent unless the backend honours `client_token`.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Submit a job and return its identifier.
    async fn start_job(&self, request: &StartJobRequest) -> JobServiceResult<String>;

    /// Describe the current state of a job.
    async fn describe_job(&self, job_id: &str) -> JobServiceResult<JobDescription>;
}
