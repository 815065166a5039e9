//! Orchestration error types
//!
//! Each variant belongs to exactly one [`FailureStage`], which is what the
//! session reports alongside the message.

use thiserror::Error;
use transdoc_core::{ConfigError, FailureStage};
use transdoc_translate::JobServiceError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrchestrationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected before the workflow started; the session phase is unchanged.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Input '{key}' did not become visible after {attempts} attempts")]
    PreflightTimeout { key: String, attempts: u32 },

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Status poll failed: {0}")]
    PollTransport(JobServiceError),

    /// Remote failure message, shown as-is.
    #[error("{0}")]
    JobFailed(String),

    #[error("Job {job_id} did not finish within {budget_secs}s")]
    PollBudgetExceeded { job_id: String, budget_secs: u64 },

    #[error("Job {job_id} succeeded but no output could be located under '{prefix}'")]
    ResolutionNotFound { job_id: String, prefix: String },
}

impl OrchestrationError {
    pub fn stage(&self) -> FailureStage {
        match self {
            OrchestrationError::Configuration(_) | OrchestrationError::InvalidRequest(_) => {
                FailureStage::Configuration
            }
            OrchestrationError::PreflightTimeout { .. } => FailureStage::Preflight,
            OrchestrationError::Submission(_) => FailureStage::Submission,
            OrchestrationError::PollTransport(_)
            | OrchestrationError::JobFailed(_)
            | OrchestrationError::PollBudgetExceeded { .. } => FailureStage::Processing,
            OrchestrationError::ResolutionNotFound { .. } => FailureStage::Resolution,
        }
    }

    /// Transient errors are retried locally instead of failing the session.
    pub fn is_transient(&self) -> bool {
        match self {
            OrchestrationError::PollTransport(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<ConfigError> for OrchestrationError {
    fn from(err: ConfigError) -> Self {
        OrchestrationError::Configuration(err.to_string())
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
