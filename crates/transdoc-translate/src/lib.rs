//! Transdoc Translate Library
//!
//! The job service collaborator: submitting batch document translation jobs
//! and describing their state. The Amazon Translate backend lives behind the
//! `aws-translate` feature.

#[cfg(feature = "aws-translate")]
pub mod aws;
pub mod traits;

#[cfg(feature = "aws-translate")]
pub use aws::AwsTranslateService;
pub use traits::{JobDescription, JobService, JobServiceError, JobServiceResult, StartJobRequest};
