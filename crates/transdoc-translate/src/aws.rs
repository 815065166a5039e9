//! Amazon Translate batch document translation backend

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_translate::error::{DisplayErrorContext, SdkError};
use aws_sdk_translate::types::{InputDataConfig, OutputDataConfig};
use aws_sdk_translate::Client as TranslateClient;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::traits::{JobDescription, JobService, JobServiceError, JobServiceResult, StartJobRequest};

/// Job service backed by Amazon Translate asynchronous batch jobs.
#[derive(Clone)]
pub struct AwsTranslateService {
    client: TranslateClient,
    region: String,
}

impl Debug for AwsTranslateService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AwsTranslateService")
            .field("region", &self.region)
            .finish()
    }
}

impl AwsTranslateService {
    /// Create a Translate client for the given region.
    ///
    /// Every API call is bounded by `request_timeout`.
    pub async fn new(region: &str, request_timeout: Duration) -> Self {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(request_timeout)
            .build();

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .timeout_config(timeouts)
            .load()
            .await;

        Self {
            client: TranslateClient::new(&config),
            region: region.to_string(),
        }
    }

    /// Wrap an existing client (custom endpoints, shared SDK config).
    pub fn from_client(client: TranslateClient, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

fn sdk_error_message<E, R>(err: &SdkError<E, R>) -> String
where
    E: std::error::Error + 'static,
    R: Debug,
{
    format!("{}", DisplayErrorContext(err))
}

#[async_trait]
impl JobService for AwsTranslateService {
    async fn start_job(&self, request: &StartJobRequest) -> JobServiceResult<String> {
        // Batch jobs require an explicit content type; there is no detection.
        let content_type = request.content_type.as_deref().ok_or_else(|| {
            JobServiceError::Rejected(format!(
                "Amazon Translate needs a content type for {}",
                request.input_location
            ))
        })?;

        let input = InputDataConfig::builder()
            .s3_uri(&request.input_location)
            .content_type(content_type)
            .build()
            .map_err(|e| JobServiceError::Rejected(e.to_string()))?;

        let output = OutputDataConfig::builder()
            .s3_uri(&request.output_location_prefix)
            .build()
            .map_err(|e| JobServiceError::Rejected(e.to_string()))?;

        let response = self
            .client
            .start_text_translation_job()
            .job_name(&request.job_name)
            .input_data_config(input)
            .output_data_config(output)
            .data_access_role_arn(&request.access_role_ref)
            .source_language_code(&request.source_language)
            .target_language_codes(&request.target_language)
            .client_token(&request.client_token)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(_) => JobServiceError::Rejected(sdk_error_message(&e)),
                _ => JobServiceError::Transport(sdk_error_message(&e)),
            })?;

        let job_id = response.job_id().unwrap_or_default().to_string();

        tracing::info!(
            job_name = %request.job_name,
            job_id = %job_id,
            region = %self.region,
            status = ?response.job_status().map(|s| s.as_str()),
            "Translation job started"
        );

        Ok(job_id)
    }

    async fn describe_job(&self, job_id: &str) -> JobServiceResult<JobDescription> {
        let response = self
            .client
            .describe_text_translation_job()
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_resource_not_found_exception())
                    .unwrap_or(false);
                if not_found {
                    JobServiceError::NotFound(job_id.to_string())
                } else {
                    JobServiceError::Transport(sdk_error_message(&e))
                }
            })?;

        let properties = response.text_translation_job_properties().ok_or_else(|| {
            JobServiceError::Transport(format!("No job properties returned for {}", job_id))
        })?;

        let description = JobDescription {
            status: properties
                .job_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            target_languages: properties.target_language_codes().to_vec(),
            failure_message: properties.message().map(String::from),
            output_location: properties
                .output_data_config()
                .map(|config| config.s3_uri().to_string()),
        };

        tracing::debug!(
            job_id = %job_id,
            status = %description.status,
            "Translation job described"
        );

        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_service() -> AwsTranslateService {
        let config = aws_sdk_translate::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-central-1"))
            .build();
        AwsTranslateService::from_client(TranslateClient::from_conf(config), "eu-central-1")
    }

    fn request(content_type: Option<&str>) -> StartJobRequest {
        StartJobRequest {
            job_name: "transdoc-test".to_string(),
            input_location: "s3://documents/uploads/1-archive.zip".to_string(),
            output_location_prefix: "s3://documents/translated/".to_string(),
            source_language: "auto".to_string(),
            target_language: "de".to_string(),
            content_type: content_type.map(String::from),
            access_role_ref: "arn:aws:iam::123456789012:role/translate".to_string(),
            client_token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected_locally() {
        let service = offline_service();
        let err = service.start_job(&request(None)).await.unwrap_err();
        assert!(matches!(err, JobServiceError::Rejected(_)));
        assert!(err.to_string().contains("uploads/1-archive.zip"));
    }
}
