use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use transdoc_core::{content_kind_for, TranslationJob};
use transdoc_storage::BlobStore;
use transdoc_translate::{JobService, StartJobRequest};
use uuid::Uuid;

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::settings::OrchestratorSettings;

/// Builds job requests and submits them to the job service.
///
/// Submissions are not idempotent: each successful call is a separate,
/// billable job.
#[derive(Clone)]
pub struct JobSubmitter {
    store: Arc<dyn BlobStore>,
    jobs: Arc<dyn JobService>,
    access_role_ref: String,
    source_language: String,
    output_prefix: String,
    request_timeout: Duration,
}

impl JobSubmitter {
    pub fn new(
        store: Arc<dyn BlobStore>,
        jobs: Arc<dyn JobService>,
        settings: &OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            jobs,
            access_role_ref: settings.access_role_ref.clone(),
            source_language: settings.source_language.clone(),
            output_prefix: settings.output_prefix.clone(),
            request_timeout: settings.request_timeout,
        }
    }

    pub fn build_request(&self, source_key: &str, target_language: &str) -> StartJobRequest {
        let content_kind = content_kind_for(source_key);
        let job_token = Uuid::new_v4().simple().to_string();

        StartJobRequest {
            job_name: format!("transdoc-{}", job_token),
            input_location: self.store.location_uri(source_key),
            output_location_prefix: self.store.location_uri(&self.output_prefix),
            source_language: self.source_language.clone(),
            target_language: target_language.to_string(),
            content_type: content_kind.content_type().map(String::from),
            access_role_ref: self.access_role_ref.clone(),
            client_token: job_token,
        }
    }

    #[tracing::instrument(skip(self), fields(job_id))]
    pub async fn submit(&self, source_key: &str, target_language: &str) -> OrchestrationResult<TranslationJob> {
        let request = self.build_request(source_key, target_language);

        tracing::info!(
            job_name = %request.job_name,
            input_location = %request.input_location,
            content_type = ?request.content_type,
            "Submitting translation job"
        );

        let job_id = match timeout(self.request_timeout, self.jobs.start_job(&request)).await {
            Ok(Ok(job_id)) => job_id,
            Ok(Err(e)) => return Err(OrchestrationError::Submission(e.to_string())),
            Err(_) => {
                return Err(OrchestrationError::Submission(format!(
                    "job service did not answer within {}s",
                    self.request_timeout.as_secs()
                )))
            }
        };

        if job_id.trim().is_empty() {
            return Err(OrchestrationError::Submission(
                "job service returned no job identifier".to_string(),
            ));
        }

        tracing::Span::current().record("job_id", job_id.as_str());
        tracing::info!(job_id = %job_id, "Translation job submitted");

        Ok(TranslationJob::new(job_id, source_key, target_language))
    }
}
