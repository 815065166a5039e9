//! Result locator
//!
//! Two ordered strategies:
//!
//! 1. Naming-convention guess: build candidate keys (primary convention
//!    first) and confirm each with `head`.
//! 2. Listing fallback: list the output prefix and pick the key that carries
//!    the job id as a delimited segment and ends with a convention's expected
//!    suffix.
//!
//! A key is only ever returned after one of these confirmed it. When neither
//! finds anything the output may simply not be listable yet, so the result is
//! [`Resolution::Finalizing`] rather than an error.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use transdoc_core::{JobStatus, ResultDescriptor, TranslationJob};
use transdoc_storage::BlobStore;

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::naming::NamingConvention;
use crate::settings::OrchestratorSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResultDescriptor),
    /// Nothing confirmed yet; poll again before retrying.
    Finalizing,
}

#[derive(Clone)]
pub struct ResultLocator {
    store: Arc<dyn BlobStore>,
    output_prefix: String,
    account_id: Option<String>,
    conventions: Vec<NamingConvention>,
    request_timeout: Duration,
}

impl ResultLocator {
    pub fn new(store: Arc<dyn BlobStore>, settings: &OrchestratorSettings) -> Self {
        Self {
            store,
            output_prefix: settings.output_prefix.clone(),
            account_id: settings.account_id.clone(),
            conventions: NamingConvention::ordered(settings.primary_naming),
            request_timeout: settings.request_timeout,
        }
    }

    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    #[tracing::instrument(skip_all, fields(job_id = %job.job_id()))]
    pub async fn resolve(&self, job: &TranslationJob) -> OrchestrationResult<Resolution> {
        if job.status() != JobStatus::Succeeded {
            return Err(OrchestrationError::ResolutionNotFound {
                job_id: job.job_id().to_string(),
                prefix: self.output_prefix.clone(),
            });
        }

        if let Some(key) = self.confirm_candidates(job).await {
            tracing::info!(output_key = %key, "Output located by naming convention");
            return Ok(Resolution::Found(ResultDescriptor::new(key)));
        }

        if let Some(key) = self.search_listing(job).await {
            tracing::info!(output_key = %key, "Output located by listing");
            return Ok(Resolution::Found(ResultDescriptor::new(key)));
        }

        tracing::info!(prefix = %self.output_prefix, "Output not visible yet");
        Ok(Resolution::Finalizing)
    }

    async fn confirm_candidates(&self, job: &TranslationJob) -> Option<String> {
        for convention in &self.conventions {
            let Some(candidate) =
                convention.candidate_key(&self.output_prefix, self.account_id.as_deref(), job)
            else {
                continue;
            };

            match timeout(self.request_timeout, self.store.head(&candidate)).await {
                Ok(Ok(true)) => return Some(candidate),
                Ok(Ok(false)) => {
                    tracing::debug!(candidate = %candidate, convention = ?convention, "Candidate not found");
                }
                Ok(Err(e)) => {
                    tracing::warn!(candidate = %candidate, error = %e, "Candidate check failed");
                }
                Err(_) => {
                    tracing::warn!(candidate = %candidate, "Candidate check timed out");
                }
            }
        }
        None
    }

    async fn search_listing(&self, job: &TranslationJob) -> Option<String> {
        let keys = match timeout(self.request_timeout, self.store.list(&self.output_prefix)).await {
            Ok(Ok(keys)) => keys,
            Ok(Err(e)) => {
                tracing::warn!(prefix = %self.output_prefix, error = %e, "Output listing failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(prefix = %self.output_prefix, "Output listing timed out");
                return None;
            }
        };

        select_listed_output(&keys, &self.output_prefix, job, &self.conventions)
    }
}

/// Pick the output for `job` from a listing.
///
/// Conventions are tried in order; within one convention the lexicographically
/// first match wins.
pub fn select_listed_output(
    keys: &[String],
    output_prefix: &str,
    job: &TranslationJob,
    conventions: &[NamingConvention],
) -> Option<String> {
    conventions.iter().find_map(|convention| {
        let marker = convention.job_marker(job);
        let suffix = convention.expected_suffix(job);
        keys.iter()
            .filter(|key| {
                key.strip_prefix(output_prefix)
                    .is_some_and(|rest| rest.contains(&marker))
                    && key.ends_with(&suffix)
            })
            .min()
            .cloned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use transdoc_core::OutputNaming;
    use transdoc_storage::MemoryStorage;

    fn succeeded(id: &str, source: &str, lang: &str) -> TranslationJob {
        let mut job = TranslationJob::new(id, source, lang);
        job.observe_status(JobStatus::Succeeded);
        job
    }

    fn locator(storage: &MemoryStorage, account: Option<&str>) -> ResultLocator {
        let settings = OrchestratorSettings {
            account_id: account.map(String::from),
            ..Default::default()
        };
        ResultLocator::new(Arc::new(storage.clone()), &settings)
    }

    #[test]
    fn listing_requires_job_id_and_suffix() {
        let job = succeeded("J2", "uploads/report.docx", "de");
        let keys = vec![
            "translated/ACME-TranslateText-J20/fr.report.docx".to_string(),
            "translated/ACME-TranslateText-J3/de.report.docx".to_string(),
            "translated/ACME-TranslateText-J2/de.report.docx".to_string(),
        ];
        assert_eq!(
            select_listed_output(&keys, "translated/", &job, &NamingConvention::ALL).as_deref(),
            Some("translated/ACME-TranslateText-J2/de.report.docx")
        );
    }

    #[test]
    fn listing_ignores_job_ids_sharing_a_prefix() {
        let job = succeeded("J2", "uploads/report.docx", "de");
        let keys = vec![
            "translated/ACME-TranslateText-J20/de.report.docx".to_string(),
            "translated/ACME-J21-de/uploads/report.docx".to_string(),
        ];
        assert_eq!(
            select_listed_output(&keys, "translated/", &job, &NamingConvention::ALL),
            None
        );

        let mut keys = keys;
        keys.push("translated/ACME-TranslateText-J2/de.report.docx".to_string());
        assert_eq!(
            select_listed_output(&keys, "translated/", &job, &NamingConvention::ALL).as_deref(),
            Some("translated/ACME-TranslateText-J2/de.report.docx")
        );
    }

    #[test]
    fn listing_prefers_convention_order() {
        let job = succeeded("J4", "uploads/r.pdf", "it");
        let keys = vec![
            "translated/A-J4-it/uploads/r.pdf".to_string(),
            "translated/A-TranslateText-J4/it.r.pdf".to_string(),
        ];
        let prefixed_first = NamingConvention::ordered(OutputNaming::LanguagePrefixed);
        assert_eq!(
            select_listed_output(&keys, "translated/", &job, &prefixed_first).as_deref(),
            Some("translated/A-TranslateText-J4/it.r.pdf")
        );
    }

    #[tokio::test]
    async fn candidate_confirmed_by_head() {
        let storage = MemoryStorage::new();
        storage.insert_visible("translated/ACME-J1-de/uploads/1700000000-report.pdf", "x");
        let locator = locator(&storage, Some("ACME"));

        let job = succeeded("J1", "uploads/1700000000-report.pdf", "de");
        let resolution = locator.resolve(&job).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Found(ResultDescriptor::new(
                "translated/ACME-J1-de/uploads/1700000000-report.pdf"
            ))
        );
        assert_eq!(storage.list_calls(), 0);
    }

    #[tokio::test]
    async fn listing_used_without_account_id() {
        let storage = MemoryStorage::new();
        storage.insert_visible("translated/999-TranslateText-J2/de.report.docx", "x");
        let locator = locator(&storage, None);

        let job = succeeded("J2", "uploads/report.docx", "de");
        match locator.resolve(&job).await.unwrap() {
            Resolution::Found(descriptor) => {
                assert_eq!(descriptor.output_key, "translated/999-TranslateText-J2/de.report.docx");
                assert_eq!(descriptor.display_name, "de.report.docx");
            }
            other => panic!("expected output, got {:?}", other),
        }
        assert_eq!(storage.head_calls(), 0);
    }

    #[tokio::test]
    async fn nothing_found_is_finalizing() {
        let storage = MemoryStorage::new();
        let locator = locator(&storage, Some("ACME"));
        let job = succeeded("J3", "uploads/a.pdf", "de");
        assert_eq!(locator.resolve(&job).await.unwrap(), Resolution::Finalizing);
    }

    #[tokio::test]
    async fn listing_failure_is_finalizing() {
        let storage = MemoryStorage::new();
        storage.set_list_failure(Some("SlowDown"));
        let locator = locator(&storage, Some("ACME"));
        let job = succeeded("J3", "uploads/a.pdf", "de");
        assert_eq!(locator.resolve(&job).await.unwrap(), Resolution::Finalizing);
    }

    #[tokio::test]
    async fn unfinished_job_is_not_resolved() {
        let storage = MemoryStorage::new();
        let locator = locator(&storage, Some("ACME"));
        let job = TranslationJob::new("J3", "uploads/a.pdf", "de");
        assert!(locator.resolve(&job).await.is_err());
    }
}
