use std::time::Duration;
use transdoc_core::constants::*;
use transdoc_core::{Config, OutputNaming};

use crate::error::{OrchestrationError, OrchestrationResult};

/// Tuning and identity values the orchestration components are built with.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Role the job service assumes to read inputs and write outputs.
    pub access_role_ref: String,
    pub account_id: Option<String>,
    pub source_language: String,
    pub output_prefix: String,
    pub primary_naming: OutputNaming,
    pub preflight_max_attempts: u32,
    pub preflight_base_delay: Duration,
    pub poll_interval: Duration,
    pub poll_budget: Duration,
    pub request_timeout: Duration,
    pub max_finalize_attempts: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            access_role_ref: String::new(),
            account_id: None,
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            primary_naming: OutputNaming::AccountJobLanguage,
            preflight_max_attempts: DEFAULT_PREFLIGHT_MAX_ATTEMPTS,
            preflight_base_delay: Duration::from_millis(DEFAULT_PREFLIGHT_BASE_DELAY_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_budget: Duration::from_secs(DEFAULT_POLL_BUDGET_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_finalize_attempts: DEFAULT_RESOLVE_MAX_FINALIZE_ATTEMPTS,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> OrchestrationResult<Self> {
        let access_role_ref = config
            .data_access_role_arn()
            .map(String::from)
            .ok_or_else(|| {
                OrchestrationError::Configuration(
                    "TRANSLATE_DATA_ACCESS_ROLE_ARN must be set".to_string(),
                )
            })?;

        Ok(Self {
            access_role_ref,
            account_id: config.account_id().map(String::from),
            source_language: config.source_language().to_string(),
            output_prefix: config.output_prefix().to_string(),
            primary_naming: config.output_naming(),
            preflight_max_attempts: config.preflight_max_attempts(),
            preflight_base_delay: config.preflight_base_delay(),
            poll_interval: config.poll_interval(),
            poll_budget: config.poll_budget(),
            request_timeout: config.request_timeout(),
            max_finalize_attempts: config.resolve_max_finalize_attempts(),
        })
    }
}
