//! Configuration module
//!
//! Configuration is read once at process start (environment plus an optional
//! `.env` file) and is immutable afterwards. Components receive the values they
//! need at construction time.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::error::ConfigError;
use crate::storage_types::StorageBackend;

/// Output naming convention the Result Locator tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputNaming {
    /// `<prefix><accountId>-<jobId>-<lang>/<sourceKey>`
    AccountJobLanguage,
    /// `<prefix><accountId>-TranslateText-<jobId>/<lang>.<fileName>`
    LanguagePrefixed,
}

impl FromStr for OutputNaming {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "account-job-language" => Ok(OutputNaming::AccountJobLanguage),
            "language-prefixed" => Ok(OutputNaming::LanguagePrefixed),
            _ => Err(anyhow::anyhow!("Invalid output naming convention: {}", s)),
        }
    }
}

impl Display for OutputNaming {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutputNaming::AccountJobLanguage => write!(f, "account-job-language"),
            OutputNaming::LanguagePrefixed => write!(f, "language-prefixed"),
        }
    }
}

/// Log output format for the binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Raw translator configuration
#[derive(Clone, Debug)]
pub struct TranslatorConfig {
    pub environment: String,
    pub log_format: LogFormat,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub upload_prefix: String,
    pub output_prefix: String,
    // Translation service configuration
    pub data_access_role_arn: Option<String>,
    pub account_id: Option<String>,
    pub source_language: String,
    pub output_naming: OutputNaming,
    // Orchestration tuning
    pub preflight_max_attempts: u32,
    pub preflight_base_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_budget_secs: u64,
    pub request_timeout_secs: u64,
    pub resolve_max_finalize_attempts: u32,
    // Links
    pub presigned_url_expiry_secs: u64,
    pub frontend_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<TranslatorConfig>);

impl Config {
    fn inner(&self) -> &TranslatorConfig {
        &self.0
    }

    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = TranslatorConfig::from_lookup(lookup)?;
        config.validate()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.inner().log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    /// Region used for AWS clients: `S3_REGION` first, then `AWS_REGION`.
    pub fn effective_region(&self) -> Option<&str> {
        self.s3_region().or_else(|| self.aws_region())
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn upload_prefix(&self) -> &str {
        &self.inner().upload_prefix
    }

    pub fn output_prefix(&self) -> &str {
        &self.inner().output_prefix
    }

    pub fn data_access_role_arn(&self) -> Option<&str> {
        self.inner().data_access_role_arn.as_deref()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.inner().account_id.as_deref()
    }

    pub fn source_language(&self) -> &str {
        &self.inner().source_language
    }

    pub fn output_naming(&self) -> OutputNaming {
        self.inner().output_naming
    }

    pub fn preflight_max_attempts(&self) -> u32 {
        self.inner().preflight_max_attempts
    }

    pub fn preflight_base_delay(&self) -> Duration {
        Duration::from_millis(self.inner().preflight_base_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.inner().poll_interval_ms)
    }

    pub fn poll_budget(&self) -> Duration {
        Duration::from_secs(self.inner().poll_budget_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().request_timeout_secs)
    }

    pub fn resolve_max_finalize_attempts(&self) -> u32 {
        self.inner().resolve_max_finalize_attempts
    }

    pub fn presigned_url_expiry(&self) -> Duration {
        Duration::from_secs(self.inner().presigned_url_expiry_secs)
    }

    pub fn frontend_url(&self) -> Option<&str> {
        self.inner().frontend_url.as_deref()
    }
}

fn parse_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(var, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Prefixes are stored with exactly one trailing slash and no leading slash.
fn normalize_prefix(raw: String) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

impl TranslatorConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = non_empty(&lookup, "ENVIRONMENT")
            .or_else(|| non_empty(&lookup, "APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let log_format = match non_empty(&lookup, "LOG_FORMAT")
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "LOG_FORMAT",
                    other,
                    "expected 'text' or 'json'",
                ))
            }
        };

        let storage_backend = match non_empty(&lookup, "STORAGE_BACKEND") {
            Some(raw) => raw
                .parse()
                .map_err(|e: anyhow::Error| ConfigError::invalid("STORAGE_BACKEND", raw.clone(), e.to_string()))?,
            None => StorageBackend::S3,
        };

        let output_naming = match non_empty(&lookup, "OUTPUT_NAMING") {
            Some(raw) => raw
                .parse()
                .map_err(|e: anyhow::Error| ConfigError::invalid("OUTPUT_NAMING", raw.clone(), e.to_string()))?,
            None => OutputNaming::AccountJobLanguage,
        };

        Ok(TranslatorConfig {
            environment,
            log_format,
            storage_backend,
            s3_bucket: non_empty(&lookup, "S3_BUCKET"),
            s3_region: non_empty(&lookup, "S3_REGION"),
            s3_endpoint: non_empty(&lookup, "S3_ENDPOINT"),
            aws_region: non_empty(&lookup, "AWS_REGION"),
            local_storage_path: non_empty(&lookup, "LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty(&lookup, "LOCAL_STORAGE_BASE_URL"),
            upload_prefix: normalize_prefix(
                non_empty(&lookup, "UPLOAD_PREFIX").unwrap_or_else(|| DEFAULT_UPLOAD_PREFIX.to_string()),
            ),
            output_prefix: normalize_prefix(
                non_empty(&lookup, "OUTPUT_PREFIX").unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
            ),
            data_access_role_arn: non_empty(&lookup, "TRANSLATE_DATA_ACCESS_ROLE_ARN"),
            account_id: non_empty(&lookup, "TRANSLATE_ACCOUNT_ID"),
            source_language: non_empty(&lookup, "TRANSLATE_SOURCE_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_SOURCE_LANGUAGE.to_string()),
            output_naming,
            preflight_max_attempts: parse_or(
                &lookup,
                "PREFLIGHT_MAX_ATTEMPTS",
                DEFAULT_PREFLIGHT_MAX_ATTEMPTS,
            )?,
            preflight_base_delay_ms: parse_or(
                &lookup,
                "PREFLIGHT_BASE_DELAY_MS",
                DEFAULT_PREFLIGHT_BASE_DELAY_MS,
            )?,
            poll_interval_ms: parse_or(&lookup, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            poll_budget_secs: parse_or(&lookup, "POLL_BUDGET_SECS", DEFAULT_POLL_BUDGET_SECS)?,
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            resolve_max_finalize_attempts: parse_or(
                &lookup,
                "RESOLVE_MAX_FINALIZE_ATTEMPTS",
                DEFAULT_RESOLVE_MAX_FINALIZE_ATTEMPTS,
            )?,
            presigned_url_expiry_secs: parse_or(
                &lookup,
                "PRESIGNED_URL_EXPIRY_SECS",
                DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
            )?,
            frontend_url: non_empty(&lookup, "FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(ConfigError::Missing("S3_BUCKET"));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(ConfigError::Missing("S3_REGION or AWS_REGION"));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(ConfigError::Missing("LOCAL_STORAGE_PATH"));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(ConfigError::Missing("LOCAL_STORAGE_BASE_URL"));
                }
            }
            StorageBackend::Memory => {}
        }

        if self.data_access_role_arn.is_none() {
            return Err(ConfigError::Missing("TRANSLATE_DATA_ACCESS_ROLE_ARN"));
        }

        if self.output_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "OUTPUT_PREFIX must not be empty".to_string(),
            ));
        }

        if self.upload_prefix == self.output_prefix {
            return Err(ConfigError::Validation(
                "UPLOAD_PREFIX and OUTPUT_PREFIX must differ".to_string(),
            ));
        }

        if self.preflight_max_attempts == 0 {
            return Err(ConfigError::Validation(
                "PREFLIGHT_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        if self.poll_budget_secs.saturating_mul(1000) < self.poll_interval_ms {
            return Err(ConfigError::Validation(
                "POLL_BUDGET_SECS must cover at least one poll interval".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
