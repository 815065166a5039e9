//! Defaults shared by configuration and the orchestration components.

/// Prefix under which the upload transport writes input documents.
pub const DEFAULT_UPLOAD_PREFIX: &str = "uploads/";

/// Prefix under which the translation service writes its output.
pub const DEFAULT_OUTPUT_PREFIX: &str = "translated/";

/// Source language passed to the translation service; `auto` lets it detect.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "auto";

pub const DEFAULT_PREFLIGHT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_PREFLIGHT_BASE_DELAY_MS: u64 = 500;

/// Upper bound for a single preflight backoff step.
pub const MAX_PREFLIGHT_BACKOFF_MS: u64 = 10_000;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Total wall-clock budget for status polling of one job (30 minutes).
pub const DEFAULT_POLL_BUDGET_SECS: u64 = 1_800;

/// Timeout applied to every individual call to the store or the job service.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How many times a succeeded job may report "output not yet listable"
/// before the session gives up with a resolution failure.
pub const DEFAULT_RESOLVE_MAX_FINALIZE_ATTEMPTS: u32 = 3;

pub const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 3_600;
