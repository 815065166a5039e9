//! Error types module
//!
//! Configuration failures are fatal at startup: they are reported once and the
//! process exits. Component-level errors live next to their components
//! (`StorageError`, `JobServiceError`, `OrchestrationError`).

/// Errors raised while loading or validating [`crate::Config`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
