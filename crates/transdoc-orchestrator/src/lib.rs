//! Transdoc Orchestrator
//!
//! The job orchestration engine: confirm the uploaded input is visible,
//! submit a translation job, poll it to a terminal state, locate the output
//! and expose all of it as one observable session.
//!
//! Components are plain values built from injected [`BlobStore`] and
//! [`JobService`] clients, so tests can swap in fakes.
//!
//! [`BlobStore`]: transdoc_storage::BlobStore
//! [`JobService`]: transdoc_translate::JobService

pub mod error;
pub mod locator;
pub mod naming;
pub mod poller;
pub mod prober;
pub mod session;
pub mod settings;
pub mod submitter;

pub use error::{OrchestrationError, OrchestrationResult};
pub use locator::{select_listed_output, Resolution, ResultLocator};
pub use naming::{account_job_language_key, language_prefixed_key, NamingConvention};
pub use poller::{CancelHandle, PollOutcome, PollReport, StatusPoller};
pub use prober::AvailabilityProber;
pub use session::TranslationSession;
pub use settings::OrchestratorSettings;
pub use submitter::JobSubmitter;
