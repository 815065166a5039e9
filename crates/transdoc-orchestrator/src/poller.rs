//! Status poller
//!
//! A cooperative loop: sleep one interval, issue one `describe`, repeat. The
//! next request is only sent after the previous one returned (or timed out),
//! so there is never more than one poll in flight for a job.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use transdoc_core::JobStatus;
use transdoc_translate::{JobService, JobServiceError};

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::settings::OrchestratorSettings;

/// Mapped result of one status request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub status: JobStatus,
    /// Raw status string from the service.
    pub remote_status: String,
    pub failure_message: Option<String>,
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    /// Remote failure message, verbatim.
    Failed(String),
    BudgetExceeded,
    /// A poll error that retrying will not fix.
    Error(OrchestrationError),
    Cancelled,
}

/// Stops a spawned watch. Safe to call any number of times, also after the
/// watch has finished.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Clone)]
pub struct StatusPoller {
    jobs: Arc<dyn JobService>,
    interval: Duration,
    budget: Duration,
    request_timeout: Duration,
}

impl StatusPoller {
    pub fn new(jobs: Arc<dyn JobService>, settings: &OrchestratorSettings) -> Self {
        Self {
            jobs,
            interval: settings.poll_interval,
            budget: settings.poll_budget,
            request_timeout: settings.request_timeout,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Issue a single status request.
    pub async fn poll(&self, job_id: &str) -> OrchestrationResult<PollReport> {
        let description = match timeout(self.request_timeout, self.jobs.describe_job(job_id)).await {
            Ok(Ok(description)) => description,
            Ok(Err(e)) => return Err(OrchestrationError::PollTransport(e)),
            Err(_) => {
                return Err(OrchestrationError::PollTransport(JobServiceError::Transport(
                    format!("no answer within {}ms", self.request_timeout.as_millis()),
                )))
            }
        };

        let status = description.mapped_status();
        let failure_message = match status {
            JobStatus::Failed => Some(description.failure_message.clone().unwrap_or_else(|| {
                format!("Translation job ended with status {}", description.status)
            })),
            _ => description.failure_message.clone(),
        };

        Ok(PollReport {
            status,
            remote_status: description.status,
            failure_message,
        })
    }

    /// Poll until the job is terminal, the budget is spent, or `cancel` fires.
    pub async fn watch(&self, job_id: &str, cancel: &CancellationToken) -> PollOutcome {
        let deadline = Instant::now() + self.budget;
        self.watch_until(job_id, deadline, cancel, |_, _| {}).await
    }

    /// Like [`watch`](Self::watch) with an explicit deadline, reporting every
    /// successful poll (with its 1-based number) to `on_progress`.
    #[tracing::instrument(skip(self, deadline, cancel, on_progress))]
    pub async fn watch_until<F>(
        &self,
        job_id: &str,
        deadline: Instant,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> PollOutcome
    where
        F: FnMut(u32, &PollReport) + Send,
    {
        let mut polls: u32 = 0;
        let mut transport_failures: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = sleep(self.interval) => {}
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    polls,
                    budget_secs = self.budget.as_secs(),
                    "Poll budget exhausted"
                );
                return PollOutcome::BudgetExceeded;
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                result = self.poll(job_id) => result,
            };

            match result {
                Ok(report) => {
                    polls += 1;
                    transport_failures = 0;
                    on_progress(polls, &report);
                    tracing::debug!(polls, status = %report.status, remote_status = %report.remote_status, "Polled job");

                    match report.status {
                        JobStatus::Succeeded => return PollOutcome::Succeeded,
                        JobStatus::Failed => {
                            let message = report.failure_message.unwrap_or_default();
                            tracing::info!(polls, message = %message, "Job failed remotely");
                            return PollOutcome::Failed(message);
                        }
                        JobStatus::Submitted | JobStatus::Processing => {}
                    }
                }
                Err(e) if e.is_transient() => {
                    transport_failures += 1;
                    tracing::warn!(error = %e, transport_failures, "Status poll failed, retrying next tick");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Status poll failed permanently");
                    return PollOutcome::Error(e);
                }
            }
        }
    }

    /// Run [`watch`](Self::watch) in the background, polling every
    /// `interval` instead of the configured one.
    ///
    /// `on_terminal` receives the terminal status and, for failures, the
    /// remote message. `on_error` receives budget and permanent poll errors.
    /// Neither is called after cancellation.
    pub fn spawn_watch<T, E>(
        &self,
        job_id: impl Into<String>,
        interval: Duration,
        on_terminal: T,
        on_error: E,
    ) -> CancelHandle
    where
        T: FnOnce(JobStatus, Option<String>) + Send + 'static,
        E: FnOnce(OrchestrationError) + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = CancelHandle {
            token: token.clone(),
        };
        let poller = StatusPoller {
            interval,
            ..self.clone()
        };
        let job_id = job_id.into();

        tokio::spawn(async move {
            match poller.watch(&job_id, &token).await {
                PollOutcome::Succeeded => on_terminal(JobStatus::Succeeded, None),
                PollOutcome::Failed(message) => on_terminal(JobStatus::Failed, Some(message)),
                PollOutcome::BudgetExceeded => on_error(OrchestrationError::PollBudgetExceeded {
                    job_id: job_id.clone(),
                    budget_secs: poller.budget.as_secs(),
                }),
                PollOutcome::Error(e) => on_error(e),
                PollOutcome::Cancelled => {
                    tracing::debug!(job_id = %job_id, "Watch cancelled");
                }
            }
        });

        handle
    }
}
