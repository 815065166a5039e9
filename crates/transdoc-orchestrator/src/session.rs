//! Orchestration session
//!
//! One session drives at most one translation at a time:
//!
//! `Idle -> Preflighting -> Submitting -> Polling -> Resolving -> Done`
//!
//! with `Failed` reachable from every working phase and `Resolving -> Polling`
//! while the output is not locatable yet. Every start, cancel and reset bumps
//! the session generation. Background work carries the generation it was
//! started with and its updates are dropped once the generation moved on.

use futures::Stream;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use transdoc_core::{
    validate_language_code, JobStatus, ResultDescriptor, SessionError, SessionPhase,
    SessionSnapshot, TranslationJob,
};
use transdoc_storage::BlobStore;
use transdoc_translate::JobService;

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::locator::{Resolution, ResultLocator};
use crate::poller::{PollOutcome, StatusPoller};
use crate::prober::AvailabilityProber;
use crate::settings::OrchestratorSettings;
use crate::submitter::JobSubmitter;

struct ActiveRun {
    generation: u64,
    token: CancellationToken,
}

struct SessionInner {
    prober: AvailabilityProber,
    submitter: JobSubmitter,
    poller: StatusPoller,
    locator: ResultLocator,
    settings: OrchestratorSettings,
    state: watch::Sender<SessionSnapshot>,
    active: Mutex<Option<ActiveRun>>,
}

impl SessionInner {
    fn active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `update` if `generation` is current and the phase change is
    /// allowed. Returns false when the update was dropped.
    fn transition<F>(&self, generation: u64, next: SessionPhase, update: F) -> bool
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let applied = self.state.send_if_modified(|snapshot| {
            if snapshot.generation != generation || !snapshot.phase.can_transition_to(next) {
                return false;
            }
            snapshot.phase = next;
            update(snapshot);
            true
        });

        if applied {
            tracing::info!(generation, phase = %next, "Session phase changed");
        } else {
            tracing::debug!(generation, phase = %next, "Stale session update dropped");
        }
        applied
    }

    /// Update the progress hint without changing phase.
    fn progress(&self, generation: u64, hint: String) {
        self.state.send_if_modified(|snapshot| {
            if snapshot.generation != generation || snapshot.is_terminal() {
                return false;
            }
            snapshot.progress_hint = Some(hint);
            true
        });
    }

    fn fail(&self, generation: u64, err: OrchestrationError) {
        tracing::warn!(generation, stage = %err.stage(), error = %err, "Session failed");
        self.transition(generation, SessionPhase::Failed, |snapshot| {
            snapshot.progress_hint = None;
            snapshot.error = Some(SessionError {
                stage: err.stage(),
                message: err.to_string(),
            });
        });
    }

    /// Bump the generation and publish `snapshot` for it. Must be called with
    /// the `active` lock held.
    fn next_generation(&self, build: impl FnOnce(u64) -> SessionSnapshot) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|snapshot| {
            generation = snapshot.generation + 1;
            *snapshot = build(generation);
        });
        generation
    }
}

/// Session API consumed by the presentation layer.
///
/// Sessions are isolated from each other; only the blob store and job service
/// clients are shared.
pub struct TranslationSession {
    inner: Arc<SessionInner>,
}

impl TranslationSession {
    pub fn new(
        store: Arc<dyn BlobStore>,
        jobs: Arc<dyn JobService>,
        settings: OrchestratorSettings,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::idle(0));
        let inner = SessionInner {
            prober: AvailabilityProber::new(store.clone(), settings.request_timeout),
            submitter: JobSubmitter::new(store.clone(), jobs.clone(), &settings),
            poller: StatusPoller::new(jobs, &settings),
            locator: ResultLocator::new(store, &settings),
            settings,
            state,
            active: Mutex::new(None),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Start translating `input_key` into `target_language`.
    ///
    /// Any run in progress is cancelled first. Returns the generation of the
    /// new run. An invalid request is rejected without touching the session.
    pub fn start(&self, input_key: &str, target_language: &str) -> OrchestrationResult<u64> {
        let input_key = input_key.trim();
        if input_key.is_empty() || input_key.ends_with('/') {
            return Err(OrchestrationError::InvalidRequest(format!(
                "'{}' is not an object key",
                input_key
            )));
        }
        let target_language = validate_language_code(target_language)
            .map_err(|e| OrchestrationError::InvalidRequest(e.to_string()))?;

        let mut active = self.inner.active();
        if let Some(previous) = active.take() {
            tracing::info!(generation = previous.generation, "Cancelling previous run");
            previous.token.cancel();
        }

        let generation = self.inner.next_generation(|generation| SessionSnapshot {
            generation,
            phase: SessionPhase::Preflighting,
            progress_hint: Some(format!("Waiting for {} to become visible", input_key)),
            ..Default::default()
        });

        let token = CancellationToken::new();
        *active = Some(ActiveRun {
            generation,
            token: token.clone(),
        });
        drop(active);

        tracing::info!(generation, input_key = %input_key, target_language = %target_language, "Session started");

        let inner = self.inner.clone();
        let input_key = input_key.to_string();
        tokio::spawn(async move {
            run(inner, generation, token, input_key, target_language).await;
        });

        Ok(generation)
    }

    /// Stop the current run and return to `Idle`.
    ///
    /// A no-op when nothing is running, so it is safe to call repeatedly and
    /// after the run has finished.
    pub fn cancel(&self) {
        let mut active = self.inner.active();
        let Some(run) = active.take() else {
            return;
        };
        run.token.cancel();

        // Check and bump under one lock so a run finishing concurrently keeps
        // its terminal snapshot.
        let mut generation = None;
        self.inner.state.send_if_modified(|snapshot| {
            if snapshot.generation != run.generation || snapshot.is_terminal() {
                return false;
            }
            let next = snapshot.generation + 1;
            *snapshot = SessionSnapshot::idle(next);
            generation = Some(next);
            true
        });

        match generation {
            Some(generation) => {
                tracing::info!(cancelled = run.generation, generation, "Session cancelled")
            }
            None => tracing::debug!(generation = run.generation, "Run already finished"),
        }
    }

    /// Return to `Idle` unconditionally (e.g. a new input was selected),
    /// cancelling any run in progress.
    pub fn reset(&self) {
        let mut active = self.inner.active();
        if let Some(run) = active.take() {
            run.token.cancel();
        }
        let generation = self.inner.next_generation(SessionSnapshot::idle);
        tracing::info!(generation, "Session reset");
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Snapshots starting with the current one.
    ///
    /// The stream ends after a `Done`/`Failed` snapshot, or after the `Idle`
    /// snapshot produced when a run it was following is cancelled. Every call
    /// returns an independent stream.
    pub fn observe(&self) -> impl Stream<Item = SessionSnapshot> + Send + 'static {
        let receiver = self.inner.state.subscribe();

        futures::stream::unfold(
            Some((receiver, None::<SessionPhase>)),
            |state| async move {
                let (mut receiver, last_phase) = state?;

                if last_phase.is_some() {
                    receiver.changed().await.ok()?;
                }
                let snapshot = receiver.borrow_and_update().clone();

                let left_run = snapshot.phase == SessionPhase::Idle
                    && last_phase.is_some_and(|phase| phase != SessionPhase::Idle);
                let next = if snapshot.is_terminal() || left_run {
                    None
                } else {
                    Some((receiver, Some(snapshot.phase)))
                };

                Some((snapshot, next))
            },
        )
    }
}

impl Drop for TranslationSession {
    fn drop(&mut self) {
        if let Some(run) = self.inner.active().take() {
            run.token.cancel();
        }
    }
}

#[tracing::instrument(skip(inner, token), fields(job_id))]
async fn run(
    inner: Arc<SessionInner>,
    generation: u64,
    token: CancellationToken,
    input_key: String,
    target_language: String,
) {
    let settings = &inner.settings;

    // Preflight
    let visible = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        visible = inner.prober.wait_until_visible(
            &input_key,
            settings.preflight_max_attempts,
            settings.preflight_base_delay,
        ) => visible,
    };
    if !visible {
        inner.fail(
            generation,
            OrchestrationError::PreflightTimeout {
                key: input_key,
                attempts: settings.preflight_max_attempts,
            },
        );
        return;
    }

    // Submission happens at most once per run, and never after cancellation.
    if token.is_cancelled()
        || !inner.transition(generation, SessionPhase::Submitting, |snapshot| {
            snapshot.progress_hint = Some("Submitting translation job".to_string());
        })
    {
        return;
    }

    let submitted = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        submitted = inner.submitter.submit(&input_key, &target_language) => submitted,
    };
    let mut job = match submitted {
        Ok(job) => job,
        Err(e) => {
            inner.fail(generation, e);
            return;
        }
    };
    tracing::Span::current().record("job_id", job.job_id());

    let job_id = job.job_id().to_string();
    if !inner.transition(generation, SessionPhase::Polling, |snapshot| {
        snapshot.job_id = Some(job_id.clone());
        snapshot.progress_hint = Some("Translation job submitted".to_string());
    }) {
        return;
    }

    // One budget for the whole job, including re-polls while finalizing.
    let deadline = Instant::now() + inner.poller.budget();
    let mut finalize_attempts = 0;

    loop {
        let outcome = inner
            .poller
            .watch_until(&job_id, deadline, &token, |polls, report| {
                inner.progress(
                    generation,
                    format!("Job {} (check {})", report.status, polls),
                );
            })
            .await;

        match outcome {
            PollOutcome::Succeeded => {
                job.observe_status(JobStatus::Succeeded);
            }
            PollOutcome::Failed(message) => {
                job.observe_status(JobStatus::Failed);
                inner.fail(generation, OrchestrationError::JobFailed(message));
                return;
            }
            PollOutcome::BudgetExceeded => {
                inner.fail(
                    generation,
                    OrchestrationError::PollBudgetExceeded {
                        job_id: job_id.clone(),
                        budget_secs: inner.poller.budget().as_secs(),
                    },
                );
                return;
            }
            PollOutcome::Error(e) => {
                inner.fail(generation, e);
                return;
            }
            PollOutcome::Cancelled => return,
        }

        if !inner.transition(generation, SessionPhase::Resolving, |snapshot| {
            snapshot.progress_hint = Some("Locating translated document".to_string());
        }) {
            return;
        }

        let resolution = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            resolution = inner.locator.resolve(&job) => resolution,
        };

        match resolution {
            Ok(Resolution::Found(descriptor)) => {
                finish(&inner, generation, &mut job, descriptor);
                return;
            }
            Ok(Resolution::Finalizing) => {
                finalize_attempts += 1;
                if finalize_attempts >= settings.max_finalize_attempts {
                    inner.fail(
                        generation,
                        OrchestrationError::ResolutionNotFound {
                            job_id: job_id.clone(),
                            prefix: inner.locator.output_prefix().to_string(),
                        },
                    );
                    return;
                }
                tracing::info!(finalize_attempts, "Output not locatable yet, polling again");
                if !inner.transition(generation, SessionPhase::Polling, |snapshot| {
                    snapshot.progress_hint = Some("Finalizing translated document".to_string());
                }) {
                    return;
                }
            }
            Err(e) => {
                inner.fail(generation, e);
                return;
            }
        }
    }
}

fn finish(
    inner: &SessionInner,
    generation: u64,
    job: &mut TranslationJob,
    descriptor: ResultDescriptor,
) {
    job.set_output_key(descriptor.output_key.clone());
    inner.transition(generation, SessionPhase::Done, |snapshot| {
        snapshot.progress_hint = None;
        snapshot.result = Some(descriptor);
    });
}
