//! Test fakes shared by the orchestrator integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use transdoc_core::{SessionPhase, SessionSnapshot};
use transdoc_orchestrator::{OrchestratorSettings, TranslationSession};
use transdoc_storage::MemoryStorage;
use transdoc_translate::{
    JobDescription, JobService, JobServiceError, JobServiceResult, StartJobRequest,
};

pub const ACCOUNT: &str = "ACME";

pub fn processing() -> JobServiceResult<JobDescription> {
    Ok(description("IN_PROGRESS", None))
}

pub fn submitted() -> JobServiceResult<JobDescription> {
    Ok(description("SUBMITTED", None))
}

pub fn completed() -> JobServiceResult<JobDescription> {
    Ok(description("COMPLETED", None))
}

pub fn failed(message: &str) -> JobServiceResult<JobDescription> {
    Ok(description("FAILED", Some(message)))
}

pub fn transport_error() -> JobServiceResult<JobDescription> {
    Err(JobServiceError::Transport("connection reset by peer".to_string()))
}

fn description(status: &str, message: Option<&str>) -> JobDescription {
    JobDescription {
        status: status.to_string(),
        target_languages: vec!["de".to_string()],
        failure_message: message.map(String::from),
        // Deliberately unusable: the locator must not rely on it.
        output_location: Some("s3://elsewhere/unrelated/".to_string()),
    }
}

#[derive(Default)]
struct Script {
    job_ids: VecDeque<JobServiceResult<String>>,
    describes: HashMap<String, VecDeque<JobServiceResult<JobDescription>>>,
    last: HashMap<String, JobServiceResult<JobDescription>>,
    delays: HashMap<String, Duration>,
    requests: Vec<StartJobRequest>,
    describe_calls: HashMap<String, usize>,
}

/// Job service replaying scripted responses.
///
/// Each job replays its queue of describe responses; once the queue is empty
/// the last response repeats.
#[derive(Clone, Default)]
pub struct ScriptedJobService {
    script: Arc<Mutex<Script>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedJobService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next `start_job` call.
    pub fn on_start(&self, reply: JobServiceResult<String>) -> &Self {
        self.script.lock().unwrap().job_ids.push_back(reply);
        self
    }

    /// Queue describe responses for `job_id`.
    pub fn on_describe<I>(&self, job_id: &str, replies: I) -> &Self
    where
        I: IntoIterator<Item = JobServiceResult<JobDescription>>,
    {
        self.script
            .lock()
            .unwrap()
            .describes
            .entry(job_id.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Make every describe for `job_id` take `delay`.
    pub fn with_describe_delay(&self, job_id: &str, delay: Duration) -> &Self {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(job_id.to_string(), delay);
        self
    }

    pub fn start_calls(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<StartJobRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn describe_calls(&self, job_id: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .describe_calls
            .get(job_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobService for ScriptedJobService {
    async fn start_job(&self, request: &StartJobRequest) -> JobServiceResult<String> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script
            .job_ids
            .pop_front()
            .unwrap_or_else(|| Err(JobServiceError::Rejected("no job scripted".to_string())))
    }

    async fn describe_job(&self, job_id: &str) -> JobServiceResult<JobDescription> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (reply, delay) = {
            let mut script = self.script.lock().unwrap();
            *script.describe_calls.entry(job_id.to_string()).or_default() += 1;
            let next = script
                .describes
                .get_mut(job_id)
                .and_then(|queue| queue.pop_front());
            let reply = match next {
                Some(reply) => {
                    script.last.insert(job_id.to_string(), reply.clone());
                    reply
                }
                None => script
                    .last
                    .get(job_id)
                    .cloned()
                    .unwrap_or_else(|| Err(JobServiceError::NotFound(job_id.to_string()))),
            };
            (reply, script.delays.get(job_id).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

/// Settings with short, round timings for virtual-time tests.
pub fn fast_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        access_role_ref: "arn:aws:iam::123456789012:role/translate".to_string(),
        account_id: Some(ACCOUNT.to_string()),
        preflight_max_attempts: 5,
        preflight_base_delay: Duration::from_millis(100),
        poll_interval: Duration::from_secs(1),
        poll_budget: Duration::from_secs(60),
        request_timeout: Duration::from_secs(5),
        max_finalize_attempts: 3,
        ..Default::default()
    }
}

pub fn session_with(
    storage: &MemoryStorage,
    jobs: &ScriptedJobService,
    settings: OrchestratorSettings,
) -> TranslationSession {
    TranslationSession::new(Arc::new(storage.clone()), Arc::new(jobs.clone()), settings)
}

/// Follow `observe()` to its end and return every snapshot seen.
pub async fn observe_to_end(session: &TranslationSession) -> Vec<SessionSnapshot> {
    let stream = session.observe();
    futures::pin_mut!(stream);
    let mut seen = Vec::new();
    while let Some(snapshot) = stream.next().await {
        seen.push(snapshot);
    }
    seen
}

/// Wait (in virtual time) until the session reaches `phase`.
pub async fn wait_for_phase(session: &TranslationSession, phase: SessionPhase) -> SessionSnapshot {
    for _ in 0..10_000 {
        let snapshot = session.snapshot();
        if snapshot.phase == phase {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached {:?}, last: {:?}", phase, session.snapshot());
}
