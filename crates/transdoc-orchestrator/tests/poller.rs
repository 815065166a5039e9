mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use transdoc_core::JobStatus;
use transdoc_orchestrator::{OrchestrationError, OrchestratorSettings, PollOutcome, StatusPoller};
use transdoc_translate::{JobDescription, JobServiceError};

fn poller(jobs: &ScriptedJobService, settings: &OrchestratorSettings) -> StatusPoller {
    StatusPoller::new(Arc::new(jobs.clone()), settings)
}

#[tokio::test]
async fn poll_maps_remote_status() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [submitted(), processing(), completed()]);
    let poller = poller(&jobs, &fast_settings());

    let statuses = [
        poller.poll("J1").await.unwrap().status,
        poller.poll("J1").await.unwrap().status,
        poller.poll("J1").await.unwrap().status,
    ];
    assert_eq!(
        statuses,
        [JobStatus::Submitted, JobStatus::Processing, JobStatus::Succeeded]
    );

    // Polling a finished job again is harmless and reports the same thing.
    let again = poller.poll("J1").await.unwrap();
    assert_eq!(again.status, JobStatus::Succeeded);
    assert_eq!(again.remote_status, "COMPLETED");
}

#[tokio::test]
async fn unrecognized_status_is_processing() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe(
        "J1",
        [Ok(JobDescription {
            status: "STOP_REQUESTED_SOON".to_string(),
            ..Default::default()
        })],
    );
    let report = poller(&jobs, &fast_settings()).poll("J1").await.unwrap();
    assert_eq!(report.status, JobStatus::Processing);
    assert_eq!(report.remote_status, "STOP_REQUESTED_SOON");
}

#[tokio::test]
async fn failure_without_message_gets_one() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe(
        "J1",
        [Ok(JobDescription {
            status: "COMPLETED_WITH_ERROR".to_string(),
            ..Default::default()
        })],
    );
    let report = poller(&jobs, &fast_settings()).poll("J1").await.unwrap();
    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(
        report.failure_message.as_deref(),
        Some("Translation job ended with status COMPLETED_WITH_ERROR")
    );
}

#[tokio::test(start_paused = true)]
async fn slow_describe_times_out_as_transport_error() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [completed()]);
    jobs.with_describe_delay("J1", Duration::from_secs(30));

    let err = poller(&jobs, &fast_settings()).poll("J1").await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(
        err,
        OrchestrationError::PollTransport(JobServiceError::Transport(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn watch_reports_exactly_one_terminal_outcome() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [processing(), processing(), completed()]);
    let poller = poller(&jobs, &fast_settings());

    let token = CancellationToken::new();
    assert_eq!(poller.watch("J1", &token).await, PollOutcome::Succeeded);
    assert_eq!(jobs.describe_calls("J1"), 3);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(jobs.describe_calls("J1"), 3);
}

#[tokio::test(start_paused = true)]
async fn watch_reports_remote_failure_verbatim() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [failed("Input file is password protected")]);
    let token = CancellationToken::new();
    let outcome = poller(&jobs, &fast_settings()).watch("J1", &token).await;
    assert_eq!(
        outcome,
        PollOutcome::Failed("Input file is password protected".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn watch_respects_budget() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [processing()]);
    let settings = OrchestratorSettings {
        poll_budget: Duration::from_secs(5),
        ..fast_settings()
    };
    let token = CancellationToken::new();
    let outcome = poller(&jobs, &settings).watch("J1", &token).await;
    assert_eq!(outcome, PollOutcome::BudgetExceeded);
    assert_eq!(jobs.describe_calls("J1"), 4);
}

#[tokio::test(start_paused = true)]
async fn never_more_than_one_poll_in_flight() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [processing(), processing(), processing(), completed()]);
    // Each answer takes longer than the poll interval.
    jobs.with_describe_delay("J1", Duration::from_millis(2500));
    let poller = poller(&jobs, &fast_settings());

    let token = CancellationToken::new();
    assert_eq!(poller.watch("J1", &token).await, PollOutcome::Succeeded);
    assert_eq!(jobs.describe_calls("J1"), 4);
    assert_eq!(jobs.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn spawned_watch_calls_back_once() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [processing(), failed("Quota exhausted")]);
    let poller = poller(&jobs, &fast_settings());

    let (tx, rx) = oneshot::channel();
    let handle = poller.spawn_watch(
        "J1",
        Duration::from_secs(1),
        move |status, message| {
            let _ = tx.send((status, message));
        },
        |e| panic!("unexpected poll error: {e}"),
    );

    let (status, message) = rx.await.unwrap();
    assert_eq!(status, JobStatus::Failed);
    assert_eq!(message.as_deref(), Some("Quota exhausted"));

    // Cancelling after the end is harmless.
    handle.cancel();
    handle.cancel();
    assert!(handle.is_cancelled());
    assert_eq!(jobs.describe_calls("J1"), 2);
}

#[tokio::test(start_paused = true)]
async fn cancelled_watch_stops_polling_without_callbacks() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [processing()]);
    let poller = poller(&jobs, &fast_settings());

    let (tx, mut rx) = oneshot::channel::<()>();
    let handle = poller.spawn_watch(
        "J1",
        Duration::from_secs(1),
        move |_, _| {
            let _ = tx.send(());
        },
        |e| panic!("unexpected poll error: {e}"),
    );

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(jobs.describe_calls("J1"), 3);

    handle.cancel();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(jobs.describe_calls("J1"), 3);
    // The terminal callback was dropped unused.
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn spawned_watch_reports_permanent_errors() {
    let jobs = ScriptedJobService::new();
    let poller = poller(&jobs, &fast_settings());

    let (tx, rx) = oneshot::channel();
    poller.spawn_watch(
        "missing",
        Duration::from_secs(1),
        |_, _| panic!("no terminal status expected"),
        move |e| {
            let _ = tx.send(e);
        },
    );

    let err = rx.await.unwrap();
    assert!(matches!(
        err,
        OrchestrationError::PollTransport(JobServiceError::NotFound(_))
    ));
    assert!(!err.is_transient());
}

#[tokio::test(start_paused = true)]
async fn spawned_watch_uses_given_interval() {
    let jobs = ScriptedJobService::new();
    jobs.on_describe("J1", [processing()]);
    // Configured interval is 1s; the watch is asked for 4s.
    let poller = poller(&jobs, &fast_settings());

    let handle = poller.spawn_watch(
        "J1",
        Duration::from_secs(4),
        |_, _| panic!("no terminal status expected"),
        |e| panic!("unexpected poll error: {e}"),
    );

    tokio::time::sleep(Duration::from_millis(8500)).await;
    assert_eq!(jobs.describe_calls("J1"), 2);
    handle.cancel();
}
