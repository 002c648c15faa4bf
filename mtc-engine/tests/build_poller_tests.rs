//! Build poller tests: stream termination, de-duplication, sharing,
//! faulted builds, and the offline guard

mod helpers;

use futures::StreamExt;
use helpers::{Canned, MockTransport};
use mtc_common::models::{BuildJob, BuildState};
use mtc_engine::notify::SharedConnectivity;
use mtc_engine::services::BuildPoller;
use mtc_engine::{AlwaysOnline, MachineApi};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const BUILD_PATH: &str = "translation/builds/id:build01";

fn build_json(state: &str, revision: i64, percent: f64, queue_depth: i64) -> serde_json::Value {
    json!({
        "id": "build01",
        "revision": revision,
        "percentCompleted": percent,
        "message": format!("{} r{}", state, revision),
        "state": state,
        "queueDepth": queue_depth,
    })
}

fn seed_job() -> BuildJob {
    BuildJob {
        id: "build01".to_string(),
        href: None,
        engine_id: None,
        revision: 0,
        percent_completed: 0.0,
        message: "queued".to_string(),
        state: BuildState::Queued,
        queue_depth: 1,
        additional_info: None,
    }
}

fn poller(transport: Arc<MockTransport>) -> BuildPoller {
    BuildPoller::new(
        Arc::new(MachineApi::new(transport)),
        Arc::new(AlwaysOnline),
        Duration::from_millis(10),
        16,
    )
}

#[tokio::test]
async fn stream_ends_after_first_terminal_state_inclusive() {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        "GET",
        BUILD_PATH,
        vec![
            Canned::Ok(build_json("Active", 1, 0.25, 0)),
            Canned::Ok(build_json("Finishing", 2, 0.9, 0)),
            Canned::Ok(build_json("Completed", 3, 1.0, 0)),
        ],
    );
    let poller = poller(transport);

    let observations: Vec<_> = poller.watch(seed_job()).collect().await;

    let states: Vec<BuildState> = observations
        .iter()
        .map(|item| item.as_ref().unwrap().state)
        .collect();
    assert_eq!(
        states,
        vec![
            BuildState::Queued,
            BuildState::Active,
            BuildState::Finishing,
            BuildState::Completed,
        ]
    );
}

#[tokio::test]
async fn identical_consecutive_observations_collapse() {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        "GET",
        BUILD_PATH,
        vec![
            Canned::Ok(build_json("Active", 1, 0.5, 0)),
            // Same (state, queueDepth, percentCompleted) triple, new revision
            Canned::Ok(build_json("Active", 2, 0.5, 0)),
            Canned::Ok(build_json("Active", 3, 0.75, 0)),
            Canned::Ok(build_json("Completed", 4, 1.0, 0)),
        ],
    );
    let poller = poller(transport);

    let observations: Vec<_> = poller.watch(seed_job()).collect().await;

    let keys: Vec<(BuildState, f64)> = observations
        .iter()
        .map(|item| {
            let job = item.as_ref().unwrap();
            (job.state, job.percent_completed)
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            (BuildState::Queued, 0.0),
            (BuildState::Active, 0.5),
            (BuildState::Active, 0.75),
            (BuildState::Completed, 1.0),
        ]
    );
    for window in keys.windows(2) {
        assert_ne!(window[0], window[1], "consecutive duplicate emitted");
    }
}

#[tokio::test]
async fn faulted_build_errors_with_the_build_message() {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        "GET",
        BUILD_PATH,
        vec![Canned::Ok(json!({
            "id": "build01",
            "revision": 1,
            "percentCompleted": 0.1,
            "message": "broken",
            "state": "Faulted",
            "queueDepth": 0,
        }))],
    );
    let poller = poller(transport);

    let observations: Vec<_> = poller.watch(seed_job()).collect().await;

    assert!(observations[0].is_ok());
    let error = observations
        .last()
        .unwrap()
        .as_ref()
        .expect_err("faulted build must error the stream");
    assert!(error.to_string().contains("broken"), "got: {}", error);
}

#[tokio::test]
async fn missing_build_completes_the_stream() {
    let transport = Arc::new(MockTransport::new());
    transport.on("GET", BUILD_PATH, vec![Canned::Status(404, "gone")]);
    let poller = poller(transport);

    let observations: Vec<_> = poller.watch(seed_job()).collect().await;

    // Only the seeded observation; the 404 ends the stream without error
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].as_ref().unwrap().state, BuildState::Queued);
}

#[tokio::test]
async fn polling_cursor_advances_past_observed_revision() {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        "GET",
        BUILD_PATH,
        vec![
            Canned::Ok(build_json("Active", 5, 0.5, 0)),
            Canned::Ok(build_json("Completed", 6, 1.0, 0)),
        ],
    );
    let poller = poller(transport.clone());

    let _: Vec<_> = poller.watch(seed_job()).collect().await;

    let calls = transport.calls();
    // Seed revision 0 → first cursor 1; Active revision 5 → next cursor 6
    assert!(calls[0].contains("minRevision=1"), "calls: {:?}", calls);
    assert!(calls[1].contains("minRevision=6"), "calls: {:?}", calls);
}

#[tokio::test]
async fn concurrent_subscribers_share_one_polling_loop() {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        "GET",
        BUILD_PATH,
        vec![
            Canned::Ok(build_json("Active", 1, 0.5, 0)),
            Canned::Ok(build_json("Completed", 2, 1.0, 0)),
        ],
    );
    let poller = poller(transport.clone());

    let first = poller.watch(seed_job());
    let second = poller.watch(seed_job());
    assert_eq!(poller.active_watch_count(), 1);

    let (first, second) = tokio::join!(
        first.collect::<Vec<_>>(),
        second.collect::<Vec<_>>()
    );

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    // One fetch per tick in total, not per subscriber
    assert_eq!(transport.call_count_with("minRevision=1"), 1);
}

#[tokio::test]
async fn dropping_the_last_subscriber_stops_polling() {
    let transport = Arc::new(MockTransport::new());
    transport.on("GET", BUILD_PATH, vec![Canned::Ok(build_json("Active", 1, 0.5, 0))]);
    let poller = poller(transport.clone());

    let stream = poller.watch(seed_job());
    drop(stream);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(poller.active_watch_count(), 0);
}

#[tokio::test]
async fn transient_fetch_failure_retries_on_next_tick() {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        "GET",
        BUILD_PATH,
        vec![
            Canned::Network("connection reset"),
            Canned::Ok(build_json("Completed", 1, 1.0, 0)),
        ],
    );
    let poller = poller(transport);

    let observations: Vec<_> = poller.watch(seed_job()).collect().await;

    assert_eq!(
        observations.last().unwrap().as_ref().unwrap().state,
        BuildState::Completed
    );
}

#[tokio::test]
async fn offline_current_build_skips_network() {
    let transport = Arc::new(MockTransport::new());
    let poller = BuildPoller::new(
        Arc::new(MachineApi::new(transport.clone())),
        Arc::new(SharedConnectivity::new(false)),
        Duration::from_millis(10),
        16,
    );

    let current = poller.current_build("build01").await.unwrap();

    assert!(current.is_none());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn offline_watch_polls_only_after_connectivity_returns() {
    let transport = Arc::new(MockTransport::new());
    transport.on("GET", BUILD_PATH, vec![Canned::Ok(build_json("Completed", 1, 1.0, 0))]);
    let connectivity = Arc::new(SharedConnectivity::new(false));
    let poller = BuildPoller::new(
        Arc::new(MachineApi::new(transport.clone())),
        connectivity.clone(),
        Duration::from_millis(10),
        16,
    );

    let mut stream = poller.watch(seed_job());
    assert_eq!(
        stream.next().await.unwrap().unwrap().state,
        BuildState::Queued
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(transport.calls().is_empty(), "no network I/O while offline");

    connectivity.set_online(true);
    assert_eq!(
        stream.next().await.unwrap().unwrap().state,
        BuildState::Completed
    );
}

#[tokio::test]
async fn late_subscriber_gets_replay_of_latest_observation() {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        "GET",
        BUILD_PATH,
        vec![
            Canned::Ok(build_json("Active", 1, 0.5, 0)),
            Canned::Ok(build_json("Active", 2, 0.7, 0)),
            Canned::Ok(build_json("Completed", 3, 1.0, 0)),
        ],
    );
    let poller = poller(transport);

    let mut early = poller.watch(seed_job());
    // Drain the seed and the first live observation
    early.next().await;
    let first_live = early.next().await.unwrap().unwrap();
    assert_eq!(first_live.percent_completed, 0.5);

    // A subscriber attaching mid-stream starts from the latest
    // observation, not from the seed
    let late: Vec<_> = poller.watch(seed_job()).collect().await;
    let first_late = late[0].as_ref().unwrap();
    assert!(first_late.percent_completed >= 0.5);

    let remaining: Vec<_> = early.collect().await;
    assert_eq!(
        remaining.last().unwrap().as_ref().unwrap().state,
        BuildState::Completed
    );
}
