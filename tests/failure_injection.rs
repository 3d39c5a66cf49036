//! Failure injection tests for the ride matcher.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ride_matcher::directory::{DirectoryAuth, DirectoryError, HttpLocationDirectory, LocationDirectory};
use ride_matcher::geo::Coordinate;
use ride_matcher::matching::{MatchError, MatchingEngine};
use ride_matcher::resilience::{Gate, GateConfig, GateState, ManualClock};
use serde_json::json;

mod common;

#[tokio::test]
async fn test_gate_opens_after_directory_errors() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let directory = common::start_location_service(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (503, "Service Unavailable".into())
        }
    })
    .await;

    let mut config = common::matcher_config(directory);
    config.gate.failure_threshold = 3;
    config.gate.reset_timeout_secs = 30;
    let (addr, shutdown) = common::start_matcher(config).await;
    let client = common::client();
    let url = format!("http://{}/api/v1/match", addr);
    let body = json!({ "latitude": 41.0082, "longitude": 28.9784 });

    for _ in 0..3 {
        let res = client.post(&url).json(&body).send().await.unwrap();
        assert_eq!(res.status(), 502, "directory failures pass through while closed");
    }

    let res = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(res.status(), 503, "Gate should be open after 3 failures");
    assert_eq!(res.headers()["retry-after"], "30");
    let err: serde_json::Value = res.json().await.unwrap();
    assert!(err["error"].as_str().unwrap().contains("unavailable"));

    assert_eq!(call_count.load(Ordering::SeqCst), 3, "Open gate must not reach the directory");

    shutdown.trigger();
}

#[tokio::test]
async fn test_timeout_counts_as_failure() {
    let directory = common::start_location_service(|_| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        (200, "[]".into())
    })
    .await;

    let mut config = common::matcher_config(directory);
    config.directory.timeout_ms = 50;
    config.gate.failure_threshold = 1;
    let (addr, shutdown) = common::start_matcher(config).await;
    let client = common::client();
    let url = format!("http://{}/api/v1/match", addr);
    let body = json!({ "latitude": 41.0, "longitude": 29.0 });

    let started = Instant::now();
    let res = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(res.status(), 502);
    assert!(started.elapsed() < Duration::from_millis(450), "deadline must cut the call short");

    let res = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(res.status(), 503);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_timeout_still_counts_as_failure() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let directory = common::start_location_service(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3)).await;
            (200, "[]".into())
        }
    })
    .await;

    // Request timeout fires before the directory deadline.
    let mut config = common::matcher_config(directory);
    config.timeouts.request_secs = 1;
    config.directory.timeout_ms = 5000;
    config.gate.failure_threshold = 1;
    let (addr, shutdown) = common::start_matcher(config).await;
    let client = common::client();
    let url = format!("http://{}/api/v1/match", addr);
    let body = json!({ "latitude": 41.0, "longitude": 29.0 });

    let res = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(res.status(), 408);

    for _ in 0..2 {
        let res = client.post(&url).json(&body).send().await.unwrap();
        assert_eq!(res.status(), 503, "abandoned lookup must open the gate");
    }
    assert_eq!(call_count.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_gate_recovers_after_reset_timeout() {
    let healthy = Arc::new(AtomicBool::new(false));
    let h = healthy.clone();
    let directory = common::start_location_service(move |_| {
        let h = h.clone();
        async move {
            if h.load(Ordering::SeqCst) {
                (200, json!([common::driver_json("d1", 41.01, 28.98)]).to_string())
            } else {
                (500, "boom".into())
            }
        }
    })
    .await;

    let clock = Arc::new(ManualClock::new());
    let gate = Arc::new(Gate::with_clock(
        "location-directory",
        GateConfig::new(2, Duration::from_secs(10)),
        clock.clone(),
    ));
    let client = HttpLocationDirectory::new(
        format!("http://{}", directory).parse().unwrap(),
        DirectoryAuth::None,
    )
    .unwrap();
    let engine = MatchingEngine::new(Arc::new(client), gate.clone(), Duration::from_secs(2));
    let origin = Coordinate::new(41.0, 29.0).unwrap();

    for _ in 0..2 {
        assert!(matches!(
            engine.find_nearest(origin, 5.0).await,
            Err(MatchError::DownstreamError(DirectoryError::Status(500)))
        ));
    }
    assert_eq!(gate.current_state(), GateState::Open);
    assert!(matches!(
        engine.find_nearest(origin, 5.0).await,
        Err(MatchError::DownstreamUnavailable)
    ));

    healthy.store(true, Ordering::SeqCst);
    clock.advance(Duration::from_secs(10));

    let found = engine.find_nearest(origin, 5.0).await.unwrap();
    assert_eq!(found.driver.driver_id, "d1");
    assert_eq!(gate.current_state(), GateState::Closed);
    assert_eq!(gate.snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn test_failed_trial_reopens_gate() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let directory = common::start_location_service(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (500, "still down".into())
        }
    })
    .await;

    let clock = Arc::new(ManualClock::new());
    let gate = Arc::new(Gate::with_clock(
        "location-directory",
        GateConfig::new(1, Duration::from_secs(5)),
        clock.clone(),
    ));
    let client = HttpLocationDirectory::new(
        format!("http://{}", directory).parse().unwrap(),
        DirectoryAuth::None,
    )
    .unwrap();
    let engine = MatchingEngine::new(Arc::new(client), gate.clone(), Duration::from_secs(2));
    let origin = Coordinate::new(41.0, 29.0).unwrap();

    assert!(engine.find_nearest(origin, 5.0).await.is_err());
    assert_eq!(gate.current_state(), GateState::Open);

    clock.advance(Duration::from_secs(5));
    assert!(matches!(
        engine.find_nearest(origin, 5.0).await,
        Err(MatchError::DownstreamError(_))
    ));
    assert_eq!(gate.current_state(), GateState::Open);
    assert!(matches!(
        engine.find_nearest(origin, 5.0).await,
        Err(MatchError::DownstreamUnavailable)
    ));
    assert_eq!(call_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_malformed_body_is_downstream_error() {
    let directory = common::start_location_service(|_| async { (200, "{not json".into()) }).await;

    let (addr, shutdown) = common::start_matcher(common::matcher_config(directory)).await;
    let res = common::client()
        .post(format!("http://{}/api/v1/match", addr))
        .json(&json!({ "latitude": 41.0, "longitude": 29.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_directory() {
    // Bind and drop to get a port nobody listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = HttpLocationDirectory::new(
        format!("http://{}", addr).parse().unwrap(),
        DirectoryAuth::None,
    )
    .unwrap();

    let result = client
        .find_candidates(
            Coordinate::new(41.0, 29.0).unwrap(),
            5.0,
            Instant::now() + Duration::from_secs(2),
        )
        .await;
    assert!(matches!(result, Err(DirectoryError::Transport(_))));
}
