//! Load testing for the ride matcher.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_load_performance() {
    // 1. Setup mock location service
    let drivers = json!([
        common::driver_json("d1", 41.02, 28.99),
        common::driver_json("d2", 41.009, 28.979),
        common::driver_json("d3", 41.05, 29.05),
    ])
    .to_string();
    let directory = common::start_location_service(move |_| {
        let drivers = drivers.clone();
        async move { (200, drivers) }
    })
    .await;

    // 2. Start matcher
    let (addr, shutdown) = common::start_matcher(common::matcher_config(directory)).await;

    // 3. Fire concurrent match requests
    let client = common::client();
    let url = format!("http://{}/api/v1/match", addr);
    let num_requests = 500;
    let concurrency = 50;
    let start = Instant::now();
    let mut handles = Vec::new();

    for _ in 0..concurrency {
        let client = client.clone();
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            let mut ok = 0;
            for _ in 0..(num_requests / concurrency) {
                let res = client
                    .post(&url)
                    .json(&json!({ "latitude": 41.0082, "longitude": 28.9784 }))
                    .send()
                    .await;
                if let Ok(res) = res {
                    if res.status() == 200 {
                        let body: Value = res.json().await.unwrap();
                        assert_eq!(body["driver"]["driver_id"], "d2");
                        ok += 1;
                    }
                }
            }
            ok
        }));
    }

    let mut success_count = 0;
    for handle in handles {
        success_count += handle.await.unwrap();
    }

    let duration = start.elapsed();
    let rps = num_requests as f64 / duration.as_secs_f64();

    println!("Load test results:");
    println!("  Total requests: {}", num_requests);
    println!("  Successful: {}", success_count);
    println!("  Duration: {:?}", duration);
    println!("  RPS: {:.2}", rps);

    assert_eq!(success_count, num_requests);

    shutdown.trigger();
}

#[tokio::test]
async fn test_open_gate_sheds_load() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let directory = common::start_location_service(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            (503, "overloaded".into())
        }
    })
    .await;

    let mut config = common::matcher_config(directory);
    config.gate.failure_threshold = 5;
    config.gate.reset_timeout_secs = 60;
    let (addr, shutdown) = common::start_matcher(config).await;

    let client = common::client();
    let url = format!("http://{}/api/v1/match", addr);
    let body = json!({ "latitude": 41.0, "longitude": 29.0 });

    for _ in 0..5 {
        let res = client.post(&url).json(&body).send().await.unwrap();
        assert_eq!(res.status(), 502);
    }

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..100 {
        let client = client.clone();
        let url = url.clone();
        let body = body.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map(|r| r.status().as_u16())
                .unwrap_or(0)
        }));
    }

    let mut shed = 0;
    for handle in handles {
        if handle.await.unwrap() == 503 {
            shed += 1;
        }
    }
    println!("Shed 100 requests in {:?}", start.elapsed());

    assert_eq!(shed, 100);
    assert_eq!(call_count.load(Ordering::SeqCst), 5);

    shutdown.trigger();
}
