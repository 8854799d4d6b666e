//! HTTP boundary tests: the real router bound to an ephemeral port, driven over reqwest.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use toptrail_agent::{
    api::router,
    capture::{CaptureController, CaptureState},
    capture_log::CaptureLog,
    error::CollectionError,
    metrics::Sampler,
    state::AppState,
    types::{DiskStats, MemoryStats, MetricSnapshot, ProcessSample},
};

struct StaticSampler;

impl Sampler for StaticSampler {
    fn capture(&mut self) -> Result<MetricSnapshot, CollectionError> {
        Ok(snapshot(Utc::now(), &[5.0, 6.0]))
    }
}

fn snapshot(ts: chrono::DateTime<Utc>, cpu: &[f64]) -> MetricSnapshot {
    MetricSnapshot {
        timestamp: ts,
        cpu_percentages: cpu.to_vec(),
        memory: MemoryStats::default(),
        disk: DiskStats::default(),
        processes: vec![ProcessSample {
            pid: 7,
            name: "worker".into(),
            cpu_percent: 12.0,
            memory_percent: 3.0,
        }],
    }
}

async fn spawn_agent(log: CaptureLog) -> (String, AppState) {
    let controller =
        CaptureController::new(Box::new(StaticSampler), log.clone(), Duration::from_secs(3600));
    let state = AppState::new(controller, log);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn view_rejects_bad_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _) = spawn_agent(CaptureLog::new(dir.path().join("log.jsonl"))).await;

    for q in ["?duration=bogus", "", "?duration="] {
        let resp = reqwest::get(format!("{base}/view{q}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {q:?}");
        let body = resp.text().await.unwrap();
        assert!(body.to_lowercase().contains("invalid duration format"));
    }
}

#[tokio::test]
async fn view_of_empty_log_is_an_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _) = spawn_agent(CaptureLog::new(dir.path().join("log.jsonl"))).await;

    let resp = reqwest::get(format!("{base}/view?duration=1h")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn view_returns_only_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let log = CaptureLog::new(dir.path().join("log.jsonl"));
    let now = Utc::now();
    log.append(&snapshot(now - ChronoDuration::minutes(90), &[1.0]))
        .unwrap();
    log.append(&snapshot(now - ChronoDuration::minutes(5), &[2.0]))
        .unwrap();
    let (base, _) = spawn_agent(log).await;

    let got: Vec<MetricSnapshot> = reqwest::get(format!("{base}/view?duration=1h"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].cpu_percentages, vec![2.0]);
    assert_eq!(got[0].processes[0].name, "worker");
}

#[tokio::test]
async fn capture_start_stop_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let log = CaptureLog::new(dir.path().join("log.jsonl"));
    let (base, state) = spawn_agent(log.clone()).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let resp = client.post(format!("{base}/capture")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.text().await.unwrap().contains("Started"));
    }
    assert_eq!(state.controller.state().await, CaptureState::Running);
    assert_eq!(state.controller.live_loops(), 1);

    let resp = client
        .delete(format!("{base}/capture"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Stopped"));
    assert_eq!(state.controller.state().await, CaptureState::Idle);

    for _ in 0..100 {
        if state.controller.live_loops() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.controller.live_loops(), 0);
    assert!(log.query(chrono::DateTime::<Utc>::MIN_UTC).unwrap().len() <= 1);
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _) = spawn_agent(CaptureLog::new(dir.path().join("log.jsonl"))).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/capture")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let resp = client
        .put(format!("{base}/capture"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let resp = client
        .post(format!("{base}/view?duration=1h"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
