//! HTTP boundary tests for the aggregator router.

use chrono::Utc;
use reqwest::{redirect::Policy, StatusCode};
use toptrail::{
    api::router,
    db::Db,
    state::AppState,
    types::{ProcessInfo, ProcessMetricRow, ServerRecord},
};

async fn spawn_server() -> (String, AppState, reqwest::Client) {
    let state = AppState::new(Db::open_in_memory().unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();
    (format!("http://{addr}"), state, client)
}

fn sample(server_id: i64, pid: u32, cpu: f64, memory: f64) -> ProcessMetricRow {
    ProcessMetricRow {
        timestamp: Utc::now() - chrono::Duration::seconds(30),
        pid,
        name: format!("proc{pid}"),
        cpu,
        memory,
        server_id,
    }
}

#[tokio::test]
async fn add_server_redirects_and_lists() {
    let (base, _, client) = spawn_server().await;

    for (name, url) in [("a", "http://a"), ("b", "http://b")] {
        let resp = client
            .post(format!("{base}/add-server"))
            .form(&[("name", name), ("url", url)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/");
    }

    let servers: Vec<ServerRecord> = client
        .get(format!("{base}/servers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<_> = servers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(servers[0].id < servers[1].id);
}

#[tokio::test]
async fn add_server_requires_both_fields() {
    let (base, state, client) = spawn_server().await;

    let resp = client
        .post(format!("{base}/add-server"))
        .form(&[("name", "a"), ("url", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.text().await.unwrap().contains("Missing name or URL"));

    let resp = client
        .post(format!("{base}/add-server"))
        .form(&[("url", "http://a")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(state.registry.list().unwrap().is_empty());

    let resp = client
        .get(format!("{base}/add-server"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn top_is_scoped_to_the_requested_server() {
    let (base, state, client) = spawn_server().await;
    let a = state.registry.add("a", "http://a").unwrap();
    let b = state.registry.add("b", "http://b").unwrap();
    state
        .ranking
        .insert(&[
            sample(a.id, 1, 10.0, 5.0),
            sample(a.id, 2, 30.0, 1.0),
            sample(b.id, 3, 99.0, 99.0),
        ])
        .unwrap();

    let top: Vec<ProcessInfo> = client
        .get(format!("{base}/top?type=cpu&duration=5m&serverId={}", a.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(top.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![2, 1]);

    let top: Vec<ProcessInfo> = client
        .get(format!("{base}/top?type=memory&duration=5m&serverId={}", a.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(top.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn top_rejects_bad_parameters() {
    let (base, _, client) = spawn_server().await;

    let cases = [
        (
            "type=disk&duration=5m&serverId=1",
            "Invalid type. Must be 'cpu' or 'memory'",
        ),
        ("type=cpu&duration=bogus&serverId=1", "Invalid duration format"),
        ("type=cpu&duration=5m&serverId=abc", "Invalid serverId"),
    ];
    for (query, message) in cases {
        let resp = client
            .get(format!("{base}/top?{query}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(resp.text().await.unwrap(), message);
    }
}

#[tokio::test]
async fn top_with_no_rows_is_an_empty_array() {
    let (base, _, client) = spawn_server().await;
    let body: serde_json::Value = client
        .get(format!("{base}/top?type=cpu&duration=1h&serverId=42"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn index_serves_the_add_server_form() {
    let (base, _, client) = spawn_server().await;
    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("action=\"/add-server\""));
}
