// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use taskhub_core::FixedClock;
use taskhub_server::{build_router, ApiConfig, AppState, AuthConfig};
use taskhub_store::{MemoryBlobStore, SqliteStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_with_clock(clock: Arc<FixedClock>) -> std::net::SocketAddr {
    let api = ApiConfig {
        auth: AuthConfig {
            jwt_secret: "clock-test-secret-0123456789abcdef".to_string(),
            ..AuthConfig::default()
        },
        ..ApiConfig::default()
    };
    let state = AppState::with_clock(
        api,
        Arc::new(SqliteStore::open_in_memory().expect("store")),
        Arc::new(MemoryBlobStore::default()),
        clock,
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

async fn send(addr: std::net::SocketAddr, request: Request<Body>) -> (u16, Value) {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.expect("body");
    let mut raw = format!(
        "{} {} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
        parts.method,
        parts.uri,
        body.len()
    );
    for (name, value) in &parts.headers {
        raw.push_str(&format!(
            "{}: {}\r\n",
            name,
            value.to_str().expect("ascii header")
        ));
    }
    raw.push_str("\r\n");
    let mut bytes = raw.into_bytes();
    bytes.extend_from_slice(&body);
    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    stream.write_all(&bytes).await.expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    let (head, body) = response.split_once("\r\n\r\n").expect("separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, serde_json::from_str(body).expect("json"))
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn login(addr: std::net::SocketAddr) -> String {
    let (status, body) = send(
        addr,
        json_request(
            "POST",
            "/api/login",
            None,
            &json!({"username": "alice", "password": "correct-horse"}),
        ),
    )
    .await;
    assert_eq!(status, 200);
    body["data"]["token"].as_str().expect("token").to_string()
}

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("timestamp")
}

async fn register_alice(addr: std::net::SocketAddr) -> String {
    let (status, body) = send(
        addr,
        json_request(
            "POST",
            "/api/register",
            None,
            &json!({"username": "alice", "email": "alice@example.com", "password": "correct-horse"}),
        ),
    )
    .await;
    assert_eq!(status, 201);
    body["data"]["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn tokens_expire_on_the_application_clock() {
    let clock = Arc::new(FixedClock::new(start()));
    let addr = spawn_with_clock(clock.clone()).await;
    let token = register_alice(addr).await;

    clock.advance(Duration::hours(23));
    let (status, _) = send(addr, json_request("GET", "/api/me", Some(&token), &json!({}))).await;
    assert_eq!(status, 200);

    clock.advance(Duration::hours(2));
    let (status, body) = send(addr, json_request("GET", "/api/me", Some(&token), &json!({}))).await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);

    let fresh = login(addr).await;
    let (status, _) = send(addr, json_request("GET", "/api/me", Some(&fresh), &json!({}))).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn streak_grows_daily_and_resets_after_a_missed_day() {
    let start = start();
    let clock = Arc::new(FixedClock::new(start));
    let addr = spawn_with_clock(clock.clone()).await;
    let token = register_alice(addr).await;

    let (_, task) = send(
        addr,
        json_request("POST", "/api/tasks", Some(&token), &json!({"title": "practice"})),
    )
    .await;
    let task_id = task["data"]["id"].as_i64().expect("task id");
    let progress_uri = format!("/api/tasks/{task_id}/progress");

    for (day, expected) in [(0, 1), (1, 2), (2, 3)] {
        clock.set(start + Duration::days(day) + Duration::hours(1));
        let token = login(addr).await;
        let (status, _) = send(
            addr,
            json_request("PUT", &progress_uri, Some(&token), &json!({"progress": 10 + day})),
        )
        .await;
        assert_eq!(status, 200);
        let (_, streak) = send(
            addr,
            json_request("GET", "/api/analytics/streak", Some(&token), &json!({})),
        )
        .await;
        assert_eq!(streak["data"]["current_streak"], expected, "day {day}");
    }

    clock.advance(Duration::hours(49));
    let token = login(addr).await;
    let (_, streak) = send(
        addr,
        json_request("GET", "/api/analytics/streak", Some(&token), &json!({})),
    )
    .await;
    assert_eq!(streak["data"]["current_streak"], 0);
    assert_eq!(streak["data"]["longest_streak"], 3);

    let (_, summary) = send(
        addr,
        json_request("GET", "/api/analytics/summary", Some(&token), &json!({})),
    )
    .await;
    assert_eq!(summary["data"]["current_streak"], 0);
    assert_eq!(summary["data"]["total_tasks"], 1);
}
