// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use taskhub_server::{build_router, ApiConfig, AppState, AuthConfig};
use taskhub_store::{LocalFsBlobStore, SqliteStore};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const BOUNDARY: &str = "taskhub-test-boundary";

async fn spawn_server() -> (SocketAddr, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteStore::open(&dir.path().join("taskhub.sqlite")).expect("open store");
    let blobs = LocalFsBlobStore::new(dir.path().join("uploads"));
    let api = ApiConfig {
        auth: AuthConfig {
            jwt_secret: "integration-test-secret-0123456789".to_string(),
            ..AuthConfig::default()
        },
        ..ApiConfig::default()
    };
    let state = AppState::new(api, Arc::new(store), Arc::new(blobs));
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    (addr, dir)
}

struct Reply {
    status: u16,
    head: String,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, String)],
    body: &[u8],
) -> Reply {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
        body.len()
    );
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    let mut bytes = req.into_bytes();
    bytes.extend_from_slice(body);
    stream.write_all(&bytes).await.expect("write request");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("http response must have separator");
    let head = String::from_utf8_lossy(&response[..split]).to_string();
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    Reply {
        status,
        head,
        body: response[split + 4..].to_vec(),
    }
}

async fn call(addr: SocketAddr, method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut headers = Vec::new();
    if let Some(token) = token {
        headers.push(("Authorization", format!("Bearer {token}")));
    }
    let payload = match body {
        Some(v) => {
            headers.push(("Content-Type", "application/json".to_string()));
            serde_json::to_vec(&v).expect("encode body")
        }
        None => Vec::new(),
    };
    send_raw(addr, method, path, &headers, &payload).await
}

async fn upload(addr: SocketAddr, token: &str, task: i64, filename: &str, contents: &[u8]) -> Reply {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    let headers = [
        ("Authorization", format!("Bearer {token}")),
        (
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ),
    ];
    send_raw(addr, "POST", &format!("/api/tasks/{task}/files"), &headers, &body).await
}

/// Registers `name` and returns (user id, token).
async fn register(addr: SocketAddr, name: &str) -> (i64, String) {
    let reply = call(
        addr,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "username": name,
            "email": format!("{name}@example.com"),
            "password": "correct-horse",
            "full_name": name,
        })),
    )
    .await;
    assert_eq!(reply.status, 201, "register {name}");
    let body = reply.json();
    let id = body["data"]["user"]["id"].as_i64().expect("user id");
    let token = body["data"]["token"].as_str().expect("token").to_string();
    (id, token)
}

#[tokio::test]
async fn registration_login_and_auth_contract() {
    let (addr, _dir) = spawn_server().await;

    let health = call(addr, "GET", "/health", None, None).await;
    assert_eq!(health.status, 200);
    assert_eq!(health.json()["data"]["status"], "ok");
    assert!(health.head.to_ascii_lowercase().contains("x-request-id: req-"));

    let (id, token) = register(addr, "alice").await;
    let body = call(addr, "GET", "/api/me", Some(&token), None).await.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], id);
    assert!(body["data"].get("password_hash").is_none());

    let dup = call(
        addr,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "alice", "email": "other@example.com", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(dup.status, 409);
    assert_eq!(dup.json()["code"], "Conflict");

    let weak = call(
        addr,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "bob", "email": "bob@example.com", "password": "short"})),
    )
    .await;
    assert_eq!(weak.status, 400);

    let bad_login = call(
        addr,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": "alice", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(bad_login.status, 401);
    assert_eq!(bad_login.json()["success"], false);

    let login = call(
        addr,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": "alice", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(login.status, 200);
    assert!(login.json()["data"]["token"].as_str().is_some());

    let anonymous = call(addr, "GET", "/api/tasks", None, None).await;
    assert_eq!(anonymous.status, 401);
    assert_eq!(anonymous.json()["code"], "Unauthorized");
    let forged = call(addr, "GET", "/api/tasks", Some("not-a-token"), None).await;
    assert_eq!(forged.status, 401);

    let malformed = send_raw(
        addr,
        "POST",
        "/api/tasks",
        &[
            ("Authorization", format!("Bearer {token}")),
            ("Content-Type", "application/json".to_string()),
        ],
        b"{not json",
    )
    .await;
    assert_eq!(malformed.status, 400);
    assert_eq!(malformed.json()["code"], "ValidationFailed");

    let echoed = send_raw(addr, "GET", "/health", &[("x-request-id", "req-fixed".to_string())], b"").await;
    assert!(echoed.head.contains("req-fixed"));
}

#[tokio::test]
async fn group_invitation_progress_and_completion_scenario() {
    let (addr, _dir) = spawn_server().await;
    let (_admin_id, admin) = register(addr, "alice").await;
    let (member_id, member) = register(addr, "bob").await;

    let group = call(
        addr,
        "POST",
        "/api/groups",
        Some(&admin),
        Some(json!({"name": "launch", "user_ids": [member_id]})),
    )
    .await;
    assert_eq!(group.status, 201);
    let group_id = group.json()["data"]["id"].as_i64().expect("group id");

    let denied = call(addr, "GET", &format!("/api/groups/{group_id}/tasks"), Some(&member), None).await;
    assert_eq!(denied.status, 403);
    let denied = call(addr, "GET", &format!("/api/groups/{group_id}"), Some(&member), None).await;
    assert_eq!(denied.status, 403);

    let accept = call(
        addr,
        "POST",
        &format!("/api/groups/{group_id}/members/{member_id}/accept"),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(accept.status, 200);

    let task = call(
        addr,
        "POST",
        &format!("/api/groups/{group_id}/tasks"),
        Some(&admin),
        Some(json!({"title": "ship it", "user_ids": [member_id]})),
    )
    .await;
    assert_eq!(task.status, 201);
    let task_body = task.json();
    let task_id = task_body["data"]["id"].as_i64().expect("task id");
    assert_eq!(task_body["data"]["is_group_task"], true);
    assert_eq!(task_body["data"]["assignments"].as_array().map(Vec::len), Some(1));

    let listed = call(addr, "GET", &format!("/api/groups/{group_id}/tasks"), Some(&member), None).await;
    assert_eq!(listed.status, 200);
    assert_eq!(listed.json()["data"].as_array().map(Vec::len), Some(1));

    let progress = call(
        addr,
        "PUT",
        &format!("/api/groups/{group_id}/tasks/{task_id}/progress"),
        Some(&member),
        Some(json!({"progress": 40, "notes": "halfway-ish"})),
    )
    .await;
    assert_eq!(progress.status, 200);
    let seen = call(addr, "GET", &format!("/api/tasks/{task_id}"), Some(&member), None).await;
    assert_eq!(seen.json()["data"]["status"], "in_progress");

    let out_of_range = call(
        addr,
        "PUT",
        &format!("/api/groups/{group_id}/tasks/{task_id}/progress"),
        Some(&member),
        Some(json!({"progress": 101})),
    )
    .await;
    assert_eq!(out_of_range.status, 400);

    let member_cannot_approve = call(
        addr,
        "PUT",
        &format!("/api/groups/{group_id}/tasks/{task_id}/members/{member_id}/progress"),
        Some(&member),
        Some(json!({"progress": 100, "approved": true})),
    )
    .await;
    assert_eq!(member_cannot_approve.status, 403);

    let admin_set = call(
        addr,
        "PUT",
        &format!("/api/groups/{group_id}/tasks/{task_id}/members/{member_id}/progress"),
        Some(&admin),
        Some(json!({"progress": 100, "approved": true})),
    )
    .await;
    assert_eq!(admin_set.status, 200);
    let row = admin_set.json();
    assert_eq!(row["data"]["completed"], true);
    assert_eq!(row["data"]["approved"], true);

    let done = call(addr, "GET", &format!("/api/tasks/{task_id}"), Some(&admin), None).await;
    assert_eq!(done.json()["data"]["status"], "completed");

    let mine = call(
        addr,
        "GET",
        &format!("/api/groups/{group_id}/tasks/{task_id}/progress/me"),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(mine.json()["data"]["progress"], 100);

    let status_edit = call(
        addr,
        "PUT",
        &format!("/api/groups/{group_id}/tasks/{task_id}"),
        Some(&admin),
        Some(json!({"status": "pending"})),
    )
    .await;
    assert_eq!(status_edit.status, 400);

    let notes = call(addr, "GET", "/api/notifications", Some(&member), None).await.json();
    let kinds: Vec<&str> = notes["data"]
        .as_array()
        .expect("notifications")
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"group_invitation"));
    assert!(kinds.contains(&"task_assigned"));
    let first = notes["data"][0]["id"].as_i64().expect("notification id");
    let read = call(addr, "PUT", &format!("/api/notifications/{first}/read"), Some(&member), None).await;
    assert_eq!(read.status, 200);
    let foreign = call(addr, "DELETE", &format!("/api/notifications/{first}"), Some(&admin), None).await;
    assert_eq!(foreign.status, 404);
}

#[tokio::test]
async fn personal_progress_keeps_in_progress_when_lowered() {
    let (addr, _dir) = spawn_server().await;
    let (_, token) = register(addr, "alice").await;
    let (_, other) = register(addr, "mallory").await;
    let task = call(addr, "POST", "/api/tasks", Some(&token), Some(json!({"title": "essay"}))).await;
    assert_eq!(task.status, 201);
    let id = task.json()["data"]["id"].as_i64().expect("task id");
    assert_eq!(task.json()["data"]["status"], "pending");

    for value in [50, 30] {
        let reply = call(
            addr,
            "PUT",
            &format!("/api/tasks/{id}/progress"),
            Some(&token),
            Some(json!({"progress": value})),
        )
        .await;
        assert_eq!(reply.status, 200);
    }
    let fetched = call(addr, "GET", &format!("/api/tasks/{id}"), Some(&token), None).await.json();
    assert_eq!(fetched["data"]["status"], "in_progress");
    let progress = call(addr, "GET", &format!("/api/tasks/{id}/progress"), Some(&token), None).await.json();
    assert_eq!(progress["data"]["progress"], 30);
    assert_eq!(progress["data"]["is_completed"], false);

    let hidden = call(addr, "GET", &format!("/api/tasks/{id}"), Some(&other), None).await;
    assert_eq!(hidden.status, 404);

    let cleared = call(
        addr,
        "PUT",
        &format!("/api/tasks/{id}"),
        Some(&token),
        Some(json!({"description": null, "title": "final essay"})),
    )
    .await;
    assert_eq!(cleared.status, 200);
    assert_eq!(cleared.json()["data"]["title"], "final essay");

    let summary = call(addr, "GET", "/api/analytics/summary", Some(&token), None).await.json();
    assert_eq!(summary["data"]["total_tasks"], 1);
    assert_eq!(summary["data"]["in_progress_tasks"], 1);
    let streak = call(addr, "GET", "/api/analytics/streak", Some(&token), None).await.json();
    assert_eq!(streak["data"]["current_streak"], 1);

    let deleted = call(addr, "DELETE", &format!("/api/tasks/{id}"), Some(&token), None).await;
    assert_eq!(deleted.status, 200);
    let gone = call(addr, "GET", &format!("/api/tasks/{id}"), Some(&token), None).await;
    assert_eq!(gone.status, 404);
}

#[tokio::test]
async fn upload_quota_download_and_delete() {
    let (addr, _dir) = spawn_server().await;
    let (_, token) = register(addr, "alice").await;
    let (_, other) = register(addr, "mallory").await;
    let task = call(
        addr,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({"title": "evidence", "max_files": 3})),
    )
    .await;
    let id = task.json()["data"]["id"].as_i64().expect("task id");

    let mut file_ids = Vec::new();
    for n in 0..3 {
        let reply = upload(addr, &token, id, &format!("note-{n}.txt"), b"hello").await;
        assert_eq!(reply.status, 201, "upload {n}");
        let body = reply.json();
        assert!(body["data"].get("storage_key").is_none());
        file_ids.push(body["data"]["id"].as_i64().expect("file id"));
    }
    let fourth = upload(addr, &token, id, "note-3.txt", b"hello").await;
    assert_eq!(fourth.status, 400);
    assert_eq!(fourth.json()["code"], "QuotaExceeded");

    let foreign = upload(addr, &other, id, "x.txt", b"hi").await;
    assert_eq!(foreign.status, 404);
    let foreign_list = call(addr, "GET", &format!("/api/tasks/{id}/files"), Some(&other), None).await;
    assert_eq!(foreign_list.status, 404);
    let foreign_read = call(addr, "GET", &format!("/api/files/{}", file_ids[0]), Some(&other), None).await;
    assert_eq!(foreign_read.status, 404);

    let download = call(addr, "GET", &format!("/api/files/{}", file_ids[0]), Some(&token), None).await;
    assert_eq!(download.status, 200);
    assert_eq!(download.body, b"hello");
    assert!(download.head.to_ascii_lowercase().contains("content-type: text/plain"));

    let listed = call(addr, "GET", &format!("/api/tasks/{id}/files"), Some(&token), None).await.json();
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(3));

    let denied = call(addr, "DELETE", &format!("/api/files/{}", file_ids[0]), Some(&other), None).await;
    assert_eq!(denied.status, 404);
    let removed = call(addr, "DELETE", &format!("/api/files/{}", file_ids[0]), Some(&token), None).await;
    assert_eq!(removed.status, 200);
    let again = upload(addr, &token, id, "note-4.txt", b"again").await;
    assert_eq!(again.status, 201);

    let missing_field = send_raw(
        addr,
        "POST",
        &format!("/api/tasks/{id}/files"),
        &[
            ("Authorization", format!("Bearer {token}")),
            (
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ),
        ],
        format!("--{BOUNDARY}--\r\n").as_bytes(),
    )
    .await;
    assert_eq!(missing_field.status, 400);
}

#[tokio::test]
async fn group_file_approval_and_member_file_listing() {
    let (addr, _dir) = spawn_server().await;
    let (_, admin) = register(addr, "alice").await;
    let (member_id, member) = register(addr, "bob").await;
    let group_id = call(
        addr,
        "POST",
        "/api/groups",
        Some(&admin),
        Some(json!({"name": "review", "user_ids": [member_id]})),
    )
    .await
    .json()["data"]["id"]
        .as_i64()
        .expect("group id");
    call(
        addr,
        "POST",
        &format!("/api/groups/{group_id}/members/{member_id}/accept"),
        Some(&member),
        None,
    )
    .await;
    let task_id = call(
        addr,
        "POST",
        &format!("/api/groups/{group_id}/tasks"),
        Some(&admin),
        Some(json!({"title": "submit proof", "allowed_types": "txt"})),
    )
    .await
    .json()["data"]["id"]
        .as_i64()
        .expect("task id");

    let file = upload(addr, &member, task_id, "proof.txt", b"proof").await;
    assert_eq!(file.status, 201);
    let file_id = file.json()["data"]["id"].as_i64().expect("file id");

    let by_member = call(
        addr,
        "GET",
        &format!("/api/groups/{group_id}/tasks/{task_id}/files?user_id={member_id}"),
        Some(&admin),
        None,
    )
    .await
    .json();
    assert_eq!(by_member["data"].as_array().map(Vec::len), Some(1));

    for _ in 0..2 {
        let approved = call(
            addr,
            "POST",
            &format!("/api/groups/{group_id}/files/{file_id}/approve"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(approved.status, 200);
        assert_eq!(approved.json()["data"]["approved"], true);
    }
    let by_member = call(
        addr,
        "POST",
        &format!("/api/groups/{group_id}/files/{file_id}/approve"),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(by_member.status, 403);

    let notes = call(addr, "GET", "/api/notifications", Some(&admin), None).await.json();
    assert!(notes["data"]
        .as_array()
        .expect("notifications")
        .iter()
        .any(|n| n["kind"] == "file_uploaded"));

    let deleted = call(addr, "DELETE", &format!("/api/groups/{group_id}"), Some(&admin), None).await;
    assert_eq!(deleted.status, 200);
    let gone = call(addr, "GET", &format!("/api/files/{file_id}"), Some(&member), None).await;
    assert_eq!(gone.status, 404);
}

#[tokio::test]
async fn openapi_lists_every_route() {
    let (addr, _dir) = spawn_server().await;
    let reply = call(addr, "GET", "/api/openapi.json", None, None).await;
    assert_eq!(reply.status, 200);
    let spec = reply.json();
    assert!(spec["paths"]["/api/groups/{id}/files/{file_id}/approve"].is_object());
}
