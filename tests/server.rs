//! End-to-end tests for the session server against an in-process mock of
//! the parsing backend.

use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
use review_lens::config::Config;
use review_lens::server::run_server;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

fn review(name: &str, rating: u32) -> Value {
    json!({
        "customer_name": name,
        "rating": rating,
        "place": "Harbor Loft",
        "review_text": "Wonderful sunset views",
        "dates": "2024-03-05",
    })
}

/// Mock parsing backend. The uploaded file name selects the behaviour:
/// `slow.*` answers late, `bad.*` reports an error, anything else answers
/// immediately with one record per line of the file.
async fn mock_upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let body = field.text().await.unwrap_or_default();

        if name.starts_with("bad") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Could not parse spreadsheet" })),
            );
        }
        if name.starts_with("slow") {
            tokio::time::sleep(Duration::from_millis(1500)).await;
        }
        let records: Vec<Value> = body.lines().map(|line| review(line.trim(), 5)).collect();
        return (StatusCode::OK, Json(Value::Array(records)));
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No file part" })),
    )
}

async fn start_backend() -> u16 {
    let port = find_free_port();
    let app = Router::new().route("/api/upload", post(mock_upload));
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    port
}

struct Harness {
    _tmp: TempDir,
    prefs_path: PathBuf,
    base: String,
    client: reqwest::Client,
}

async fn start_session_server() -> Harness {
    let backend_port = start_backend().await;
    let port = find_free_port();
    let tmp = TempDir::new().unwrap();

    let mut cfg = Config::minimal();
    cfg.backend.url = format!("http://127.0.0.1:{}", backend_port);
    cfg.backend.timeout_secs = 10;
    cfg.server.bind = format!("127.0.0.1:{}", port);
    let prefs_path = tmp.path().join("prefs.json");
    cfg.preferences.path = prefs_path.clone();

    tokio::spawn(async move {
        run_server(&cfg).await.ok();
    });
    wait_for_server(port).await;

    Harness {
        _tmp: tmp,
        prefs_path,
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl Harness {
    async fn upload(&self, file_name: &str, contents: &str) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(contents.as_bytes().to_vec())
            .file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        self.client
            .post(format!("{}/api/upload", self.base))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    async fn event(&self, event: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/events", self.base))
            .json(&event)
            .send()
            .await
            .unwrap()
    }

    fn stored_preferences(&self) -> Value {
        let content = std::fs::read_to_string(&self.prefs_path).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    async fn view(&self) -> Value {
        self.client
            .get(format!("{}/api/view", self.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

fn customers(view: &Value) -> Vec<String> {
    view["content"]["rows"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|row| row[1].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_session_has_no_data() {
    let h = start_session_server().await;
    let view = h.view().await;
    assert_eq!(view["content"]["kind"], "no_data");
    assert_eq!(view["mode"], "table");
    assert_eq!(view["confirm_unload"], false);
}

#[tokio::test]
async fn test_upload_then_browse() {
    let h = start_session_server().await;

    let resp = h.upload("reviews.csv", "Ana\nBen\nCleo").await;
    assert_eq!(resp.status(), 200);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["loading"], false);
    assert_eq!(view["confirm_unload"], true);
    assert_eq!(view["summary"]["shown"], 3);
    assert_eq!(customers(&view), vec!["Ana", "Ben", "Cleo"]);

    let view: Value = h
        .event(json!({ "type": "search", "query": "ben" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(customers(&view), vec!["Ben"]);

    let view: Value = h
        .event(json!({ "type": "select_view", "mode": "charts" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["content"]["kind"], "chart");
    assert_eq!(view["content"]["data"]["chart"], "bar");
    assert_eq!(view["search_query"], "ben");

    let view: Value = h
        .event(json!({ "type": "select_chart", "chart": "pie" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["content"]["data"]["chart"], "pie");
    assert_eq!(view["content"]["data"]["data"][0]["label"], "Harbor Loft");
}

#[tokio::test]
async fn test_backend_error_is_shown_verbatim() {
    let h = start_session_server().await;
    let resp = h.upload("bad.xlsx", "whatever").await;
    assert_eq!(resp.status(), 200);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["error"], "Could not parse spreadsheet");
    assert_eq!(view["content"]["kind"], "no_data");
}

#[tokio::test]
async fn test_unsupported_upload_never_reaches_backend() {
    let h = start_session_server().await;
    let view: Value = h.upload("notes.txt", "Ana").await.json().await.unwrap();
    assert!(view["error"]
        .as_str()
        .unwrap()
        .starts_with("Unsupported file type"));
}

#[tokio::test]
async fn test_superseded_upload_never_overwrites() {
    let h = start_session_server().await;

    let slow = {
        let client = h.client.clone();
        let url = format!("{}/api/upload", h.base);
        tokio::spawn(async move {
            let part =
                reqwest::multipart::Part::bytes(b"Old".to_vec()).file_name("slow.csv".to_string());
            let form = reqwest::multipart::Form::new().part("file", part);
            client.post(url).multipart(form).send().await.unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;

    let fast: Value = h.upload("fast.csv", "New").await.json().await.unwrap();
    assert_eq!(customers(&fast), vec!["New"]);

    let slow: Value = slow.await.unwrap().json().await.unwrap();
    assert_eq!(customers(&slow), vec!["New"]);
    assert_eq!(customers(&h.view().await), vec!["New"]);
}

#[tokio::test]
async fn test_events_are_validated() {
    let h = start_session_server().await;

    let resp = h
        .event(json!({ "type": "upload_started", "generation": 99 }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = h.event(json!({ "type": "teleport" })).await;
    assert!(resp.status().is_client_error());

    let resp = h
        .client
        .post(format!("{}/api/upload", h.base))
        .multipart(reqwest::multipart::Form::new().text("other", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_pagination_over_http() {
    let h = start_session_server().await;
    let names: Vec<String> = (0..23).map(|i| format!("guest{:02}", i)).collect();
    let view: Value = h
        .upload("reviews.csv", &names.join("\n"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["pagination"]["total_pages"], 3);
    assert_eq!(view["pagination"]["has_previous"], false);

    let view: Value = h
        .event(json!({ "type": "go_to_page", "page": 3 }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(customers(&view), vec!["guest20", "guest21", "guest22"]);
    assert_eq!(view["pagination"]["has_next"], false);

    // Out of range: unchanged.
    let view: Value = h
        .event(json!({ "type": "go_to_page", "page": 9 }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["pagination"]["current_page"], 3);

    let view: Value = h
        .event(json!({ "type": "previous_page" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["pagination"]["current_page"], 2);
}

#[tokio::test]
async fn test_preferences_written_before_response() {
    let h = start_session_server().await;

    let resp = h
        .event(json!({ "type": "select_view", "mode": "grouped" }))
        .await;
    assert_eq!(resp.status(), 200);
    let stored = h.stored_preferences();
    assert_eq!(stored["viewMode"], "grouped");
    assert_eq!(stored["showOnlyPositiveWithSuggestion"], "false");

    let resp = h
        .event(json!({ "type": "toggle_positive_with_suggestion" }))
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(h.stored_preferences()["showOnlyPositiveWithSuggestion"], "true");

    // The session is usable again once the write has finished.
    let view = h.view().await;
    assert_eq!(view["mode"], "grouped");
}
