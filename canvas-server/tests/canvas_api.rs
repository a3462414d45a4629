//! End-to-end router tests against the in-memory store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use canvas_server::connection::{
    ConnectionError, ConnectionManager, Connector, MemoryConnector, StoreHandle,
};
use canvas_server::db::MemoryCanvasStore;
use canvas_server::{build_router, AppState, ConnectionState, ServerConfig};

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    store: Arc<MemoryCanvasStore>,
}

/// Route server logs through the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryCanvasStore::new());
        let connector = Arc::new(MemoryConnector::with_store(store.clone()));
        Self::with_connector(connector, store)
    }

    fn with_connector(connector: Arc<dyn Connector>, store: Arc<MemoryCanvasStore>) -> Self {
        init_tracing();
        let manager = ConnectionManager::new(connector, Duration::from_secs(3));
        let state = Arc::new(AppState::new(manager));
        let router = build_router(state.clone(), &ServerConfig::default()).unwrap();
        Self {
            router,
            state,
            store,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, bytes) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let (status, bytes) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, String::from_utf8(bytes).unwrap())
    }

    async fn post_raw(&self, body: &str) -> (StatusCode, Value) {
        let (status, bytes) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/canvas")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn upsert(&self, email: &str, name: &str, data: Value) -> (StatusCode, Value) {
        let body = json!({
            "email": email,
            "drawingName": name,
            "canvasData": data
        });
        self.post_raw(&body.to_string()).await
    }
}

/// Connector that never reaches the database
#[derive(Default)]
struct UnreachableConnector {
    calls: AtomicUsize,
}

#[async_trait]
impl Connector for UnreachableConnector {
    async fn connect(&self) -> Result<StoreHandle, ConnectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ConnectionError::Failed("no reachable servers".into()))
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

#[tokio::test]
async fn upsert_then_fetch_round_trip() {
    let app = TestApp::new();

    let (status, body) = app.upsert("a@b.com", "sketch1", json!({"shapes": []})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Canvas created");
    assert_eq!(body["canvas"]["drawingName"], "sketch1");
    assert_eq!(body["canvas"]["email"], "a@b.com");
    assert!(body["canvas"]["createdAt"].is_string());

    let (status, body) = app.get_json("/canvas/a@b.com/sketch1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"shapes": []}));
}

#[tokio::test]
async fn second_upsert_updates_in_place() {
    let app = TestApp::new();

    let (_, first) = app.upsert("a@b.com", "sketch1", json!({"v": 1})).await;
    let (status, second) = app.upsert("a@b.com", "sketch1", json!({"v": 2})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message"], "Canvas updated");
    assert_eq!(second["canvas"]["id"], first["canvas"]["id"]);
    assert_eq!(second["canvas"]["createdAt"], first["canvas"]["createdAt"]);
    assert_eq!(app.store.len().await, 1);

    let (_, data) = app.get_json("/canvas/a@b.com/sketch1").await;
    assert_eq!(data, json!({"v": 2}));
}

#[tokio::test]
async fn name_taken_by_other_owner_is_overwritten() {
    let app = TestApp::new();

    app.upsert("alice@example.com", "shared", json!({"by": "alice"}))
        .await;
    let (status, body) = app
        .upsert("bob@example.com", "shared", json!({"by": "bob"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canvas"]["email"], "bob@example.com");
    assert_eq!(app.store.len().await, 1);

    let (status, _) = app.get_json("/canvas/alice@example.com/shared").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, data) = app.get_json("/canvas/bob@example.com/shared").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data, json!({"by": "bob"}));
}

#[tokio::test]
async fn malformed_email_is_rejected_without_side_effects() {
    let app = TestApp::new();

    let (status, body) = app.upsert("not-an-email", "sketch1", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email: Invalid email format");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn missing_fields_and_bad_json_are_400() {
    let app = TestApp::new();

    let (status, body) = app
        .post_raw(r#"{"email": "a@b.com", "drawingName": "x"}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "canvasData is required");

    let (status, _) = app.post_raw(r#"{"email": "a@b.com", "#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post_raw(r#"{"email": "a@b.com", "drawingName": "", "canvasData": {}}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "drawingName cannot be empty");

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn whitespace_name_is_a_valid_name() {
    let app = TestApp::new();

    let (status, body) = app.upsert("a@b.com", "   ", json!({"v": 1})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["canvas"]["drawingName"], "   ");

    let (status, data) = app.get_json("/canvas/a@b.com/%20%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data, json!({"v": 1}));
}

#[tokio::test]
async fn long_names_and_emails_are_accepted() {
    let app = TestApp::new();
    let name = "n".repeat(300);
    let email = format!("{}@b.com", "a".repeat(250));

    let (status, body) = app.upsert(&email, &name, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["canvas"]["drawingName"], name.as_str());

    let (status, _) = app.get_json(&format!("/canvas/{}/{}", email, name)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn canvas_data_keeps_client_key_order() {
    let app = TestApp::new();

    let (status, body) = app
        .post_raw(r#"{"email": "a@b.com", "drawingName": "ordered", "canvasData": {"z": 1, "a": 2}}"#)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["canvas"]["canvasData"].to_string(), r#"{"z":1,"a":2}"#);

    let (status, text) = app.get_text("/canvas/a@b.com/ordered").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, r#"{"z":1,"a":2}"#);
}

#[tokio::test]
async fn oversized_body_is_413() {
    let app = TestApp::new();
    let big = format!(
        r#"{{"email": "a@b.com", "drawingName": "big", "canvasData": "{}"}}"#,
        "x".repeat(3 * 1024 * 1024)
    );

    let (status, body) = app.post_raw(&big).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["message"], "Canvas too large");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn list_is_newest_first_and_projected() {
    let app = TestApp::new();
    for name in ["first", "second", "third"] {
        app.upsert("a@b.com", name, json!({"name": name})).await;
    }
    app.upsert("other@b.com", "elsewhere", json!({})).await;

    let (status, body) = app.get_json("/canvas/a@b.com").await;
    assert_eq!(status, StatusCode::OK);

    let items = body.as_array().unwrap();
    let names: Vec<&str> = items
        .iter()
        .map(|i| i["drawingName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);

    for item in items {
        let keys: Vec<&String> = item.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(item["createdAt"].is_string());
    }
}

#[tokio::test]
async fn list_for_unknown_owner_is_empty_200() {
    let app = TestApp::new();

    let (status, body) = app.get_json("/canvas/nobody@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn fetch_missing_pair_is_404() {
    let app = TestApp::new();
    app.upsert("a@b.com", "sketch1", json!({})).await;

    let (status, body) = app.get_json("/canvas/a@b.com/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Canvas not found");

    let (status, _) = app.get_json("/canvas/x@y.com/sketch1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_failures_map_to_400_on_write_and_500_on_read() {
    let app = TestApp::new();
    app.upsert("a@b.com", "sketch1", json!({})).await;
    app.store.set_offline(true);

    let (status, body) = app.upsert("a@b.com", "sketch2", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Failed to save canvas");

    let (status, body) = app.get_json("/canvas/a@b.com").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to list canvases");

    let (status, _) = app.get_json("/canvas/a@b.com/sketch1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unreachable_database_short_circuits_with_500() {
    let connector = Arc::new(UnreachableConnector::default());
    let store = Arc::new(MemoryCanvasStore::new());
    let app = TestApp::with_connector(connector.clone(), store.clone());

    let (status, body) = app.upsert("a@b.com", "sketch1", json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Database connection failed");
    assert!(store.is_empty().await);

    // Each request retries the connection.
    let (status, _) = app.get_json("/canvas/a@b.com").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn liveness_reflects_state_without_connecting() {
    let app = TestApp::new();

    let (status, text) = app.get_text("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Connection pending");
    let (_, text) = app.get_text("/").await;
    assert_eq!(text, "Connection pending");

    assert_eq!(app.state.connections.attempts(), 0);
    assert_eq!(app.state.connections.state(), ConnectionState::Disconnected);

    // Any canvas route connects through the guard.
    app.get_json("/canvas/a@b.com").await;

    let (_, text) = app.get_text("/").await;
    assert_eq!(text, "API connected to database");
}

#[tokio::test]
async fn health_endpoint_reports_state() {
    let app = TestApp::new();

    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"]["state"], "disconnected");

    app.state.connections.acquire().await.unwrap();

    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["backend"], "memory");
}

#[tokio::test]
async fn unknown_routes_do_not_connect() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.connections.attempts(), 0);
}
