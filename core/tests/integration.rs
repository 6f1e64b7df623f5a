//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `ApiClient` with the
//! default `UreqTransport` over real HTTP, and exercises `ExpiringStore` on
//! a real file.

use std::time::Duration;

use pagekit_core::{
    ApiClient, ApiError, ApiResponse, ClientConfig, ExpiringStore, FileBackend, HttpMethod,
    ManualClock, RequestOptions, UreqTransport,
};
use serde_json::{json, Value};

/// Spawn the mock server on its own runtime thread and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn get_json_endpoint() {
    let client = ApiClient::new(&start_server());
    let resp = client.get("/json", RequestOptions::default()).unwrap();
    assert_eq!(resp, ApiResponse::Json(json!({"a": 1})));
}

#[test]
fn post_failure_message_is_surfaced() {
    let client = ApiClient::new(&start_server());
    let err = client
        .post("/fail", json!({"a": 1}), RequestOptions::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "bad");
    assert_eq!(err.status(), Some(400));
}

#[test]
fn failure_without_message_is_generic() {
    let client = ApiClient::new(&start_server());
    let err = client.get("/fail", RequestOptions::default()).unwrap_err();
    assert!(matches!(err, ApiError::Request { status: 500, .. }));
    assert_eq!(err.to_string(), "request failed");
}

#[test]
fn plain_text_comes_back_raw() {
    let client = ApiClient::new(&start_server());

    let resp = client.get("/text", RequestOptions::default()).unwrap();
    let raw = resp.as_raw().expect("text/plain should not be parsed");
    assert_eq!(raw.text(), "hello");

    let resp = client.get("/text/error", RequestOptions::default()).unwrap();
    assert_eq!(resp.as_raw().map(|r| r.status), Some(503));
}

#[test]
fn binary_body_comes_back_raw() {
    let client = ApiClient::new(&start_server());
    let resp = client.get("/image", RequestOptions::default()).unwrap();
    let raw = resp.as_raw().expect("image/png should not be parsed");
    assert_eq!(raw.content_type(), Some("image/png"));
    assert_eq!(raw.body, mock_server::IMAGE_BYTES);
}

#[test]
fn body_over_ten_mebibytes_comes_back_raw() {
    let client = ApiClient::new(&start_server());
    let resp = client.get("/large", RequestOptions::default()).unwrap();
    let raw = resp.as_raw().expect("text/plain should not be parsed");
    assert_eq!(raw.body.len(), mock_server::LARGE_BODY_LEN);
}

#[test]
fn body_limit_is_configurable() {
    let transport = UreqTransport::new().with_body_limit(1024);
    let client = ApiClient::with_transport(ClientConfig::new(start_server()), transport);
    let err = client.get("/large", RequestOptions::default()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[test]
fn broken_json_is_a_parse_error() {
    let client = ApiClient::new(&start_server());
    let err = client.get("/broken", RequestOptions::default()).unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[test]
fn default_and_caller_headers_reach_the_server() {
    let client = ApiClient::new(&start_server());

    let resp = client
        .post("/echo", json!({"k": "v"}), RequestOptions::default())
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(resp["method"], "POST");
    assert_eq!(resp["content_type"], "application/json");
    let body: Value = serde_json::from_str(resp["body"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!({"k": "v"}));

    let options = RequestOptions::default()
        .with_header("Content-Type", "text/plain")
        .with_header("X-Room", "AB12CD");
    let resp = client
        .put("/echo", "plain words", options)
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(resp["method"], "PUT");
    assert_eq!(resp["content_type"], "text/plain");
    assert_eq!(resp["headers"]["x-room"], "AB12CD");
    assert_eq!(resp["body"], "plain words");
}

#[test]
fn connection_refused_is_a_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = ApiClient::new(&format!("http://127.0.0.1:{port}"));
    let err = client.get("/json", RequestOptions::default()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[test]
fn item_crud_lifecycle() {
    let client = ApiClient::new(&start_server());

    // Step 1: create.
    let created = client
        .post("/items", json!({"title": "Integration test"}), RequestOptions::default())
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(created["data"]["title"], "Integration test");
    let id = created["id"].as_str().unwrap().to_string();

    // Step 2: get.
    let fetched = client
        .get(&format!("/items/{id}"), RequestOptions::default())
        .unwrap();
    assert_eq!(fetched.as_json(), Some(&created));

    // Step 3: replace.
    let updated = client
        .put(&format!("/items/{id}"), json!({"title": "Updated"}), RequestOptions::default())
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(updated["data"]["title"], "Updated");

    // Step 4: delete returns 204 without a content type, so it comes back raw.
    let deleted = client
        .request(&format!("/items/{id}"), RequestOptions::new(HttpMethod::Delete))
        .unwrap();
    let raw = deleted.as_raw().expect("204 has no JSON body");
    assert_eq!(raw.status, 204);
    assert!(raw.body.is_empty());

    // Step 5: get after delete carries the server message.
    let err = client
        .get(&format!("/items/{id}"), RequestOptions::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "item not found");
    assert_eq!(err.status(), Some(404));
}

#[test]
fn file_store_expiry_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local-storage.json");
    let clock = ManualClock::new(1_000_000);

    {
        let mut store =
            ExpiringStore::with_clock(FileBackend::open(&path).unwrap(), clock.clone());
        store.set("session", &json!({"room": "AB12CD"}), Some(Duration::from_secs(60))).unwrap();
        store.set("theme", "dark", None).unwrap();
    }

    clock.advance(Duration::from_secs(61));

    let mut store = ExpiringStore::with_clock(FileBackend::open(&path).unwrap(), clock.clone());
    assert_eq!(store.get::<Value>("session"), None);
    assert_eq!(store.get::<String>("theme").as_deref(), Some("dark"));

    let reopened = FileBackend::open(&path).unwrap();
    assert!(!reopened.contains_key("session"));
    assert!(reopened.contains_key("theme"));
}
