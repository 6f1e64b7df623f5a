use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub data: Value,
}

/// What `/echo` saw, returned as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub content_type: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

/// Body served by `/image`: a PNG signature fragment that is not UTF-8.
pub const IMAGE_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0xFF, 0xFE, 0x00];

/// Size of the `/large` text body, past ureq's 10 MiB default read limit.
pub const LARGE_BODY_LEN: usize = 11 * 1024 * 1024;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/json", get(json_ok))
        .route("/echo", any(echo))
        .route("/fail", post(fail_with_message).get(fail_without_message))
        .route("/text", get(plain_text))
        .route("/text/error", get(plain_text_error))
        .route("/broken", get(broken_json))
        .route("/image", get(image))
        .route("/large", get(large_text))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(replace_item).delete(delete_item))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn json_ok() -> Json<Value> {
    Json(json!({ "a": 1 }))
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let headers = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        content_type,
        headers,
        body,
    })
}

async fn fail_with_message() -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad" })))
}

async fn fail_without_message() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "something broke" })),
    )
}

async fn plain_text() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "hello")
}

async fn plain_text_error() -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, "text/plain")],
        "down for maintenance",
    )
}

async fn broken_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "{\"a\": ")
}

async fn image() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], IMAGE_BYTES)
}

async fn large_text() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "a".repeat(LARGE_BODY_LEN))
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "item not found" })))
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    let items = db.read().await;
    Json(items.values().cloned().collect())
}

async fn create_item(State(db): State<Db>, Json(data): Json<Value>) -> (StatusCode, Json<Item>) {
    let item = Item {
        id: Uuid::new_v4(),
        data,
    };
    db.write().await.insert(item.id, item.clone());
    tracing::debug!(id = %item.id, "created item");
    (StatusCode::CREATED, Json(item))
}

async fn get_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, (StatusCode, Json<Value>)> {
    let items = db.read().await;
    items.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn replace_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(data): Json<Value>,
) -> Result<Json<Item>, (StatusCode, Json<Value>)> {
    let mut items = db.write().await;
    let item = items.get_mut(&id).ok_or_else(not_found)?;
    item.data = data;
    Ok(Json(item.clone()))
}

async fn delete_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let mut items = db.write().await;
    items.remove(&id).ok_or_else(not_found)?;
    Ok(StatusCode::NO_CONTENT)
}
