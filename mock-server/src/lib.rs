//! In-memory stand-in for the objects API, plus diagnostic routes used by
//! the client's integration tests.
//!
//! # Design
//! - `/objects` mirrors the public objects API: list (optional `name`
//!   filter), create, fetch, replace, merge and delete. Missing ids answer
//!   404 with an `{"error": ...}` body.
//! - The other routes produce responses the client must classify: arbitrary
//!   statuses, scalar and non-JSON bodies, slow replies, a request echo, and
//!   a multipart sink that reports the parts it received.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewObject {
    pub name: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObjectPatch {
    pub name: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ListFilter {
    name: Option<String>,
}

/// One received multipart field, as reported by `/upload`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

pub type Db = Arc<RwLock<BTreeMap<String, Object>>>;

/// Objects every fresh server starts with.
pub fn seed() -> BTreeMap<String, Object> {
    let seeded = [
        ("1", "Google Pixel 6 Pro", json!({ "color": "Cloudy White", "capacity": "128 GB" })),
        ("2", "Apple iPhone 12 Mini, 256GB, Blue", Value::Null),
        ("3", "Apple iPhone 12 Pro Max", json!({ "color": "Cloudy White", "capacity GB": 512 })),
    ];
    seeded
        .into_iter()
        .map(|(id, name, data)| {
            let data = (!data.is_null()).then_some(data);
            let object = Object {
                id: id.to_string(),
                name: name.to_string(),
                data,
                created_at: None,
                updated_at: None,
            };
            (object.id.clone(), object)
        })
        .collect()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/objects", get(list_objects).post(create_object))
        .route(
            "/objects/{id}",
            get(get_object).put(replace_object).patch(patch_object).delete(delete_object),
        )
        .route("/status/{code}", any(status))
        .route("/echo", any(echo))
        .route("/scalar", get(scalar))
        .route("/garbage", get(garbage))
        .route("/empty", get(empty))
        .route("/slow/{ms}", any(slow))
        .route("/upload", post(upload))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Object with id={id} was not found.") })),
    )
        .into_response()
}

async fn list_objects(State(db): State<Db>, Query(filter): Query<ListFilter>) -> Json<Vec<Object>> {
    let objects = db.read().await;
    let listed = objects
        .values()
        .filter(|o| filter.name.as_ref().is_none_or(|name| &o.name == name))
        .cloned()
        .collect();
    Json(listed)
}

async fn create_object(State(db): State<Db>, Json(input): Json<NewObject>) -> Json<Object> {
    let object = Object {
        id: Uuid::new_v4().simple().to_string(),
        name: input.name,
        data: input.data,
        created_at: Some(Utc::now()),
        updated_at: None,
    };
    debug!(id = %object.id, "created object");
    db.write().await.insert(object.id.clone(), object.clone());
    Json(object)
}

async fn get_object(State(db): State<Db>, Path(id): Path<String>) -> Response {
    match db.read().await.get(&id) {
        Some(object) => Json(object.clone()).into_response(),
        None => not_found(&id),
    }
}

async fn replace_object(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<NewObject>,
) -> Response {
    let mut objects = db.write().await;
    let Some(object) = objects.get_mut(&id) else {
        return not_found(&id);
    };
    object.name = input.name;
    object.data = input.data;
    object.updated_at = Some(Utc::now());
    Json(object.clone()).into_response()
}

async fn patch_object(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<ObjectPatch>,
) -> Response {
    let mut objects = db.write().await;
    let Some(object) = objects.get_mut(&id) else {
        return not_found(&id);
    };
    if let Some(name) = input.name {
        object.name = name;
    }
    if let Some(data) = input.data {
        object.data = Some(data);
    }
    object.updated_at = Some(Utc::now());
    Json(object.clone()).into_response()
}

async fn delete_object(State(db): State<Db>, Path(id): Path<String>) -> Response {
    match db.write().await.remove(&id) {
        Some(_) => {
            Json(json!({ "message": format!("Object with id = {id} has been deleted.") })).into_response()
        }
        None => not_found(&id),
    }
}

/// Reply with the requested status and a small JSON body.
async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, Json(json!({ "status": code }))).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Echo method, query, every header (duplicates kept, in order) and body.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    let headers: Vec<Value> = headers
        .iter()
        .map(|(name, value)| json!([name.as_str(), value.to_str().unwrap_or_default()]))
        .collect();
    Json(json!({
        "method": method.as_str(),
        "query": uri.query(),
        "headers": headers,
        "body": body,
    }))
}

async fn scalar() -> Json<Value> {
    Json(json!(42))
}

async fn garbage() -> impl IntoResponse {
    (StatusCode::OK, "<html>definitely not json</html>")
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "slept": ms }))
}

/// Drain a multipart body and report its parts.
async fn upload(mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.body_text() }))).into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data: Bytes = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.body_text() }))).into_response(),
        };
        parts.push(UploadedPart { name, file_name, content_type, size: data.len() });
    }
    debug!(count = parts.len(), "received multipart upload");

    Json(json!({ "count": parts.len(), "parts": parts })).into_response()
}
