use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// A request as the server saw it. Header names are lower-case.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// First value recorded for `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub type Log = Arc<RwLock<Vec<RecordedRequest>>>;

pub fn app() -> Router {
    app_with_log(Log::default())
}

pub fn app_with_log(log: Log) -> Router {
    Router::new()
        .route("/status/{code}", any(status))
        .route("/delay/{millis}", any(delay))
        .route("/blob/{len}", any(blob))
        .fallback(echo)
        .with_state(log)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_log(listener: TcpListener, log: Log) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_log(log)).await
}

async fn record(log: &Log, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> RecordedRequest {
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    log.write().await.push(recorded.clone());
    recorded
}

async fn echo(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<RecordedRequest> {
    Json(record(&log, method, uri, headers, body).await)
}

async fn status(
    State(log): State<Log>,
    Path(code): Path<u16>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<RecordedRequest>) {
    let recorded = record(&log, method, uri, headers, body).await;
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(recorded))
}

async fn delay(
    State(log): State<Log>,
    Path(millis): Path<u64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<RecordedRequest> {
    let recorded = record(&log, method, uri, headers, body).await;
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(recorded)
}

/// `len` bytes cycling through 0..=255, so most of the body is not UTF-8.
pub fn blob_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

async fn blob(
    State(log): State<Log>,
    Path(len): Path<usize>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ([(header::HeaderName, &'static str); 1], Vec<u8>) {
    record(&log, method, uri, headers, body).await;
    ([(header::CONTENT_TYPE, "application/octet-stream")], blob_bytes(len))
}
