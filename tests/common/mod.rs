#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use tradelog::adapters::fs_blob_store::FsBlobStore;
use tradelog::adapters::sqlite_store::SqliteStore;
use tradelog::adapters::web::{build_router, AppState, SessionGate};

pub const TEST_SECRET: &str = "integration-test-secret";
const MULTIPART_BOUNDARY: &str = "----tradelog-test-boundary";

/// A full application wired against an in-memory store and a temp
/// upload directory. The directory handle must outlive the router.
pub struct TestApp {
    router: Router,
    _uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();

        let uploads = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(uploads.path()).unwrap();

        let state = Arc::new(AppState {
            store: Arc::new(store),
            blobs: Arc::new(blobs),
            gate: SessionGate::new(TEST_SECRET, 3600),
            uploads_dir: uploads.path().to_path_buf(),
        });

        Self {
            router: build_router(state),
            _uploads: uploads,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Raw variant for responses that are not JSON (static file serving).
    pub async fn request_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    /// Register a user and return `(access_token, user_id)`.
    pub async fn register(&self, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .request(json_request(
                Method::POST,
                "/auth/register",
                None,
                &json!({
                    "email": email,
                    "password": password,
                    "full_name": "Test Trader",
                    "balance": "10000",
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let token = body["access_token"].as_str().unwrap().to_string();
        let user_id = body["user"]["id"].as_str().unwrap().to_string();
        (token, user_id)
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn bare_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Build a single-file multipart upload request by hand.
pub fn upload_request(token: &str, field: &str, mime: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"chart\"\r\n\
             Content-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A token whose expiry is already in the past, signed with the app's
/// own secret.
pub fn expired_token(user_id: &str) -> String {
    SessionGate::new(TEST_SECRET, -60).issue(user_id).unwrap()
}

pub fn trade_body() -> Value {
    json!({
        "date": "2024-03-01",
        "pair": "EUR/USD",
        "trade_type": "Long",
        "entry_price": "1.0850",
        "quantity": "10000",
    })
}
