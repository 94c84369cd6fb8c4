//! Shared fixtures for HTTP-level tests: an app wired to in-memory storage
//! and a throwaway upload directory.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use board_api::config::{Config, DatabaseConfig, JwtConfig, ServerConfig, UploadConfig};
use board_api::db::{MemoryStore, Stores};
use board_api::{router, AppState};

pub const PUBLIC_URL: &str = "http://localhost:3000";
pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = tempfile::tempdir().expect("create upload dir");
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                public_url: PUBLIC_URL.to_string(),
            },
            database: DatabaseConfig::default(),
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
            },
            uploads: UploadConfig {
                dir: upload_dir.path().to_string_lossy().into_owned(),
                url_prefix: "/uploads".to_string(),
                max_files: 3,
                max_request_bytes: 5 * 1024 * 1024,
            },
        };

        let store = Arc::new(MemoryStore::new());
        let stores = Stores {
            users: store.clone(),
            posts: store.clone(),
        };

        Self {
            app: router(AppState::new(config, stores)),
            store,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, bytes.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(request).await;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send_json(json_request(
            Method::POST,
            "/api/register",
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send_json(json_request(
            Method::POST,
            "/api/login",
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
    }

    /// Registers a fresh account and returns its bearer token.
    pub async fn signed_in(&self, username: &str) -> String {
        let (status, _) = self.register(username, "password1").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(username, "password1").await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn create_post(&self, token: Option<&str>, form: MultipartForm) -> (StatusCode, Value) {
        let (content_type, body) = form.finish();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/posts")
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send_json(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub fn stored_upload_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "----board-api-test-boundary";

/// Minimal multipart/form-data encoder.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(title: &str, content: &str, category: &str) -> Self {
        Self::new()
            .text("title", title)
            .text("content", content)
            .text("type", category)
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn image(mut self, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.body)
    }
}
