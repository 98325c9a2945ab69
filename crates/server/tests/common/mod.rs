//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router over a SQLite store in a temporary
//! directory, so requests exercise the full handler and storage stack without
//! binding a port.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use helpdesk_core::{Config, DatabaseConfig, ExportConfig, SqliteTicketStore, TicketStore};
use helpdesk_server::{api::create_router, state::AppState};

/// Test fixture wrapping an in-process router.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct handle on the store behind the router
    pub store: Arc<SqliteTicketStore>,
    /// Temporary directory for the database and export files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            export: ExportConfig {
                directory: temp_dir.path().to_path_buf(),
            },
            ..Config::default()
        };

        let store =
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));
        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn TicketStore>,
        ));

        Self {
            router: create_router(state),
            store,
            temp_dir,
        }
    }

    /// Path inside the fixture's temporary directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Create a ticket through the API and return its id.
    pub async fn create_ticket(&self, client: &str, subject: &str, priority: &str) -> i64 {
        let response = self
            .post(
                "/api/v1/tickets",
                json!({ "client": client, "subject": subject, "priority": priority }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["ticket"]["id"]
            .as_i64()
            .expect("ticket id should be an integer")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
