//! Common test utilities for integration tests.
//!
//! The router is driven in-process against an in-memory template store, so
//! no database is needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::{TemplateService, VersionPolicy};
use domain::store::InMemoryTemplateStore;
use fake::faker::lorem::en::Word;
use fake::Fake;
use serde_json::{json, Value};
use template_service_api::{
    app::create_app,
    config::{
        Config, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig, VersioningConfig,
    },
};
use tower::ServiceExt;

/// Test configuration. The database URL is never dialled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            max_body_size: 1_048_576,
        },
        database: DatabaseConfig {
            url: "postgres://unused@localhost/unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig::default(),
        versioning: VersioningConfig::default(),
    }
}

/// Router plus a handle on its store for inspection and fault injection.
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryTemplateStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(VersionPolicy::Permissive)
    }

    pub fn with_policy(policy: VersionPolicy) -> Self {
        let store = InMemoryTemplateStore::new();
        let service = TemplateService::new(Arc::new(store.clone()), policy);
        let mut config = test_config();
        config.versioning.version_policy = policy;

        Self {
            router: create_app(config, service),
            store,
        }
    }

    /// Sends one request and returns status plus parsed JSON body.
    pub async fn send(&self, request: Request<Body>) -> (axum::http::StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, parse_response_body(response).await)
    }

    /// Creates a template through the API and returns its `data` object.
    pub async fn create_template(&self, payload: Value) -> Value {
        let (status, body) = self
            .send(json_request(Method::POST, "/templates", payload))
            .await;
        assert_eq!(status, axum::http::StatusCode::CREATED, "body: {body}");
        body["data"].clone()
    }
}

/// Payload for a valid template with a unique name.
pub fn template_payload() -> Value {
    json!({
        "name": unique_template_name(),
        "subject": "Welcome {{name}}",
        "body": "Hello {{name}}, your code is {{code}}",
        "language": "en",
        "version_number": 1
    })
}

pub fn unique_template_name() -> String {
    let word: String = Word().fake();
    format!("{}-{}", word, uuid::Uuid::new_v4())
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a request with a raw, possibly malformed, JSON body.
pub fn raw_json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
