//! Common test utilities and helpers

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use feedback_core::{
    api::{ApiServer, AppState},
    auth::{Authenticator, TokenSigner},
    storage::ReportStorage,
    types::{User, UserCreate},
    SqliteStorage,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Router wired to a throwaway SQLite database
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<dyn ReportStorage>,
    pub auth: Arc<Authenticator>,
    _temp_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sqlite = SqliteStorage::new(temp_dir.path().join("feedback_test.db"))
        .expect("Failed to create test storage");
    sqlite.init_schema().await.expect("Failed to apply schema");

    let storage: Arc<dyn ReportStorage> = Arc::new(sqlite);
    let auth = Arc::new(Authenticator::new(
        storage.clone(),
        TokenSigner::new("integration-test-secret", 30).expect("Failed to create token signer"),
        4,
    ));
    let router = ApiServer::build_router(AppState::new(storage.clone(), auth.clone()));

    TestApp {
        router,
        storage,
        auth,
        _temp_dir: temp_dir,
    }
}

impl TestApp {
    /// Send one request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(build(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(build(Method::POST, uri, token, Some(body))).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(build(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let form = format!("username={}&password={}", username, password);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        self.send(request).await
    }

    pub async fn create_user(&self, username: &str, password: &str, is_admin: bool) -> User {
        self.auth
            .register(&UserCreate {
                username: username.to_string(),
                password: password.to_string(),
                full_name: Some(format!("{} (test)", username)),
                is_admin,
            })
            .await
            .expect("Failed to create user")
    }

    /// Create a user and return a bearer token for it
    pub async fn token_for(&self, username: &str, is_admin: bool) -> String {
        self.create_user(username, "secret-pw", is_admin).await;
        let (status, body) = self.login(username, "secret-pw").await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["access_token"]
            .as_str()
            .expect("missing access_token")
            .to_string()
    }
}

fn build(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
