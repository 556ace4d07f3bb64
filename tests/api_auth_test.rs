//! Login, token validation and admin-only routes

mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn test_login_success_and_me() {
    let app = spawn_app().await;
    app.create_user("alice", "pw123", false).await;

    let (status, body) = app.login("alice", "pw123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "bearer");
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["is_admin"], false);
    assert_eq!(body["data"]["is_authenticated"], true);
    assert_eq!(body["data"]["full_name"], "alice (test)");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = spawn_app().await;
    app.create_user("alice", "pw123", false).await;

    let (status, body) = app.login("alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect username or password");

    let (status, _) = app.login("nobody", "pw123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;

    for uri in [
        "/me",
        "/feedback",
        "/feedback/dashboard-summary",
        "/qa-logs",
        "/low-relevance-results",
        "/no-result/summary",
        "/onenote-sync/stats",
    ] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} should need a token", uri);
        assert!(body["detail"].is_string());
    }

    let (status, _) = app.get("/feedback", Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_another_key_rejected() {
    let app = spawn_app().await;
    app.create_user("alice", "pw123", false).await;

    let forged = feedback_core::auth::TokenSigner::new("some-other-key", 30)
        .unwrap()
        .issue("alice")
        .unwrap();
    let (status, body) = app.get("/me", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Could not validate credentials");
}

#[tokio::test]
async fn test_logout() {
    let app = spawn_app().await;
    let token = app.token_for("alice", false).await;

    let (status, body) = app.post("/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Successfully logged out");
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_admin_creates_users() {
    let app = spawn_app().await;
    let admin = app.token_for("root", true).await;

    let (status, body) = app
        .post(
            "/users",
            Some(&admin),
            json!({"username": "bob", "password": "pw", "full_name": "Bob"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["is_admin"], false);
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .post(
            "/users",
            Some(&admin),
            json!({"username": "bob", "password": "again"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already registered");

    let (status, body) = app.get("/users?limit=10", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, _) = app.login("bob", "pw").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_admin_forbidden() {
    let app = spawn_app().await;
    let token = app.token_for("alice", false).await;

    let (status, body) = app
        .post(
            "/users",
            Some(&token),
            json!({"username": "mallory", "password": "pw"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["detail"],
        "You don't have permission to access this resource."
    );

    let (status, _) = app.get("/users", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}
