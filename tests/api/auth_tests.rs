//! Authentication and Authorization API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{TestApp, COOKIE_NAME, PASSWORD};

#[tokio::test]
async fn test_register_returns_created_user() {
    let app = TestApp::new();

    let response = app.register("alice").await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"]["id"].is_string());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username_fails() {
    // Arrange
    let app = TestApp::new();
    app.register("alice").await.assert_status(StatusCode::CREATED);

    // Act
    let response = app
        .server
        .post("/api/users")
        .json(&json!({
            "username": "alice",
            "email": "alice2@example.com",
            "password": PASSWORD,
        }))
        .await;

    // Assert
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "This username is already taken.");
}

#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/users")
        .json(&json!({
            "username": "bob",
            "email": "not-an-email",
            "password": PASSWORD,
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "Invalid email format");
}

#[tokio::test]
async fn test_malformed_body_renders_envelope() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/users/login")
        .json(&json!({ "username": 5 }))
        .await;

    assert!(response.status_code().is_client_error());
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_returns_user_id_token_and_cookie() {
    let app = TestApp::new();
    let registered: Value = app.register("alice").await.json();

    let response = app.login("alice", PASSWORD).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["userId"], registered["user"]["id"]);
    assert_eq!(body["tokenType"], "Bearer");
    assert!(!body["token"].as_str().unwrap().is_empty());

    let cookie = response.cookie(COOKIE_NAME);
    assert_eq!(cookie.http_only(), Some(true));
    assert!(!cookie.value().is_empty());
}

#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let app = TestApp::new();
    app.register("alice").await;

    let response = app.login("alice", "wrong-password").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "Invalid username or password.");
}

#[tokio::test]
async fn test_login_with_unknown_user_fails() {
    let app = TestApp::new();

    app.login("nobody", PASSWORD)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = TestApp::new();
    app.register("alice").await;
    let login = app.login("alice", PASSWORD).await;
    let cookie = login.cookie(COOKIE_NAME);

    let response = app
        .server
        .get("/api/users/get_profile")
        .add_cookie(cookie)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["profile"]["user"]["username"], "alice");
    assert_eq!(body["profile"]["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let app = TestApp::new();
    app.register("alice").await;
    let cookie = app.login("alice", PASSWORD).await.cookie(COOKIE_NAME);

    app.server
        .post("/api/users/logout")
        .add_cookie(cookie.clone())
        .await
        .assert_status_ok();

    let response = app
        .server
        .get("/api/users/get_profile")
        .add_cookie(cookie)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "You are not logged in.");
}

#[tokio::test]
async fn test_invalid_bearer_token_is_rejected() {
    let app = TestApp::new();

    app.server
        .get("/api/tweets/get_tweets_feed")
        .authorization_bearer("not-a-jwt")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_feed_is_unauthorized() {
    let app = TestApp::new();

    let response = app.server.get("/api/tweets/get_tweets_feed").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "You are not logged in.");
}

#[tokio::test]
async fn test_list_users_requires_admin() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let root = app.signup_admin("root").await;

    let forbidden = app
        .server
        .get("/api/users")
        .authorization_bearer(&alice.token)
        .await;
    forbidden.assert_status(StatusCode::FORBIDDEN);
    let body: Value = forbidden.json();
    assert_eq!(body["errorMessage"], "You are not allowed to do that.");

    let allowed = app
        .server
        .get("/api/users")
        .authorization_bearer(&root.token)
        .await;
    allowed.assert_status_ok();
    let body: Value = allowed.json();
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_user_cannot_edit_someone_else() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let response = app
        .server
        .put(&format!("/api/users/{}", bob.id))
        .authorization_bearer(&alice.token)
        .json(&json!({ "username": "bobby", "email": "bob@example.com" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_edits_own_profile() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let response = app
        .server
        .put(&format!("/api/users/{}", alice.id))
        .authorization_bearer(&alice.token)
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "bio": "hello",
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["bio"], "hello");
}

#[tokio::test]
async fn test_get_user_hides_email_from_others() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let body: Value = app
        .server
        .get(&format!("/api/users/{}", alice.id))
        .authorization_bearer(&bob.token)
        .await
        .json();

    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("email").is_none());
}

#[tokio::test]
async fn test_delete_own_account() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    app.server
        .delete(&format!("/api/users/{}", alice.id))
        .authorization_bearer(&alice.token)
        .await
        .assert_status_ok();

    app.server
        .get(&format!("/api/users/{}", alice.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_account_session_no_longer_authenticates() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let cookie = app.login("alice", PASSWORD).await.cookie(COOKIE_NAME);

    app.server
        .delete(&format!("/api/users/{}", alice.id))
        .add_cookie(cookie.clone())
        .await
        .assert_status_ok();

    let response = app
        .server
        .post("/api/tweets")
        .add_cookie(cookie)
        .json(&json!({ "content": "still here?" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "You are not logged in.");

    app.server
        .post("/api/tweets")
        .authorization_bearer(&alice.token)
        .json(&json!({ "content": "still here?" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let tweets: Value = app.server.get("/api/tweets").await.json();
    assert_eq!(tweets["tweets"].as_array().unwrap().len(), 0);
}
