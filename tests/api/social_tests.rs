//! Follow / Like / Retweet API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{TestApp, PASSWORD};

#[tokio::test]
async fn test_follow_toggles_on_then_off() {
    // Arrange: alice registers, logs in and follows bob
    let app = TestApp::new();
    let bob = app.signup("bob").await;
    app.register("alice").await.assert_status(StatusCode::CREATED);
    app.register("alice")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let login: Value = app.login("alice", PASSWORD).await.json();
    let token = login["token"].as_str().unwrap().to_owned();

    // Act
    let first: Value = app
        .server
        .post("/api/follows/follow_user")
        .authorization_bearer(&token)
        .json(&json!({ "userId": bob.id }))
        .await
        .json();
    let second: Value = app
        .server
        .post("/api/follows/follow_user")
        .authorization_bearer(&token)
        .json(&json!({ "userId": bob.id }))
        .await
        .json();

    // Assert
    assert_eq!(first, json!({ "success": true, "state": "present", "active": true }));
    assert_eq!(second, json!({ "success": true, "state": "absent", "active": false }));

    let follows: Value = app.server.get("/api/follows").await.json();
    assert_eq!(follows["edges"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_follow_accepts_numeric_id() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let numeric: i64 = bob.id.parse().unwrap();

    let body: Value = app
        .server
        .post("/api/follows/follow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": numeric }))
        .await
        .json();

    assert_eq!(body["state"], "present");
}

#[tokio::test]
async fn test_follow_requires_login() {
    let app = TestApp::new();
    let bob = app.signup("bob").await;

    let response = app
        .server
        .post("/api/follows/follow_user")
        .json(&json!({ "userId": bob.id }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "You are not logged in.");
}

#[tokio::test]
async fn test_cannot_follow_yourself() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let response = app
        .server
        .post("/api/follows/follow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": alice.id }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "You cannot follow yourself.");
}

#[tokio::test]
async fn test_follow_unknown_user_is_not_found() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    app.server
        .post("/api/follows/follow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": "42" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unfollow_is_idempotent() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    app.server
        .post("/api/follows/follow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": bob.id }))
        .await
        .assert_status_ok();

    let first: Value = app
        .server
        .post("/api/follows/unfollow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": bob.id }))
        .await
        .json();
    let second: Value = app
        .server
        .post("/api/follows/unfollow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": bob.id }))
        .await
        .json();

    assert_eq!(first, json!({ "success": true, "removed": true }));
    assert_eq!(second, json!({ "success": true, "removed": false }));
}

#[tokio::test]
async fn test_not_followed_excludes_self_and_followed() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    app.signup("carol").await;
    app.server
        .post("/api/follows/follow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": bob.id }))
        .await;

    let body: Value = app
        .server
        .get("/api/follows/notfollowed")
        .authorization_bearer(&alice.token)
        .await
        .json();

    let names: Vec<&str> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["carol"]);
}

#[tokio::test]
async fn test_like_toggle_twice_returns_to_absent() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let tweet_id = app.post_tweet(&alice, "hello").await;

    let like = || {
        app.server
            .post("/api/likes/like_tweet")
            .authorization_bearer(&alice.token)
            .json(&json!({ "tweetId": tweet_id }))
    };

    let first: Value = like().await.json();
    let second: Value = like().await.json();

    assert_eq!(first["state"], "present");
    assert_eq!(second["state"], "absent");
}

#[tokio::test]
async fn test_like_unknown_tweet_is_not_found() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let response = app
        .server
        .post("/api/likes/like_tweet")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": "12345" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "Tweet not found.");
}

#[tokio::test]
async fn test_retweet_toggle() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let tweet_id = app.post_tweet(&alice, "worth sharing").await;

    let body: Value = app
        .server
        .post("/api/retweets/retweet_tweet")
        .authorization_bearer(&bob.token)
        .json(&json!({ "tweetId": tweet_id }))
        .await
        .json();
    assert_eq!(body["state"], "present");

    let retweets: Value = app.server.get("/api/retweets").await.json();
    let edges = retweets["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["userId"], bob.id);
    assert_eq!(edges[0]["tweetId"], tweet_id);
}

#[tokio::test]
async fn test_create_duplicate_like_fails() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let tweet_id = app.post_tweet(&alice, "hello").await;

    app.server
        .post("/api/likes")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": tweet_id }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .post("/api/likes")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": tweet_id }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorMessage"], "You already liked this tweet.");
}

#[tokio::test]
async fn test_edge_crud_permissions() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let root = app.signup_admin("root").await;
    let tweet_id = app.post_tweet(&bob, "hi").await;

    let created: Value = app
        .server
        .post("/api/likes")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": tweet_id }))
        .await
        .json();
    let like_id = created["edge"]["id"].as_str().unwrap().to_owned();
    let uri = format!("/api/likes/{}", like_id);

    // Only admins may rewrite an edge
    app.server
        .put(&uri)
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": bob.id, "tweetId": tweet_id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let replaced: Value = app
        .server
        .put(&uri)
        .authorization_bearer(&root.token)
        .json(&json!({ "userId": bob.id, "tweetId": tweet_id }))
        .await
        .json();
    assert_eq!(replaced["edge"]["userId"], bob.id);

    // Alice no longer owns it
    app.server
        .delete(&uri)
        .authorization_bearer(&alice.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&uri)
        .authorization_bearer(&bob.token)
        .await
        .assert_status_ok();

    app.server.get(&uri).await.assert_status(StatusCode::NOT_FOUND);
}
