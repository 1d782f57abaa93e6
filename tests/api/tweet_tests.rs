//! Tweet, Comment and Feed API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestApp;

#[tokio::test]
async fn test_create_and_get_tweet() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let response = app
        .server
        .post("/api/tweets")
        .authorization_bearer(&alice.token)
        .json(&json!({ "content": "first post" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["tweet"]["userId"], alice.id);

    let id = created["tweet"]["id"].as_str().unwrap();
    let fetched: Value = app.server.get(&format!("/api/tweets/{}", id)).await.json();
    assert_eq!(fetched["tweet"]["content"], "first post");
}

#[tokio::test]
async fn test_tweet_content_limits() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    for content in [String::new(), "x".repeat(281)] {
        app.server
            .post("/api/tweets")
            .authorization_bearer(&alice.token)
            .json(&json!({ "content": content }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    app.server
        .post("/api/tweets")
        .authorization_bearer(&alice.token)
        .json(&json!({ "content": "é".repeat(280) }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_only_owner_deletes_tweet() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let tweet_id = app.post_tweet(&alice, "mine").await;
    let uri = format!("/api/tweets/{}", tweet_id);

    app.server
        .delete(&uri)
        .authorization_bearer(&bob.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&uri)
        .authorization_bearer(&alice.token)
        .await
        .assert_status_ok();

    app.server.get(&uri).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_contains_own_and_followed_tweets() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let carol = app.signup("carol").await;
    app.post_tweet(&alice, "from alice").await;
    let bob_tweet = app.post_tweet(&bob, "from bob").await;
    app.post_tweet(&carol, "from carol").await;

    app.server
        .post("/api/follows/follow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": bob.id }))
        .await;
    app.server
        .post("/api/likes/like_tweet")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": bob_tweet }))
        .await;

    let body: Value = app
        .server
        .get("/api/tweets/get_tweets_feed")
        .authorization_bearer(&alice.token)
        .await
        .json();

    let tweets = body["tweets"].as_array().unwrap();
    let contents: Vec<&str> = tweets
        .iter()
        .map(|t| t["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["from bob", "from alice"]);
    assert_eq!(tweets[0]["author"], "bob");
    assert_eq!(tweets[0]["likes"], 1);
    assert_eq!(tweets[0]["likedByMe"], true);
}

#[tokio::test]
async fn test_profile_counts() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    app.post_tweet(&bob, "one").await;
    app.post_tweet(&bob, "two").await;
    app.server
        .post("/api/follows/follow_user")
        .authorization_bearer(&alice.token)
        .json(&json!({ "userId": bob.id }))
        .await;

    let body: Value = app
        .server
        .get(&format!("/api/users/get_profile/{}", bob.id))
        .await
        .json();

    let profile = &body["profile"];
    assert_eq!(profile["user"]["username"], "bob");
    assert_eq!(profile["followers"], 1);
    assert_eq!(profile["following"], 0);
    assert_eq!(profile["tweetCount"], 2);
    assert_eq!(profile["tweets"][0]["content"], "two");
}

#[tokio::test]
async fn test_comment_on_tweet() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let tweet_id = app.post_tweet(&alice, "discuss").await;

    app.server
        .post("/api/comments/create")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": tweet_id, "content": "first!" }))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = app
        .server
        .get("/api/comments")
        .add_query_param("tweetId", &tweet_id)
        .await
        .json();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "first!");
    assert_eq!(comments[0]["userId"], alice.id);
}

#[tokio::test]
async fn test_comment_validation() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let tweet_id = app.post_tweet(&alice, "discuss").await;

    let empty = app
        .server
        .post("/api/comments")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": tweet_id, "content": "" }))
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);

    let missing = app
        .server
        .post("/api/comments")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": "999", "content": "hello" }))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = missing.json();
    assert_eq!(
        body["errorMessage"],
        "The tweet you are commenting on does not exist."
    );

    let anonymous = app
        .server
        .post("/api/comments")
        .json(&json!({ "tweetId": tweet_id, "content": "hello" }))
        .await;
    anonymous.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleting_tweet_removes_its_comments() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let tweet_id = app.post_tweet(&alice, "short lived").await;
    app.server
        .post("/api/comments")
        .authorization_bearer(&alice.token)
        .json(&json!({ "tweetId": tweet_id, "content": "bye" }))
        .await;

    app.server
        .delete(&format!("/api/tweets/{}", tweet_id))
        .authorization_bearer(&alice.token)
        .await
        .assert_status_ok();

    let body: Value = app.server.get("/api/comments").await.json();
    assert_eq!(body["comments"].as_array().unwrap().len(), 0);
}
