//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use tower_http::compression::CompressionLayer;

use super::handlers::{comments, health, social, tweets, users};
use crate::domain::{Follow, Like, Retweet};
use crate::infrastructure::metrics;
use crate::presentation::middleware::{cors, logging, track_metrics};
use crate::startup::AppState;

/// Create the main router with the shared middleware stack
pub fn create_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);

    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .layer(CompressionLayer::new())
        .layer(logging::create_trace_layer())
        .layer(cors)
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics::gather_metrics(),
    )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/tweets", tweet_routes())
        .nest("/comments", comment_routes())
        .nest("/likes", like_routes())
        .nest("/retweets", retweet_routes())
        .nest("/follows", follow_routes())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/get_profile", get(users::get_own_profile))
        .route("/get_profile/{id}", get(users::get_profile))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::replace_user)
                .delete(users::delete_user),
        )
}

fn tweet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tweets::list_tweets).post(tweets::create_tweet))
        .route("/get_tweets_feed", get(tweets::get_tweets_feed))
        .route(
            "/{id}",
            get(tweets::get_tweet)
                .put(tweets::replace_tweet)
                .delete(tweets::delete_tweet),
        )
}

fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(comments::list_comments).post(comments::create_comment))
        .route("/create", post(comments::create_comment))
        .route(
            "/{id}",
            get(comments::get_comment)
                .put(comments::replace_comment)
                .delete(comments::delete_comment),
        )
}

fn like_routes() -> Router<AppState> {
    edge_routes::<Like>().route("/like_tweet", post(social::toggle::<Like>))
}

fn retweet_routes() -> Router<AppState> {
    edge_routes::<Retweet>().route("/retweet_tweet", post(social::toggle::<Retweet>))
}

fn follow_routes() -> Router<AppState> {
    edge_routes::<Follow>()
        .route("/follow_user", post(social::toggle::<Follow>))
        .route("/unfollow_user", post(social::remove::<Follow>))
        .route("/notfollowed", get(social::not_followed))
}

/// CRUD routes shared by every edge type
fn edge_routes<E: social::SocialRoute>() -> Router<AppState> {
    Router::new()
        .route("/", get(social::list::<E>).post(social::create::<E>))
        .route(
            "/{id}",
            get(social::get::<E>)
                .put(social::replace::<E>)
                .delete(social::delete::<E>),
        )
}
