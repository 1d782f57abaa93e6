//! Tweet Handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::application::dto::{
    ContentRequest, Empty, Envelope, FeedEntryResponse, ListQuery, TweetPayload, TweetResponse,
    TweetsPayload,
};
use crate::presentation::http::extractors::{CurrentUser, JsonBody, PathParam, QueryParams};
use crate::shared::error::AppError;
use crate::shared::validation::validate;
use crate::startup::AppState;

/// Most recent tweets
pub async fn list_tweets(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Envelope<TweetsPayload<TweetResponse>>>, AppError> {
    let tweets = state.tweets.list_tweets(query.limit()).await?;

    Ok(Json(Envelope::ok(TweetsPayload {
        tweets: tweets.into_iter().map(Into::into).collect(),
    })))
}

pub async fn get_tweet(
    State(state): State<AppState>,
    PathParam(tweet_id): PathParam<i64>,
) -> Result<Json<Envelope<TweetPayload>>, AppError> {
    let tweet = state.tweets.get_tweet(tweet_id).await?;

    Ok(Json(Envelope::ok(TweetPayload {
        tweet: tweet.into(),
    })))
}

/// Post a tweet as the caller
pub async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    JsonBody(body): JsonBody<ContentRequest>,
) -> Result<(StatusCode, Json<Envelope<TweetPayload>>), AppError> {
    validate(&body)?;

    let tweet = state.tweets.create_tweet(&actor, body.content).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(TweetPayload {
            tweet: tweet.into(),
        })),
    ))
}

pub async fn replace_tweet(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(tweet_id): PathParam<i64>,
    JsonBody(body): JsonBody<ContentRequest>,
) -> Result<Json<Envelope<TweetPayload>>, AppError> {
    validate(&body)?;

    let tweet = state
        .tweets
        .replace_tweet(&actor, tweet_id, body.content)
        .await?;

    Ok(Json(Envelope::ok(TweetPayload {
        tweet: tweet.into(),
    })))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(tweet_id): PathParam<i64>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    state.tweets.delete_tweet(&actor, tweet_id).await?;

    Ok(Json(Envelope::ok(Empty {})))
}

/// Home feed: the caller's tweets and those of everyone they follow
pub async fn get_tweets_feed(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Envelope<TweetsPayload<FeedEntryResponse>>>, AppError> {
    let entries = state.tweets.feed(&actor, query.limit()).await?;

    Ok(Json(Envelope::ok(TweetsPayload {
        tweets: entries.into_iter().map(Into::into).collect(),
    })))
}
