//! Social Graph Handlers
//!
//! Follows, likes and retweets share one set of handlers. [`SocialRoute`]
//! ties each edge type to its service, its response body and the request
//! body naming its target.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{de::DeserializeOwned, Serialize};

use crate::application::dto::{
    EdgePayload, EdgesPayload, Empty, Envelope, FollowResponse, ListQuery, RemovedPayload,
    ReplaceEdgeRequest, ToggleResponse, TweetEdgeResponse, TweetTargetRequest, UserResponse,
    UserTargetRequest, UsersPayload,
};
use crate::application::services::SocialService;
use crate::domain::{Edge, Follow, Like, Retweet};
use crate::infrastructure::metrics;
use crate::presentation::http::extractors::{
    CurrentUser, JsonBody, MaybeIdentity, PathParam, QueryParams,
};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// HTTP binding of an edge type.
pub trait SocialRoute: Edge {
    type Body: Serialize + From<Self> + Send;
    type Target: DeserializeOwned + Send + 'static;

    fn service(state: &AppState) -> &Arc<dyn SocialService<Self>>;

    fn target_of(target: &Self::Target) -> i64;
}

impl SocialRoute for Follow {
    type Body = FollowResponse;
    type Target = UserTargetRequest;

    fn service(state: &AppState) -> &Arc<dyn SocialService<Self>> {
        &state.follows
    }

    fn target_of(target: &UserTargetRequest) -> i64 {
        target.user_id
    }
}

impl SocialRoute for Like {
    type Body = TweetEdgeResponse;
    type Target = TweetTargetRequest;

    fn service(state: &AppState) -> &Arc<dyn SocialService<Self>> {
        &state.likes
    }

    fn target_of(target: &TweetTargetRequest) -> i64 {
        target.tweet_id
    }
}

impl SocialRoute for Retweet {
    type Body = TweetEdgeResponse;
    type Target = TweetTargetRequest;

    fn service(state: &AppState) -> &Arc<dyn SocialService<Self>> {
        &state.retweets
    }

    fn target_of(target: &TweetTargetRequest) -> i64 {
        target.tweet_id
    }
}

/// Flip the caller's edge (follow_user, like_tweet, retweet_tweet)
pub async fn toggle<E: SocialRoute>(
    State(state): State<AppState>,
    MaybeIdentity(actor): MaybeIdentity,
    JsonBody(body): JsonBody<E::Target>,
) -> Result<Json<Envelope<ToggleResponse>>, AppError> {
    let edge_state = E::service(&state)
        .toggle(actor.as_ref(), E::target_of(&body))
        .await?;

    metrics::record_toggle(E::KIND, edge_state);

    Ok(Json(Envelope::ok(edge_state.into())))
}

/// Remove the caller's edge if present (unfollow_user)
pub async fn remove<E: SocialRoute>(
    State(state): State<AppState>,
    MaybeIdentity(actor): MaybeIdentity,
    JsonBody(body): JsonBody<E::Target>,
) -> Result<Json<Envelope<RemovedPayload>>, AppError> {
    let removed = E::service(&state)
        .remove(actor.as_ref(), E::target_of(&body))
        .await?;

    Ok(Json(Envelope::ok(RemovedPayload { removed })))
}

pub async fn list<E: SocialRoute>(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Envelope<EdgesPayload<E::Body>>>, AppError> {
    let edges = E::service(&state).list_edges(query.limit()).await?;

    Ok(Json(Envelope::ok(EdgesPayload {
        edges: edges.into_iter().map(Into::into).collect(),
    })))
}

pub async fn get<E: SocialRoute>(
    State(state): State<AppState>,
    PathParam(edge_id): PathParam<i64>,
) -> Result<Json<Envelope<EdgePayload<E::Body>>>, AppError> {
    let edge = E::service(&state).get_edge(edge_id).await?;

    Ok(Json(Envelope::ok(EdgePayload { edge: edge.into() })))
}

/// Create the caller's edge; an existing pair is a validation failure
pub async fn create<E: SocialRoute>(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    JsonBody(body): JsonBody<E::Target>,
) -> Result<(StatusCode, Json<Envelope<EdgePayload<E::Body>>>), AppError> {
    let edge = E::service(&state)
        .create_edge(&actor, E::target_of(&body))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(EdgePayload { edge: edge.into() })),
    ))
}

pub async fn replace<E: SocialRoute>(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(edge_id): PathParam<i64>,
    JsonBody(body): JsonBody<ReplaceEdgeRequest>,
) -> Result<Json<Envelope<EdgePayload<E::Body>>>, AppError> {
    let edge = E::service(&state)
        .replace_edge(&actor, edge_id, body.user_id, body.target_id)
        .await?;

    Ok(Json(Envelope::ok(EdgePayload { edge: edge.into() })))
}

pub async fn delete<E: SocialRoute>(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(edge_id): PathParam<i64>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    E::service(&state).delete_edge(&actor, edge_id).await?;

    Ok(Json(Envelope::ok(Empty {})))
}

/// Users the caller does not follow yet
pub async fn not_followed(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Envelope<UsersPayload>>, AppError> {
    let users = state.users.not_followed(&actor, query.limit()).await?;

    Ok(Json(Envelope::ok(UsersPayload {
        users: users
            .into_iter()
            .map(|u| UserResponse::from_user(u, false))
            .collect(),
    })))
}
