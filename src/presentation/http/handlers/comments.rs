//! Comment Handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::application::dto::{
    CommentPayload, CommentsPayload, ContentRequest, CreateCommentRequest, Empty, Envelope,
    ListQuery,
};
use crate::presentation::http::extractors::{
    CurrentUser, JsonBody, MaybeIdentity, PathParam, QueryParams,
};
use crate::shared::error::AppError;
use crate::shared::validation::validate;
use crate::startup::AppState;

/// Recent comments; `?tweetId=` restricts the list to one thread
pub async fn list_comments(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Envelope<CommentsPayload>>, AppError> {
    let comments = state
        .comments
        .list_comments(query.tweet_id, query.limit())
        .await?;

    Ok(Json(Envelope::ok(CommentsPayload {
        comments: comments.into_iter().map(Into::into).collect(),
    })))
}

pub async fn get_comment(
    State(state): State<AppState>,
    PathParam(comment_id): PathParam<i64>,
) -> Result<Json<Envelope<CommentPayload>>, AppError> {
    let comment = state.comments.get_comment(comment_id).await?;

    Ok(Json(Envelope::ok(CommentPayload {
        comment: comment.into(),
    })))
}

/// Comment on a tweet. Content and tweet are validated by the service.
pub async fn create_comment(
    State(state): State<AppState>,
    MaybeIdentity(actor): MaybeIdentity,
    JsonBody(body): JsonBody<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Envelope<CommentPayload>>), AppError> {
    let comment = state
        .comments
        .create_comment(actor.as_ref(), body.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(CommentPayload {
            comment: comment.into(),
        })),
    ))
}

pub async fn replace_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(comment_id): PathParam<i64>,
    JsonBody(body): JsonBody<ContentRequest>,
) -> Result<Json<Envelope<CommentPayload>>, AppError> {
    validate(&body)?;

    let comment = state
        .comments
        .replace_comment(&actor, comment_id, body.content)
        .await?;

    Ok(Json(Envelope::ok(CommentPayload {
        comment: comment.into(),
    })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(comment_id): PathParam<i64>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    state.comments.delete_comment(&actor, comment_id).await?;

    Ok(Json(Envelope::ok(Empty {})))
}
