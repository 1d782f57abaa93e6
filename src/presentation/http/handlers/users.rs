//! User Handlers
//!
//! Registration, login/logout, profiles and user CRUD.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::application::dto::{
    Empty, Envelope, ListQuery, LoginRequest, LoginResponse, ProfilePayload, ProfileResponse,
    RegisterRequest, UpdateUserRequest, UserPayload, UserResponse, UsersPayload,
};
use crate::application::services::Identity;
use crate::config::SessionSettings;
use crate::infrastructure::metrics;
use crate::presentation::http::extractors::{
    CurrentUser, JsonBody, MaybeIdentity, PathParam, QueryParams,
};
use crate::shared::error::AppError;
use crate::shared::validation::validate;
use crate::startup::AppState;

fn session_cookie(settings: &SessionSettings, session_id: String) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookie)
        .build()
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<UserPayload>>), AppError> {
    validate(&body)?;

    let (registration, password) = body.into_parts();
    let result = state.auth.register_user(registration, &password).await;
    metrics::record_auth_event("register", result.is_ok());
    let user = result?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(UserPayload {
            user: UserResponse::from_user(user, true),
        })),
    ))
}

/// Log in: returns a bearer token and sets the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<Envelope<LoginResponse>>), AppError> {
    validate(&body)?;

    let result = state.auth.login(&body.username, &body.password).await;
    metrics::record_auth_event("login", result.is_ok());
    let session = result?;

    let jar = jar.add(session_cookie(&state.settings.session, session.session_id));

    Ok((
        jar,
        Json(Envelope::ok(LoginResponse::new(session.user, session.token))),
    ))
}

/// Log out: destroys the server-side session and clears the cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Envelope<Empty>>), AppError> {
    let cookie_name = state.settings.session.cookie_name.clone();
    let session_id = jar.get(&cookie_name).map(|c| c.value().to_owned());

    let result = state.auth.logout(session_id.as_deref()).await;
    metrics::record_auth_event("logout", result.is_ok());
    result?;

    let jar = jar.remove(Cookie::build((cookie_name, "")).path("/"));

    Ok((jar, Json(Envelope::ok(Empty {}))))
}

/// List all users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Envelope<UsersPayload>>, AppError> {
    let users = state
        .users
        .list_users(&actor, query.limit(), query.offset())
        .await?;

    Ok(Json(Envelope::ok(UsersPayload {
        users: users
            .into_iter()
            .map(|u| UserResponse::from_user(u, true))
            .collect(),
    })))
}

/// Profile of the caller
pub async fn get_own_profile(
    State(state): State<AppState>,
    MaybeIdentity(actor): MaybeIdentity,
) -> Result<Json<Envelope<ProfilePayload>>, AppError> {
    profile(&state, actor, None).await
}

/// Profile of any user
pub async fn get_profile(
    State(state): State<AppState>,
    MaybeIdentity(actor): MaybeIdentity,
    PathParam(user_id): PathParam<i64>,
) -> Result<Json<Envelope<ProfilePayload>>, AppError> {
    profile(&state, actor, Some(user_id)).await
}

async fn profile(
    state: &AppState,
    actor: Option<Identity>,
    user_id: Option<i64>,
) -> Result<Json<Envelope<ProfilePayload>>, AppError> {
    let profile = state.users.get_profile(actor.as_ref(), user_id).await?;
    let include_email = actor
        .as_ref()
        .is_some_and(|a| a.can_modify(profile.user.id));

    Ok(Json(Envelope::ok(ProfilePayload {
        profile: ProfileResponse::new(profile, include_email),
    })))
}

/// Get user by ID
pub async fn get_user(
    State(state): State<AppState>,
    MaybeIdentity(actor): MaybeIdentity,
    PathParam(user_id): PathParam<i64>,
) -> Result<Json<Envelope<UserPayload>>, AppError> {
    let user = state.users.get_user(user_id).await?;
    let include_email = actor.is_some_and(|a| a.can_modify(user.id));

    Ok(Json(Envelope::ok(UserPayload {
        user: UserResponse::from_user(user, include_email),
    })))
}

/// Replace a user's profile (self or admin)
pub async fn replace_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(user_id): PathParam<i64>,
    JsonBody(body): JsonBody<UpdateUserRequest>,
) -> Result<Json<Envelope<UserPayload>>, AppError> {
    validate(&body)?;

    let user = state
        .users
        .replace_user(&actor, user_id, body.into())
        .await?;

    Ok(Json(Envelope::ok(UserPayload {
        user: UserResponse::from_user(user, true),
    })))
}

/// Delete an account (self or admin)
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    PathParam(user_id): PathParam<i64>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    state.users.delete_user(&actor, user_id).await?;

    Ok(Json(Envelope::ok(Empty {})))
}
