//! Custom Extractors
//!
//! Axum extractors that resolve the caller through the configured
//! credential chain (bearer token and/or session cookie).

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::application::services::{Identity, RequestCredentials, NOT_LOGGED_IN};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// JSON body whose rejections render as the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose rejections render as the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Query string whose rejections render as the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Raw credentials carried by a request.
fn credentials(parts: &Parts, cookie_name: &str) -> RequestCredentials {
    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let session_id = CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_owned());

    RequestCredentials {
        authorization,
        session_id,
    }
}

/// The caller's identity, if any credential resolved to one.
///
/// A credential that is presented but invalid (bad token, unknown user)
/// rejects the request with 401 instead of reading as anonymous.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = credentials(parts, &state.settings.session.cookie_name);

        let identity = state.credentials.resolve(&credentials).await.map_err(|e| {
            tracing::debug!(error = %e, "Credential rejected");
            AppError::from(e)
        })?;

        Ok(MaybeIdentity(identity))
    }
}

/// An authenticated caller. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeIdentity(identity) = MaybeIdentity::from_request_parts(parts, state).await?;

        identity
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized(NOT_LOGGED_IN.into()))
    }
}
