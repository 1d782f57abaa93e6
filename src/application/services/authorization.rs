//! Authorization
//!
//! Resolves *who* is calling from whatever credentials the request carries,
//! and decides whether that identity holds a required role.
//!
//! Two credential strategies exist side by side:
//!
//! - a server-side session referenced by an HTTP-only cookie
//!   ([`SessionCredentialResolver`]), and
//! - a signed, stateless bearer token ([`BearerCredentialResolver`]).
//!
//! Both implement [`CredentialResolver`] and are tried in configured order
//! by a [`CredentialChain`]. Handlers receive the resolved [`Identity`]
//! explicitly; nothing reads ambient session state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::domain::{SessionData, SessionStore, User, UserRepository, ROLE_ADMIN};

use super::auth_service::AuthError;
use super::token::TokenCodec;

/// Message used whenever an operation needs a logged-in caller.
pub const NOT_LOGGED_IN: &str = "You are not logged in.";

/// Message used whenever the caller lacks the rights for an operation.
pub const NOT_ALLOWED: &str = "You are not allowed to do that.";

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

impl Identity {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
        }
    }

    pub fn from_session(session: &SessionData) -> Self {
        Self {
            user_id: session.user_id,
            username: session.username.clone(),
            role: session.role.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        authorize(ROLE_ADMIN, Some(self))
    }

    /// Owners may change their own records; admins may change anything.
    pub fn can_modify(&self, owner_id: i64) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

/// Flat role check: `true` iff an identity is present and its role equals
/// `required_role` exactly (case-sensitive). There is no role hierarchy.
pub fn authorize(required_role: &str, identity: Option<&Identity>) -> bool {
    match identity {
        Some(identity) => identity.role == required_role,
        None => false,
    }
}

/// Raw credentials lifted from a request by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Value of the `Authorization` header, if any
    pub authorization: Option<String>,
    /// Session id from the session cookie, if any
    pub session_id: Option<String>,
}

/// One strategy for turning request credentials into an identity.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Short name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this strategy's credential is not present at all;
    /// `Err` when it is present but invalid.
    async fn resolve(&self, credentials: &RequestCredentials)
        -> Result<Option<Identity>, AuthError>;
}

/// Identity from a server-side session.
///
/// The session's account must still exist; a session left behind by a
/// deleted account is destroyed and the request reads as anonymous.
pub struct SessionCredentialResolver<S: SessionStore + ?Sized, U: UserRepository + ?Sized> {
    sessions: Arc<S>,
    user_repo: Arc<U>,
}

impl<S: SessionStore + ?Sized, U: UserRepository + ?Sized> SessionCredentialResolver<S, U> {
    pub fn new(sessions: Arc<S>, user_repo: Arc<U>) -> Self {
        Self { sessions, user_repo }
    }
}

#[async_trait]
impl<S, U> CredentialResolver for SessionCredentialResolver<S, U>
where
    S: SessionStore + ?Sized + 'static,
    U: UserRepository + ?Sized + 'static,
{
    fn name(&self) -> &'static str {
        "session"
    }

    async fn resolve(
        &self,
        credentials: &RequestCredentials,
    ) -> Result<Option<Identity>, AuthError> {
        let Some(session_id) = credentials.session_id.as_deref() else {
            return Ok(None);
        };

        // An unknown or expired session is simply an anonymous request.
        let Some(session) = self
            .sessions
            .get(session_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        else {
            return Ok(None);
        };

        let exists = self
            .user_repo
            .find_by_id(session.user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .is_some();

        if !exists {
            tracing::info!(user_id = session.user_id, "Dropping session of deleted account");
            self.sessions
                .destroy(session_id)
                .await
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            return Ok(None);
        }

        Ok(Some(Identity::from_session(&session)))
    }
}

/// Identity from a signed bearer token.
pub struct BearerCredentialResolver<U: UserRepository + ?Sized> {
    user_repo: Arc<U>,
    tokens: Arc<TokenCodec>,
}

impl<U: UserRepository + ?Sized> BearerCredentialResolver<U> {
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenCodec>) -> Self {
        Self { user_repo, tokens }
    }

    /// Resolve the user behind an `Authorization` header value.
    ///
    /// The header is split on whitespace and its final token is taken as the
    /// JWT. Fails with [`AuthError::Authentication`] if the header is missing
    /// or empty, the token does not validate, the subject claim is missing or
    /// malformed, or no user with that id exists.
    #[instrument(skip_all)]
    pub async fn get_authenticated_user(&self, header: Option<&str>) -> Result<User, AuthError> {
        let token = header
            .and_then(|h| h.split_whitespace().last())
            .ok_or_else(|| AuthError::Authentication("Missing authorization header".into()))?;

        let claims = self.tokens.decode(token)?;
        let user_id = TokenCodec::subject(&claims)?;

        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| AuthError::Authentication("Token user no longer exists".into()))
    }
}

#[async_trait]
impl<U: UserRepository + ?Sized + 'static> CredentialResolver for BearerCredentialResolver<U> {
    fn name(&self) -> &'static str {
        "bearer"
    }

    async fn resolve(
        &self,
        credentials: &RequestCredentials,
    ) -> Result<Option<Identity>, AuthError> {
        if credentials.authorization.is_none() {
            return Ok(None);
        }

        let user = self
            .get_authenticated_user(credentials.authorization.as_deref())
            .await?;

        Ok(Some(Identity::from_user(&user)))
    }
}

/// Ordered list of resolvers; the first one that yields an identity wins.
#[derive(Clone, Default)]
pub struct CredentialChain {
    resolvers: Vec<Arc<dyn CredentialResolver>>,
}

impl CredentialChain {
    pub fn new(resolvers: Vec<Arc<dyn CredentialResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve the caller. A presented-but-invalid credential is an error
    /// rather than a silent fallback to the next strategy.
    pub async fn resolve(
        &self,
        credentials: &RequestCredentials,
    ) -> Result<Option<Identity>, AuthError> {
        for resolver in &self.resolvers {
            if let Some(identity) = resolver.resolve(credentials).await? {
                tracing::trace!(resolver = resolver.name(), user_id = identity.user_id, "Resolved identity");
                return Ok(Some(identity));
            }
        }
        Ok(None)
    }
}
