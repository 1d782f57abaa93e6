//! Authentication Service
//!
//! Handles credential checks, registration, and login/logout session handling.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::domain::{SessionData, SessionStore, User, UserRepository, ROLE_USER};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

use super::token::{AccessToken, TokenCodec};

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check a username/password pair and return the stored user.
    async fn authenticate_user(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Create a new account with role `"user"`.
    async fn register_user(&self, registration: NewUser, password: &str) -> Result<User, AuthError>;

    async fn is_username_taken(&self, username: &str) -> Result<bool, AuthError>;

    async fn is_email_taken(&self, email: &str) -> Result<bool, AuthError>;

    /// Authenticate, then open a server-side session and issue a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginSession, AuthError>;

    /// Clear all server-side state of a session. Missing sessions are fine.
    async fn logout(&self, session_id: Option<&str>) -> Result<(), AuthError>;
}

/// Profile fields supplied at registration.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

/// Everything a successful login hands back to the caller.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub token: AccessToken,
    pub session_id: String,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("User not found.")]
    UserNotFound,

    #[error("This username is already taken.")]
    UsernameTaken,

    #[error("This email is already registered.")]
    EmailTaken,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::InvalidCredentials | AuthError::Authentication(_) => {
                AppError::Unauthorized(err.to_string())
            }
            AuthError::UsernameTaken | AuthError::EmailTaken | AuthError::Validation(_) => {
                AppError::Validation(err.to_string())
            }
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Hash a password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// AuthService implementation
pub struct AuthServiceImpl<U, S>
where
    U: UserRepository + ?Sized,
    S: SessionStore + ?Sized,
{
    user_repo: Arc<U>,
    sessions: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
    tokens: Arc<TokenCodec>,
    session_ttl_seconds: u64,
}

impl<U, S> AuthServiceImpl<U, S>
where
    U: UserRepository + ?Sized,
    S: SessionStore + ?Sized,
{
    pub fn new(
        user_repo: Arc<U>,
        sessions: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
        tokens: Arc<TokenCodec>,
        session_ttl_seconds: u64,
    ) -> Self {
        Self {
            user_repo,
            sessions,
            id_generator,
            tokens,
            session_ttl_seconds,
        }
    }
}

#[async_trait]
impl<U, S> AuthService for AuthServiceImpl<U, S>
where
    U: UserRepository + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
{
    #[instrument(skip(self, password))]
    async fn authenticate_user(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required.".into(),
            ));
        }

        let user = self
            .user_repo
            .find_by_username(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    #[instrument(skip(self, registration, password), fields(username = %registration.username))]
    async fn register_user(&self, registration: NewUser, password: &str) -> Result<User, AuthError> {
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required.".into()));
        }

        if self.is_username_taken(&registration.username).await? {
            return Err(AuthError::UsernameTaken);
        }

        if self.is_email_taken(&registration.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password)?;

        let now = Utc::now();
        let user = User {
            id: self.id_generator.generate(),
            username: registration.username,
            email: registration.email,
            password_hash,
            bio: registration.bio,
            profile_picture: registration.profile_picture,
            role: ROLE_USER.to_string(),
            created_at: now,
            updated_at: now,
        };

        // The pre-checks above race with concurrent registrations; the
        // unique indexes are the real guard.
        let created = self.user_repo.create(&user).await.map_err(|e| match e {
            AppError::ConstraintViolation { constraint } => {
                tracing::warn!(%constraint, "Registration lost a uniqueness race");
                if constraint.contains("email") {
                    AuthError::EmailTaken
                } else {
                    AuthError::UsernameTaken
                }
            }
            e => AuthError::Internal(e.to_string()),
        })?;

        tracing::info!(user_id = created.id, "User registered");
        Ok(created)
    }

    async fn is_username_taken(&self, username: &str) -> Result<bool, AuthError> {
        self.user_repo
            .username_exists(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn is_email_taken(&self, email: &str) -> Result<bool, AuthError> {
        self.user_repo
            .email_exists(email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<LoginSession, AuthError> {
        let user = self.authenticate_user(username, password).await?;

        let token = self.tokens.issue(&user)?;

        let session_id = self
            .sessions
            .create(&SessionData::for_user(&user, self.session_ttl_seconds))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(LoginSession {
            user,
            token,
            session_id,
        })
    }

    #[instrument(skip(self, session_id))]
    async fn logout(&self, session_id: Option<&str>) -> Result<(), AuthError> {
        let Some(session_id) = session_id else {
            return Ok(());
        };

        let existed = self
            .sessions
            .destroy(session_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::debug!(existed, "Session cleared");
        Ok(())
    }
}
