//! User Service
//!
//! Handles user management operations: lookups, profiles, profile
//! replacement and account deletion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::domain::{
    EdgeRepository, Follow, Tweet, TweetRepository, User, UserRepository, ROLE_ADMIN,
};
use crate::shared::error::AppError;

use super::authorization::{authorize, Identity, NOT_ALLOWED, NOT_LOGGED_IN};

/// Number of tweets shown on a profile page.
pub const PROFILE_TWEET_LIMIT: i64 = 50;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, user_id: i64) -> Result<User, UserError>;

    /// List all users. Admin only.
    async fn list_users(&self, actor: &Identity, limit: i64, offset: i64)
        -> Result<Vec<User>, UserError>;

    /// Profile of `user_id`, or of the caller when no id is given.
    async fn get_profile(
        &self,
        actor: Option<&Identity>,
        user_id: Option<i64>,
    ) -> Result<Profile, UserError>;

    /// Replace a user's profile fields. Self or admin.
    async fn replace_user(
        &self,
        actor: &Identity,
        user_id: i64,
        update: UserUpdate,
    ) -> Result<User, UserError>;

    /// Delete an account. Self or admin.
    async fn delete_user(&self, actor: &Identity, user_id: i64) -> Result<(), UserError>;

    /// Users the caller does not follow yet, excluding the caller.
    async fn not_followed(&self, actor: &Identity, limit: i64) -> Result<Vec<User>, UserError>;
}

/// Full replacement of the mutable user fields.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    /// Only admins may change roles
    pub role: Option<String>,
}

/// A user together with their social counters and latest tweets.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub followers: i64,
    pub following: i64,
    pub tweet_count: i64,
    pub tweets: Vec<Tweet>,
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found.")]
    NotFound,

    #[error("{}", NOT_LOGGED_IN)]
    NotLoggedIn,

    #[error("{}", NOT_ALLOWED)]
    Forbidden,

    #[error("This username is already taken.")]
    UsernameTaken,

    #[error("This email is already registered.")]
    EmailTaken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AppError::NotFound(err.to_string()),
            UserError::NotLoggedIn => AppError::Unauthorized(err.to_string()),
            UserError::Forbidden => AppError::Forbidden(err.to_string()),
            UserError::UsernameTaken | UserError::EmailTaken => {
                AppError::Validation(err.to_string())
            }
            UserError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// UserService implementation
pub struct UserServiceImpl<U, T, F>
where
    U: UserRepository + ?Sized,
    T: TweetRepository + ?Sized,
    F: EdgeRepository<Follow> + ?Sized,
{
    user_repo: Arc<U>,
    tweet_repo: Arc<T>,
    follow_repo: Arc<F>,
}

impl<U, T, F> UserServiceImpl<U, T, F>
where
    U: UserRepository + ?Sized,
    T: TweetRepository + ?Sized,
    F: EdgeRepository<Follow> + ?Sized,
{
    pub fn new(user_repo: Arc<U>, tweet_repo: Arc<T>, follow_repo: Arc<F>) -> Self {
        Self {
            user_repo,
            tweet_repo,
            follow_repo,
        }
    }

    async fn load(&self, user_id: i64) -> Result<User, UserError> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)
    }
}

#[async_trait]
impl<U, T, F> UserService for UserServiceImpl<U, T, F>
where
    U: UserRepository + ?Sized + 'static,
    T: TweetRepository + ?Sized + 'static,
    F: EdgeRepository<Follow> + ?Sized + 'static,
{
    async fn get_user(&self, user_id: i64) -> Result<User, UserError> {
        self.load(user_id).await
    }

    async fn list_users(
        &self,
        actor: &Identity,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, UserError> {
        if !authorize(ROLE_ADMIN, Some(actor)) {
            return Err(UserError::Forbidden);
        }

        self.user_repo
            .list(limit, offset)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))
    }

    #[instrument(skip(self, actor))]
    async fn get_profile(
        &self,
        actor: Option<&Identity>,
        user_id: Option<i64>,
    ) -> Result<Profile, UserError> {
        let user_id = match (user_id, actor) {
            (Some(id), _) => id,
            (None, Some(actor)) => actor.user_id,
            (None, None) => return Err(UserError::NotLoggedIn),
        };

        let user = self.load(user_id).await?;

        let followers = self
            .follow_repo
            .count_by_target(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let following = self
            .follow_repo
            .count_by_actor(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let tweet_count = self
            .tweet_repo
            .count_by_user(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let tweets = self
            .tweet_repo
            .find_by_user(user_id, PROFILE_TWEET_LIMIT)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(Profile {
            user,
            followers,
            following,
            tweet_count,
            tweets,
        })
    }

    #[instrument(skip(self, actor, update), fields(actor_id = actor.user_id))]
    async fn replace_user(
        &self,
        actor: &Identity,
        user_id: i64,
        update: UserUpdate,
    ) -> Result<User, UserError> {
        if !actor.can_modify(user_id) {
            return Err(UserError::Forbidden);
        }

        let mut user = self.load(user_id).await?;

        if let Some(role) = &update.role {
            if role != &user.role && !actor.is_admin() {
                return Err(UserError::Forbidden);
            }
        }

        // Check if username is being changed and if it's available
        if update.username != user.username {
            let exists = self
                .user_repo
                .username_exists(&update.username)
                .await
                .map_err(|e| UserError::Internal(e.to_string()))?;
            if exists {
                return Err(UserError::UsernameTaken);
            }
        }

        if update.email != user.email {
            let exists = self
                .user_repo
                .email_exists(&update.email)
                .await
                .map_err(|e| UserError::Internal(e.to_string()))?;
            if exists {
                return Err(UserError::EmailTaken);
            }
        }

        user.username = update.username;
        user.email = update.email;
        user.bio = update.bio;
        user.profile_picture = update.profile_picture;
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        let updated = self.user_repo.update(&user).await.map_err(|e| match e {
            AppError::ConstraintViolation { constraint } if constraint.contains("email") => {
                UserError::EmailTaken
            }
            AppError::ConstraintViolation { .. } => UserError::UsernameTaken,
            AppError::NotFound(_) => UserError::NotFound,
            e => UserError::Internal(e.to_string()),
        })?;

        tracing::info!(user_id, "User replaced");
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.user_id))]
    async fn delete_user(&self, actor: &Identity, user_id: i64) -> Result<(), UserError> {
        if !actor.can_modify(user_id) {
            return Err(UserError::Forbidden);
        }

        self.load(user_id).await?;

        self.user_repo
            .delete(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        tracing::info!(user_id, "User deleted");
        Ok(())
    }

    async fn not_followed(&self, actor: &Identity, limit: i64) -> Result<Vec<User>, UserError> {
        self.user_repo
            .not_followed_by(actor.user_id, limit)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))
    }
}
