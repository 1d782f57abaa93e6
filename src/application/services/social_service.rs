//! Social Graph Service
//!
//! Follows, likes and retweets share one implementation, parameterized over
//! the [`Edge`] type. The headline operation is [`SocialService::toggle`]:
//! create the `(actor, target)` edge when absent, remove it when present.
//! Atomicity comes from [`EdgeRepository::toggle`], so two concurrent
//! toggles can never leave duplicate rows behind.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::domain::{
    Edge, EdgeKind, EdgeRepository, EdgeState, TargetKind, TweetRepository, UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

use super::authorization::{Identity, NOT_ALLOWED, NOT_LOGGED_IN};

/// Social edge service trait, one instance per edge type.
#[async_trait]
pub trait SocialService<E: Edge>: Send + Sync {
    /// Flip the caller's edge to `target_id` and report the new state.
    async fn toggle(&self, actor: Option<&Identity>, target_id: i64)
        -> Result<EdgeState, SocialError>;

    /// Remove the caller's edge to `target_id` if there is one. Returns
    /// whether an edge was removed.
    async fn remove(&self, actor: Option<&Identity>, target_id: i64) -> Result<bool, SocialError>;

    async fn list_edges(&self, limit: i64) -> Result<Vec<E>, SocialError>;

    async fn get_edge(&self, edge_id: i64) -> Result<E, SocialError>;

    /// Create the caller's edge to `target_id`; fails if it already exists.
    async fn create_edge(&self, actor: &Identity, target_id: i64) -> Result<E, SocialError>;

    /// Rewrite both ends of an edge. Admin only.
    async fn replace_edge(
        &self,
        actor: &Identity,
        edge_id: i64,
        actor_id: i64,
        target_id: i64,
    ) -> Result<E, SocialError>;

    /// Delete an edge by id. Owner or admin.
    async fn delete_edge(&self, actor: &Identity, edge_id: i64) -> Result<(), SocialError>;
}

/// Social graph errors
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("{}", NOT_LOGGED_IN)]
    NotLoggedIn,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{}", NOT_ALLOWED)]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SocialError> for AppError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::NotLoggedIn => AppError::Unauthorized(err.to_string()),
            SocialError::NotFound(msg) => AppError::NotFound(msg),
            SocialError::Validation(msg) => AppError::Validation(msg),
            SocialError::Forbidden => AppError::Forbidden(err.to_string()),
            SocialError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

fn duplicate_message(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Follow => "You already follow this user.",
        EdgeKind::Like => "You already liked this tweet.",
        EdgeKind::Retweet => "You already retweeted this tweet.",
    }
}

fn missing_edge_message(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Follow => "Follow not found.",
        EdgeKind::Like => "Like not found.",
        EdgeKind::Retweet => "Retweet not found.",
    }
}

/// SocialService implementation
pub struct SocialServiceImpl<E, R, U, T>
where
    E: Edge,
    R: EdgeRepository<E> + ?Sized,
    U: UserRepository + ?Sized,
    T: TweetRepository + ?Sized,
{
    edge_repo: Arc<R>,
    user_repo: Arc<U>,
    tweet_repo: Arc<T>,
    id_generator: Arc<SnowflakeGenerator>,
    _edge: PhantomData<fn() -> E>,
}

impl<E, R, U, T> SocialServiceImpl<E, R, U, T>
where
    E: Edge,
    R: EdgeRepository<E> + ?Sized,
    U: UserRepository + ?Sized,
    T: TweetRepository + ?Sized,
{
    pub fn new(
        edge_repo: Arc<R>,
        user_repo: Arc<U>,
        tweet_repo: Arc<T>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            edge_repo,
            user_repo,
            tweet_repo,
            id_generator,
            _edge: PhantomData,
        }
    }

    fn missing_target() -> SocialError {
        SocialError::NotFound(match E::KIND.target() {
            TargetKind::User => "User not found.".into(),
            TargetKind::Tweet => "Tweet not found.".into(),
        })
    }

    /// Fail with `NotFound` unless the edge target exists.
    async fn ensure_target(&self, target_id: i64) -> Result<(), SocialError> {
        let found = match E::KIND.target() {
            TargetKind::User => self
                .user_repo
                .find_by_id(target_id)
                .await
                .map(|u| u.is_some()),
            TargetKind::Tweet => self
                .tweet_repo
                .find_by_id(target_id)
                .await
                .map(|t| t.is_some()),
        }
        .map_err(|e| SocialError::Internal(e.to_string()))?;

        if found {
            Ok(())
        } else {
            Err(Self::missing_target())
        }
    }

    fn check_pair(actor_id: i64, target_id: i64) -> Result<(), SocialError> {
        E::check_pair(actor_id, target_id).map_err(|m| SocialError::Validation(m.into()))
    }

    async fn load(&self, edge_id: i64) -> Result<E, SocialError> {
        self.edge_repo
            .find_by_id(edge_id)
            .await
            .map_err(|e| SocialError::Internal(e.to_string()))?
            .ok_or_else(|| SocialError::NotFound(missing_edge_message(E::KIND).into()))
    }

    fn write_error(err: AppError) -> SocialError {
        match err {
            AppError::ConstraintViolation { constraint } => {
                tracing::debug!(%constraint, "Edge write rejected");
                SocialError::Validation(duplicate_message(E::KIND).into())
            }
            AppError::MissingReference { .. } => Self::missing_target(),
            AppError::NotFound(_) => SocialError::NotFound(missing_edge_message(E::KIND).into()),
            e => SocialError::Internal(e.to_string()),
        }
    }
}

#[async_trait]
impl<E, R, U, T> SocialService<E> for SocialServiceImpl<E, R, U, T>
where
    E: Edge,
    R: EdgeRepository<E> + ?Sized + 'static,
    U: UserRepository + ?Sized + 'static,
    T: TweetRepository + ?Sized + 'static,
{
    #[instrument(skip(self, actor), fields(kind = %E::KIND))]
    async fn toggle(
        &self,
        actor: Option<&Identity>,
        target_id: i64,
    ) -> Result<EdgeState, SocialError> {
        let actor = actor.ok_or(SocialError::NotLoggedIn)?;

        Self::check_pair(actor.user_id, target_id)?;
        self.ensure_target(target_id).await?;

        let edge = E::new(self.id_generator.generate(), actor.user_id, target_id);
        // The target can vanish between the check above and the write.
        let state = self.edge_repo.toggle(&edge).await.map_err(|e| match e {
            AppError::MissingReference { .. } => Self::missing_target(),
            e => SocialError::Internal(e.to_string()),
        })?;

        tracing::info!(
            actor_id = actor.user_id,
            target_id,
            state = state.as_str(),
            "Edge toggled"
        );
        Ok(state)
    }

    #[instrument(skip(self, actor), fields(kind = %E::KIND))]
    async fn remove(&self, actor: Option<&Identity>, target_id: i64) -> Result<bool, SocialError> {
        let actor = actor.ok_or(SocialError::NotLoggedIn)?;

        let removed = self
            .edge_repo
            .remove(actor.user_id, target_id)
            .await
            .map_err(|e| SocialError::Internal(e.to_string()))?;

        tracing::info!(actor_id = actor.user_id, target_id, removed, "Edge removed");
        Ok(removed)
    }

    async fn list_edges(&self, limit: i64) -> Result<Vec<E>, SocialError> {
        self.edge_repo
            .list(limit)
            .await
            .map_err(|e| SocialError::Internal(e.to_string()))
    }

    async fn get_edge(&self, edge_id: i64) -> Result<E, SocialError> {
        self.load(edge_id).await
    }

    #[instrument(skip(self, actor), fields(kind = %E::KIND, actor_id = actor.user_id))]
    async fn create_edge(&self, actor: &Identity, target_id: i64) -> Result<E, SocialError> {
        Self::check_pair(actor.user_id, target_id)?;
        self.ensure_target(target_id).await?;

        let edge = E::new(self.id_generator.generate(), actor.user_id, target_id);
        self.edge_repo
            .create(&edge)
            .await
            .map_err(Self::write_error)
    }

    #[instrument(skip(self, actor), fields(kind = %E::KIND, actor = actor.user_id))]
    async fn replace_edge(
        &self,
        actor: &Identity,
        edge_id: i64,
        actor_id: i64,
        target_id: i64,
    ) -> Result<E, SocialError> {
        if !actor.is_admin() {
            return Err(SocialError::Forbidden);
        }

        let existing = self.load(edge_id).await?;
        Self::check_pair(actor_id, target_id)?;
        self.ensure_target(target_id).await?;

        let owner_exists = self
            .user_repo
            .find_by_id(actor_id)
            .await
            .map_err(|e| SocialError::Internal(e.to_string()))?
            .is_some();
        if !owner_exists {
            return Err(SocialError::NotFound("User not found.".into()));
        }

        let edge = E::from_parts(existing.id(), actor_id, target_id, existing.created_at());
        self.edge_repo
            .update(&edge)
            .await
            .map_err(Self::write_error)
    }

    #[instrument(skip(self, actor), fields(kind = %E::KIND, actor_id = actor.user_id))]
    async fn delete_edge(&self, actor: &Identity, edge_id: i64) -> Result<(), SocialError> {
        let edge = self.load(edge_id).await?;
        if !actor.can_modify(edge.actor_id()) {
            return Err(SocialError::Forbidden);
        }

        self.edge_repo
            .delete(edge_id)
            .await
            .map_err(|e| SocialError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Follow, Like, MockTweetRepository, MockUserRepository, Retweet, Tweet, User, ROLE_ADMIN,
        ROLE_USER,
    };
    use crate::infrastructure::memory::MemoryEdgeRepository;
    use pretty_assertions::assert_eq;

    const EPOCH: u64 = 1704067200000;

    fn identity(user_id: i64, role: &str) -> Identity {
        Identity {
            user_id,
            username: format!("user{}", user_id),
            role: role.into(),
        }
    }

    fn users_exist() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|id| {
            Ok(Some(User {
                id,
                ..User::default()
            }))
        });
        users
    }

    fn tweets_exist() -> MockTweetRepository {
        let mut tweets = MockTweetRepository::new();
        tweets
            .expect_find_by_id()
            .returning(|id| Ok(Some(Tweet::new(id, 1, "tweet".into()))));
        tweets
    }

    fn service<E: Edge>(
        users: MockUserRepository,
        tweets: MockTweetRepository,
    ) -> SocialServiceImpl<E, MemoryEdgeRepository<E>, MockUserRepository, MockTweetRepository> {
        SocialServiceImpl::new(
            Arc::new(MemoryEdgeRepository::new()),
            Arc::new(users),
            Arc::new(tweets),
            Arc::new(SnowflakeGenerator::new(1, EPOCH)),
        )
    }

    #[tokio::test]
    async fn test_follow_toggle_twice_returns_to_absent() {
        let svc = service::<Follow>(users_exist(), MockTweetRepository::new());
        let alice = identity(1, ROLE_USER);

        let first = svc.toggle(Some(&alice), 42).await.unwrap();
        let second = svc.toggle(Some(&alice), 42).await.unwrap();

        assert_eq!(first, EdgeState::Present);
        assert_eq!(second, EdgeState::Absent);
        assert!(svc.list_edges(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_toggle_twice_returns_to_absent() {
        let svc = service::<Like>(MockUserRepository::new(), tweets_exist());
        let bob = identity(2, ROLE_USER);

        assert_eq!(svc.toggle(Some(&bob), 10).await.unwrap(), EdgeState::Present);
        assert_eq!(svc.toggle(Some(&bob), 10).await.unwrap(), EdgeState::Absent);
    }

    #[tokio::test]
    async fn test_toggle_requires_login() {
        let svc = service::<Retweet>(MockUserRepository::new(), MockTweetRepository::new());

        let result = svc.toggle(None, 10).await;

        match result {
            Err(err @ SocialError::NotLoggedIn) => {
                assert_eq!(err.to_string(), "You are not logged in.")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let svc = service::<Follow>(users_exist(), MockTweetRepository::new());

        let result = svc.toggle(Some(&identity(5, ROLE_USER)), 5).await;

        match result {
            Err(SocialError::Validation(msg)) => assert_eq!(msg, "You cannot follow yourself."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_toggle_missing_tweet() {
        let mut tweets = MockTweetRepository::new();
        tweets.expect_find_by_id().returning(|_| Ok(None));
        let svc = service::<Like>(MockUserRepository::new(), tweets);

        let result = svc.toggle(Some(&identity(1, ROLE_USER)), 999).await;

        assert!(matches!(result, Err(SocialError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let svc = service::<Follow>(users_exist(), MockTweetRepository::new());
        let alice = identity(1, ROLE_USER);

        svc.toggle(Some(&alice), 42).await.unwrap();

        assert!(svc.remove(Some(&alice), 42).await.unwrap());
        assert!(!svc.remove(Some(&alice), 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_is_validation_error() {
        let svc = service::<Like>(MockUserRepository::new(), tweets_exist());
        let alice = identity(1, ROLE_USER);

        svc.create_edge(&alice, 10).await.unwrap();
        let duplicate = svc.create_edge(&alice, 10).await;

        match duplicate {
            Err(SocialError::Validation(msg)) => assert_eq!(msg, "You already liked this tweet."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_replace_requires_admin() {
        let svc = service::<Retweet>(users_exist(), tweets_exist());
        let alice = identity(1, ROLE_USER);
        let created = svc.create_edge(&alice, 10).await.unwrap();

        let denied = svc.replace_edge(&alice, created.id, 1, 11).await;
        assert!(matches!(denied, Err(SocialError::Forbidden)));

        let replaced = svc
            .replace_edge(&identity(9, ROLE_ADMIN), created.id, 1, 11)
            .await
            .unwrap();
        assert_eq!(replaced.tweet_id, 11);
        assert_eq!(replaced.id, created.id);
    }

    #[tokio::test]
    async fn test_delete_edge_owner_only() {
        let svc = service::<Follow>(users_exist(), MockTweetRepository::new());
        let created = svc.create_edge(&identity(1, ROLE_USER), 2).await.unwrap();

        let denied = svc.delete_edge(&identity(3, ROLE_USER), created.id).await;
        assert!(matches!(denied, Err(SocialError::Forbidden)));

        svc.delete_edge(&identity(1, ROLE_USER), created.id)
            .await
            .unwrap();
        assert!(matches!(
            svc.get_edge(created.id).await,
            Err(SocialError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_never_duplicate() {
        let svc = Arc::new(service::<Like>(MockUserRepository::new(), tweets_exist()));
        let alice = identity(1, ROLE_USER);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let svc = Arc::clone(&svc);
            let alice = alice.clone();
            handles.push(tokio::spawn(async move {
                svc.toggle(Some(&alice), 10).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // An even number of toggles always lands back on "absent".
        let remaining = svc.list_edges(100).await.unwrap();
        assert!(remaining.is_empty());
    }
}
