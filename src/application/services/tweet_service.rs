//! Tweet Service
//!
//! Tweet CRUD plus the home feed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::domain::{check_content, FeedEntry, Tweet, TweetRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

use super::authorization::{Identity, NOT_ALLOWED};

/// Tweet service trait
#[async_trait]
pub trait TweetService: Send + Sync {
    /// Most recent tweets across all users.
    async fn list_tweets(&self, limit: i64) -> Result<Vec<Tweet>, TweetError>;

    async fn get_tweet(&self, tweet_id: i64) -> Result<Tweet, TweetError>;

    /// Post a tweet authored by the caller.
    async fn create_tweet(&self, actor: &Identity, content: String) -> Result<Tweet, TweetError>;

    /// Replace a tweet's content. Owner or admin.
    async fn replace_tweet(
        &self,
        actor: &Identity,
        tweet_id: i64,
        content: String,
    ) -> Result<Tweet, TweetError>;

    /// Delete a tweet. Owner or admin.
    async fn delete_tweet(&self, actor: &Identity, tweet_id: i64) -> Result<(), TweetError>;

    /// The caller's tweets and those of everyone they follow, newest first.
    async fn feed(&self, actor: &Identity, limit: i64) -> Result<Vec<FeedEntry>, TweetError>;
}

/// Tweet service errors
#[derive(Debug, thiserror::Error)]
pub enum TweetError {
    #[error("Tweet not found.")]
    NotFound,

    #[error("{}", NOT_ALLOWED)]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TweetError> for AppError {
    fn from(err: TweetError) -> Self {
        match err {
            TweetError::NotFound => AppError::NotFound(err.to_string()),
            TweetError::Forbidden => AppError::Forbidden(err.to_string()),
            TweetError::Validation(msg) => AppError::Validation(msg),
            TweetError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// TweetService implementation
pub struct TweetServiceImpl<T: TweetRepository + ?Sized> {
    tweet_repo: Arc<T>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<T: TweetRepository + ?Sized> TweetServiceImpl<T> {
    pub fn new(tweet_repo: Arc<T>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            tweet_repo,
            id_generator,
        }
    }

    async fn load(&self, tweet_id: i64) -> Result<Tweet, TweetError> {
        self.tweet_repo
            .find_by_id(tweet_id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?
            .ok_or(TweetError::NotFound)
    }
}

#[async_trait]
impl<T: TweetRepository + ?Sized + 'static> TweetService for TweetServiceImpl<T> {
    async fn list_tweets(&self, limit: i64) -> Result<Vec<Tweet>, TweetError> {
        self.tweet_repo
            .list(limit)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))
    }

    async fn get_tweet(&self, tweet_id: i64) -> Result<Tweet, TweetError> {
        self.load(tweet_id).await
    }

    #[instrument(skip(self, actor, content), fields(actor_id = actor.user_id))]
    async fn create_tweet(&self, actor: &Identity, content: String) -> Result<Tweet, TweetError> {
        check_content(&content).map_err(|m| TweetError::Validation(m.into()))?;

        let tweet = Tweet::new(self.id_generator.generate(), actor.user_id, content);

        let created = self
            .tweet_repo
            .create(&tweet)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        tracing::info!(tweet_id = created.id, "Tweet created");
        Ok(created)
    }

    #[instrument(skip(self, actor, content), fields(actor_id = actor.user_id))]
    async fn replace_tweet(
        &self,
        actor: &Identity,
        tweet_id: i64,
        content: String,
    ) -> Result<Tweet, TweetError> {
        check_content(&content).map_err(|m| TweetError::Validation(m.into()))?;

        let mut tweet = self.load(tweet_id).await?;
        if !actor.can_modify(tweet.user_id) {
            return Err(TweetError::Forbidden);
        }

        tweet.content = content;

        self.tweet_repo
            .update(&tweet)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.user_id))]
    async fn delete_tweet(&self, actor: &Identity, tweet_id: i64) -> Result<(), TweetError> {
        let tweet = self.load(tweet_id).await?;
        if !actor.can_modify(tweet.user_id) {
            return Err(TweetError::Forbidden);
        }

        self.tweet_repo
            .delete(tweet_id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        tracing::info!(tweet_id, "Tweet deleted");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.user_id))]
    async fn feed(&self, actor: &Identity, limit: i64) -> Result<Vec<FeedEntry>, TweetError> {
        self.tweet_repo
            .feed_for(actor.user_id, limit)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockTweetRepository, ROLE_ADMIN, ROLE_USER};

    const EPOCH: u64 = 1704067200000;

    fn identity(user_id: i64, role: &str) -> Identity {
        Identity {
            user_id,
            username: format!("user{}", user_id),
            role: role.into(),
        }
    }

    fn service(tweets: MockTweetRepository) -> TweetServiceImpl<MockTweetRepository> {
        TweetServiceImpl::new(
            Arc::new(tweets),
            Arc::new(SnowflakeGenerator::new(1, EPOCH)),
        )
    }
    #[tokio::test]
    async fn test_create_tweet_sets_author() {
        let mut tweets = MockTweetRepository::new();
        tweets.expect_create().returning(|t| Ok(t.clone()));

        let created = service(tweets)
            .create_tweet(&identity(7, ROLE_USER), "hello world".into())
            .await
            .unwrap();

        assert_eq!(created.user_id, 7);
        assert_eq!(created.content, "hello world");
    }

    #[tokio::test]
    async fn test_create_tweet_rejects_empty_and_long() {
        let svc = service(MockTweetRepository::new());

        let empty = svc.create_tweet(&identity(7, ROLE_USER), "".into()).await;
        let long = svc
            .create_tweet(&identity(7, ROLE_USER), "x".repeat(281))
            .await;

        assert!(matches!(empty, Err(TweetError::Validation(_))));
        assert!(matches!(long, Err(TweetError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_foreign_tweet_forbidden() {
        let mut tweets = MockTweetRepository::new();
        tweets
            .expect_find_by_id()
            .returning(|id| Ok(Some(Tweet::new(id, 1, "mine".into()))));

        let result = service(tweets)
            .delete_tweet(&identity(2, ROLE_USER), 10)
            .await;

        assert!(matches!(result, Err(TweetError::Forbidden)));
    }

    #[tokio::test]
    async fn test_admin_replaces_foreign_tweet() {
        let mut tweets = MockTweetRepository::new();
        tweets
            .expect_find_by_id()
            .returning(|id| Ok(Some(Tweet::new(id, 1, "old".into()))));
        tweets.expect_update().returning(|t| Ok(t.clone()));

        let updated = service(tweets)
            .replace_tweet(&identity(2, ROLE_ADMIN), 10, "new".into())
            .await
            .unwrap();

        assert_eq!(updated.content, "new");
        assert_eq!(updated.user_id, 1);
    }

    #[tokio::test]
    async fn test_get_missing_tweet() {
        let mut tweets = MockTweetRepository::new();
        tweets.expect_find_by_id().returning(|_| Ok(None));

        let result = service(tweets).get_tweet(99).await;

        assert!(matches!(result, Err(TweetError::NotFound)));
    }

    #[tokio::test]
    async fn test_feed_reads_one_query_for_the_caller() {
        let mut tweets = MockTweetRepository::new();
        tweets
            .expect_feed_for()
            .withf(|user_id, limit| *user_id == 1 && *limit == 20)
            .times(1)
            .returning(|_, _| {
                Ok(vec![FeedEntry {
                    tweet: Tweet::new(10, 2, "hi".into()),
                    author: "user2".into(),
                    likes: 4,
                    retweets: 1,
                    comments: 3,
                    liked_by_me: true,
                    retweeted_by_me: false,
                }])
            });

        let feed = service(tweets)
            .feed(&identity(1, ROLE_USER), 20)
            .await
            .unwrap();

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].author, "user2");
        assert_eq!((feed[0].likes, feed[0].comments), (4, 3));
        assert!(feed[0].liked_by_me);
    }
}
