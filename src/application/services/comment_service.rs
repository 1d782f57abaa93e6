//! Comment Service
//!
//! Comments are plain insertions attached to a tweet; unlike the social
//! edges they never toggle.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use validator::Validate;

use crate::domain::{check_content, Comment, CommentRepository, TweetRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;
use crate::shared::validation::validate;

use super::authorization::{Identity, NOT_ALLOWED, NOT_LOGGED_IN};

/// Comment service trait
#[async_trait]
pub trait CommentService: Send + Sync {
    /// Recent comments, optionally restricted to one tweet.
    async fn list_comments(
        &self,
        tweet_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Comment>, CommentError>;

    async fn get_comment(&self, comment_id: i64) -> Result<Comment, CommentError>;

    /// Attach a comment from the caller to a tweet.
    async fn create_comment(
        &self,
        actor: Option<&Identity>,
        comment: NewComment,
    ) -> Result<Comment, CommentError>;

    /// Replace a comment's content. Owner or admin.
    async fn replace_comment(
        &self,
        actor: &Identity,
        comment_id: i64,
        content: String,
    ) -> Result<Comment, CommentError>;

    /// Delete a comment. Owner or admin.
    async fn delete_comment(&self, actor: &Identity, comment_id: i64) -> Result<(), CommentError>;
}

/// Comment submission
#[derive(Debug, Clone, Validate)]
pub struct NewComment {
    #[validate(range(min = 1, message = "A tweet is required"))]
    pub tweet_id: i64,

    #[validate(length(min = 1, max = 280, message = "Content must be 1-280 characters"))]
    pub content: String,
}

/// Comment service errors
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Comment not found.")]
    NotFound,

    #[error("{}", NOT_LOGGED_IN)]
    NotLoggedIn,

    #[error("{}", NOT_ALLOWED)]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CommentError> for AppError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::NotFound => AppError::NotFound(err.to_string()),
            CommentError::NotLoggedIn => AppError::Unauthorized(err.to_string()),
            CommentError::Forbidden => AppError::Forbidden(err.to_string()),
            CommentError::Validation(msg) => AppError::Validation(msg),
            CommentError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// CommentService implementation
pub struct CommentServiceImpl<C, T>
where
    C: CommentRepository + ?Sized,
    T: TweetRepository + ?Sized,
{
    comment_repo: Arc<C>,
    tweet_repo: Arc<T>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, T> CommentServiceImpl<C, T>
where
    C: CommentRepository + ?Sized,
    T: TweetRepository + ?Sized,
{
    pub fn new(comment_repo: Arc<C>, tweet_repo: Arc<T>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            comment_repo,
            tweet_repo,
            id_generator,
        }
    }

    async fn load(&self, comment_id: i64) -> Result<Comment, CommentError> {
        self.comment_repo
            .find_by_id(comment_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?
            .ok_or(CommentError::NotFound)
    }
}

#[async_trait]
impl<C, T> CommentService for CommentServiceImpl<C, T>
where
    C: CommentRepository + ?Sized + 'static,
    T: TweetRepository + ?Sized + 'static,
{
    async fn list_comments(
        &self,
        tweet_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Comment>, CommentError> {
        let comments = match tweet_id {
            Some(tweet_id) => self.comment_repo.find_by_tweet(tweet_id).await,
            None => self.comment_repo.list(limit).await,
        };
        comments.map_err(|e| CommentError::Internal(e.to_string()))
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Comment, CommentError> {
        self.load(comment_id).await
    }

    #[instrument(skip(self, actor, comment), fields(tweet_id = comment.tweet_id))]
    async fn create_comment(
        &self,
        actor: Option<&Identity>,
        comment: NewComment,
    ) -> Result<Comment, CommentError> {
        let actor = actor.ok_or(CommentError::NotLoggedIn)?;

        // Field-level failures are logged one by one inside `validate`.
        validate(&comment).map_err(|e| CommentError::Validation(e.public_message()))?;
        check_content(&comment.content).map_err(|m| CommentError::Validation(m.into()))?;

        let tweet = self
            .tweet_repo
            .find_by_id(comment.tweet_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;
        if tweet.is_none() {
            tracing::warn!(field = "tweetId", "Validation failed: tweet does not exist");
            return Err(CommentError::Validation(
                "The tweet you are commenting on does not exist.".into(),
            ));
        }

        let new = Comment::new(
            self.id_generator.generate(),
            comment.tweet_id,
            actor.user_id,
            comment.content,
        );

        let created = self.comment_repo.create(&new).await.map_err(|e| match e {
            AppError::MissingReference { constraint } if constraint.contains("tweet_id") => {
                CommentError::Validation("The tweet you are commenting on does not exist.".into())
            }
            e => CommentError::Internal(e.to_string()),
        })?;

        tracing::info!(comment_id = created.id, user_id = actor.user_id, "Comment created");
        Ok(created)
    }

    #[instrument(skip(self, actor, content), fields(actor_id = actor.user_id))]
    async fn replace_comment(
        &self,
        actor: &Identity,
        comment_id: i64,
        content: String,
    ) -> Result<Comment, CommentError> {
        check_content(&content).map_err(|m| CommentError::Validation(m.into()))?;

        let mut comment = self.load(comment_id).await?;
        if !actor.can_modify(comment.user_id) {
            return Err(CommentError::Forbidden);
        }

        comment.content = content;

        self.comment_repo
            .update(&comment)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.user_id))]
    async fn delete_comment(&self, actor: &Identity, comment_id: i64) -> Result<(), CommentError> {
        let comment = self.load(comment_id).await?;
        if !actor.can_modify(comment.user_id) {
            return Err(CommentError::Forbidden);
        }

        self.comment_repo
            .delete(comment_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockCommentRepository, MockTweetRepository, Tweet, ROLE_ADMIN, ROLE_USER};

    const EPOCH: u64 = 1704067200000;

    fn identity(user_id: i64, role: &str) -> Identity {
        Identity {
            user_id,
            username: format!("user{}", user_id),
            role: role.into(),
        }
    }

    fn service(
        comments: MockCommentRepository,
        tweets: MockTweetRepository,
    ) -> CommentServiceImpl<MockCommentRepository, MockTweetRepository> {
        CommentServiceImpl::new(
            Arc::new(comments),
            Arc::new(tweets),
            Arc::new(SnowflakeGenerator::new(1, EPOCH)),
        )
    }

    fn submission(content: &str) -> NewComment {
        NewComment {
            tweet_id: 10,
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_login() {
        let svc = service(MockCommentRepository::new(), MockTweetRepository::new());

        let result = svc.create_comment(None, submission("nice")).await;

        match result {
            Err(err @ CommentError::NotLoggedIn) => {
                assert_eq!(err.to_string(), "You are not logged in.")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_comment() {
        let mut tweets = MockTweetRepository::new();
        tweets
            .expect_find_by_id()
            .returning(|id| Ok(Some(Tweet::new(id, 1, "tweet".into()))));
        let mut comments = MockCommentRepository::new();
        comments.expect_create().times(1).returning(|c| Ok(c.clone()));

        let created = service(comments, tweets)
            .create_comment(Some(&identity(5, ROLE_USER)), submission("nice"))
            .await
            .unwrap();

        assert_eq!(created.user_id, 5);
        assert_eq!(created.tweet_id, 10);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_content() {
        let svc = service(MockCommentRepository::new(), MockTweetRepository::new());

        let result = svc
            .create_comment(Some(&identity(5, ROLE_USER)), submission(""))
            .await;

        assert!(matches!(result, Err(CommentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_content() {
        let svc = service(MockCommentRepository::new(), MockTweetRepository::new());

        let result = svc
            .create_comment(Some(&identity(5, ROLE_USER)), submission("   "))
            .await;

        assert!(matches!(result, Err(CommentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_tweet() {
        let mut tweets = MockTweetRepository::new();
        tweets.expect_find_by_id().returning(|_| Ok(None));

        let result = service(MockCommentRepository::new(), tweets)
            .create_comment(Some(&identity(5, ROLE_USER)), submission("hello?"))
            .await;

        assert!(matches!(result, Err(CommentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_when_tweet_deleted_mid_request() {
        let mut tweets = MockTweetRepository::new();
        tweets
            .expect_find_by_id()
            .returning(|id| Ok(Some(Tweet::new(id, 1, "tweet".into()))));
        let mut comments = MockCommentRepository::new();
        comments.expect_create().returning(|_| {
            Err(AppError::MissingReference {
                constraint: "comments_tweet_id_fkey".into(),
            })
        });

        let result = service(comments, tweets)
            .create_comment(Some(&identity(5, ROLE_USER)), submission("hello?"))
            .await;

        match result {
            Err(CommentError::Validation(msg)) => {
                assert_eq!(msg, "The tweet you are commenting on does not exist.")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_by_tweet() {
        let mut comments = MockCommentRepository::new();
        comments
            .expect_find_by_tweet()
            .withf(|id| *id == 10)
            .returning(|id| Ok(vec![Comment::new(1, id, 2, "a".into())]));

        let listed = service(comments, MockTweetRepository::new())
            .list_comments(Some(10), 50)
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_other_users_comment() {
        let mut comments = MockCommentRepository::new();
        comments
            .expect_find_by_id()
            .returning(|id| Ok(Some(Comment::new(id, 10, 2, "a".into()))));
        comments.expect_delete().times(1).returning(|_| Ok(()));

        let svc = service(comments, MockTweetRepository::new());

        let denied = svc.delete_comment(&identity(3, ROLE_USER), 1).await;
        assert!(matches!(denied, Err(CommentError::Forbidden)));

        svc.delete_comment(&identity(3, ROLE_ADMIN), 1).await.unwrap();
    }
}
