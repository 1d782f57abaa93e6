//! Tweet Repository Implementation
//!
//! PostgreSQL implementation of the TweetRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{FeedEntry, Tweet, TweetRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct TweetRow {
    id: i64,
    user_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl TweetRow {
    fn into_tweet(self) -> Tweet {
        Tweet {
            id: self.id,
            user_id: self.user_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

/// A feed tweet with its aggregates, as returned by [`FEED_SQL`].
#[derive(Debug, sqlx::FromRow)]
struct FeedRow {
    #[sqlx(flatten)]
    tweet: TweetRow,
    author: String,
    likes: i64,
    retweets: i64,
    comments: i64,
    liked_by_me: bool,
    retweeted_by_me: bool,
}

impl FeedRow {
    fn into_entry(self) -> FeedEntry {
        FeedEntry {
            tweet: self.tweet.into_tweet(),
            author: self.author,
            likes: self.likes,
            retweets: self.retweets,
            comments: self.comments,
            liked_by_me: self.liked_by_me,
            retweeted_by_me: self.retweeted_by_me,
        }
    }
}

/// Home feed of `$1`: own and followed tweets, counted and flagged in one
/// statement. Each subquery is served by the `*_tweet_id` indexes.
const FEED_SQL: &str = r#"
    SELECT t.id, t.user_id, t.content, t.created_at,
           u.username AS author,
           (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS likes,
           (SELECT COUNT(*) FROM retweets r WHERE r.tweet_id = t.id) AS retweets,
           (SELECT COUNT(*) FROM comments c WHERE c.tweet_id = t.id) AS comments,
           EXISTS (SELECT 1 FROM likes l WHERE l.tweet_id = t.id AND l.user_id = $1)
               AS liked_by_me,
           EXISTS (SELECT 1 FROM retweets r WHERE r.tweet_id = t.id AND r.user_id = $1)
               AS retweeted_by_me
    FROM tweets t
    JOIN users u ON u.id = t.user_id
    WHERE t.user_id = $1
       OR t.user_id IN (SELECT followed_id FROM follows WHERE follower_id = $1)
    ORDER BY t.created_at DESC, t.id DESC
    LIMIT $2
"#;

/// PostgreSQL tweet repository implementation.
#[derive(Clone)]
pub struct PgTweetRepository {
    pool: PgPool,
}

impl PgTweetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TweetRepository for PgTweetRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Tweet>, AppError> {
        let row = sqlx::query_as::<_, TweetRow>(
            "SELECT id, user_id, content, created_at FROM tweets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TweetRow::into_tweet))
    }

    async fn list(&self, limit: i64) -> Result<Vec<Tweet>, AppError> {
        let rows = sqlx::query_as::<_, TweetRow>(
            r#"
            SELECT id, user_id, content, created_at
            FROM tweets
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TweetRow::into_tweet).collect())
    }

    async fn find_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Tweet>, AppError> {
        let rows = sqlx::query_as::<_, TweetRow>(
            r#"
            SELECT id, user_id, content, created_at
            FROM tweets
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TweetRow::into_tweet).collect())
    }

    async fn feed_for(&self, user_id: i64, limit: i64) -> Result<Vec<FeedEntry>, AppError> {
        let rows = sqlx::query_as::<_, FeedRow>(FEED_SQL)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(FeedRow::into_entry).collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tweets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, tweet: &Tweet) -> Result<Tweet, AppError> {
        let row = sqlx::query_as::<_, TweetRow>(
            r#"
            INSERT INTO tweets (id, user_id, content, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, content, created_at
            "#,
        )
        .bind(tweet.id)
        .bind(tweet.user_id)
        .bind(&tweet.content)
        .bind(tweet.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from_write)?;

        Ok(row.into_tweet())
    }

    async fn update(&self, tweet: &Tweet) -> Result<Tweet, AppError> {
        let row = sqlx::query_as::<_, TweetRow>(
            r#"
            UPDATE tweets
            SET content = $2
            WHERE id = $1
            RETURNING id, user_id, content, created_at
            "#,
        )
        .bind(tweet.id)
        .bind(&tweet.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from_write)?
        .ok_or_else(|| AppError::NotFound(format!("Tweet with id {} not found", tweet.id)))?;

        Ok(row.into_tweet())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tweet with id {} not found", id)));
        }

        Ok(())
    }
}
