use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{EdgeKind, FeedEntry, TargetKind, Tweet, TweetRepository};
use crate::shared::error::AppError;

use super::{MemoryDatabase, Tables};

/// In-memory [`TweetRepository`].
#[derive(Clone)]
pub struct MemoryTweetRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryTweetRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }
}

/// Newest first, ties broken by id like the SQL `ORDER BY created_at DESC, id DESC`.
fn newest_first<'a>(tweets: impl Iterator<Item = &'a Tweet>, limit: i64) -> Vec<Tweet> {
    let mut tweets: Vec<Tweet> = tweets.cloned().collect();
    tweets.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    tweets.truncate(limit.max(0) as usize);
    tweets
}

/// Counts and reader flags for one tweet. `None` when the author row is gone,
/// matching the inner join on `users`.
fn feed_entry(tables: &Tables, reader_id: i64, tweet: Tweet) -> Option<FeedEntry> {
    let author = tables.users.get(&tweet.user_id)?.username.clone();
    let tweet_id = tweet.id;
    let on_tweet = |kind: EdgeKind| tables.edges(kind).filter(move |e| e.target_id == tweet_id);

    Some(FeedEntry {
        likes: on_tweet(EdgeKind::Like).count() as i64,
        retweets: on_tweet(EdgeKind::Retweet).count() as i64,
        comments: tables
            .comments
            .values()
            .filter(|c| c.tweet_id == tweet_id)
            .count() as i64,
        liked_by_me: on_tweet(EdgeKind::Like).any(|e| e.actor_id == reader_id),
        retweeted_by_me: on_tweet(EdgeKind::Retweet).any(|e| e.actor_id == reader_id),
        author,
        tweet,
    })
}

#[async_trait]
impl TweetRepository for MemoryTweetRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Tweet>, AppError> {
        Ok(self.db.tables.read().tweets.get(&id).cloned())
    }

    async fn list(&self, limit: i64) -> Result<Vec<Tweet>, AppError> {
        let tables = self.db.tables.read();
        Ok(newest_first(tables.tweets.values(), limit))
    }

    async fn find_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Tweet>, AppError> {
        let tables = self.db.tables.read();
        Ok(newest_first(
            tables.tweets.values().filter(|t| t.user_id == user_id),
            limit,
        ))
    }

    async fn feed_for(&self, user_id: i64, limit: i64) -> Result<Vec<FeedEntry>, AppError> {
        let tables = self.db.tables.read();
        let tweets = newest_first(
            tables
                .tweets
                .values()
                .filter(|t| t.user_id == user_id || tables.follows(user_id, t.user_id)),
            limit,
        );
        Ok(tweets
            .into_iter()
            .filter_map(|t| feed_entry(&tables, user_id, t))
            .collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, AppError> {
        let tables = self.db.tables.read();
        Ok(tables.tweets.values().filter(|t| t.user_id == user_id).count() as i64)
    }

    async fn create(&self, tweet: &Tweet) -> Result<Tweet, AppError> {
        let mut tables = self.db.tables.write();
        if tables.tweets.contains_key(&tweet.id) {
            return Err(AppError::ConstraintViolation {
                constraint: "tweets_pkey".into(),
            });
        }
        tables.check_reference("tweets", "user_id", TargetKind::User, tweet.user_id)?;
        tables.tweets.insert(tweet.id, tweet.clone());
        Ok(tweet.clone())
    }

    async fn update(&self, tweet: &Tweet) -> Result<Tweet, AppError> {
        let mut tables = self.db.tables.write();
        let stored = tables
            .tweets
            .get_mut(&tweet.id)
            .ok_or_else(|| AppError::NotFound(format!("Tweet with id {} not found", tweet.id)))?;

        stored.content = tweet.content.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.db.tables.write().delete_tweet(id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Tweet with id {} not found", id)))
        }
    }
}
