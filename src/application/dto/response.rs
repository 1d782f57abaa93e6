//! Response DTOs
//!
//! Data structures for API response bodies. Every successful body is an
//! [`Envelope`]: `{ "success": true, ...payload }`. Failures are rendered by
//! [`crate::shared::error::AppError`] as `{ "success": false, "errorMessage": ... }`.
//!
//! Snowflake ids are serialized as strings so JavaScript clients keep full
//! precision.

use serde::Serialize;

use crate::application::services::{AccessToken, Profile};
use crate::domain::{Comment, EdgeState, FeedEntry, Follow, Like, Retweet, Tweet, User};

/// Successful API envelope
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Envelope without payload
#[derive(Debug, Serialize)]
pub struct Empty {}

/// User response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub role: String,
    pub created_at: String,
}

impl UserResponse {
    /// Emails are only shown to the account owner and admins.
    pub fn from_user(user: User, include_email: bool) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: if include_email { Some(user.email) } else { None },
            bio: user.bio,
            profile_picture: user.profile_picture,
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Tweet response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

impl From<Tweet> for TweetResponse {
    fn from(tweet: Tweet) -> Self {
        Self {
            id: tweet.id.to_string(),
            user_id: tweet.user_id.to_string(),
            content: tweet.content,
            created_at: tweet.created_at.to_rfc3339(),
        }
    }
}

/// Feed entry response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntryResponse {
    #[serde(flatten)]
    pub tweet: TweetResponse,
    pub author: String,
    pub likes: i64,
    pub retweets: i64,
    pub comments: i64,
    pub liked_by_me: bool,
    pub retweeted_by_me: bool,
}

impl From<FeedEntry> for FeedEntryResponse {
    fn from(entry: FeedEntry) -> Self {
        Self {
            tweet: entry.tweet.into(),
            author: entry.author,
            likes: entry.likes,
            retweets: entry.retweets,
            comments: entry.comments,
            liked_by_me: entry.liked_by_me,
            retweeted_by_me: entry.retweeted_by_me,
        }
    }
}

/// Comment response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub tweet_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            tweet_id: comment.tweet_id.to_string(),
            user_id: comment.user_id.to_string(),
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Follow response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub id: String,
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: String,
}

impl From<Follow> for FollowResponse {
    fn from(follow: Follow) -> Self {
        Self {
            id: follow.id.to_string(),
            follower_id: follow.follower_id.to_string(),
            followed_id: follow.followed_id.to_string(),
            created_at: follow.created_at.to_rfc3339(),
        }
    }
}

/// Like or retweet response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetEdgeResponse {
    pub id: String,
    pub user_id: String,
    pub tweet_id: String,
    pub created_at: String,
}

impl From<Like> for TweetEdgeResponse {
    fn from(like: Like) -> Self {
        Self {
            id: like.id.to_string(),
            user_id: like.user_id.to_string(),
            tweet_id: like.tweet_id.to_string(),
            created_at: like.created_at.to_rfc3339(),
        }
    }
}

impl From<Retweet> for TweetEdgeResponse {
    fn from(retweet: Retweet) -> Self {
        Self {
            id: retweet.id.to_string(),
            user_id: retweet.user_id.to_string(),
            tweet_id: retweet.tweet_id.to_string(),
            created_at: retweet.created_at.to_rfc3339(),
        }
    }
}

/// Result of a toggle
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub state: EdgeState,
    pub active: bool,
}

impl From<EdgeState> for ToggleResponse {
    fn from(state: EdgeState) -> Self {
        Self {
            state,
            active: state.is_present(),
        }
    }
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub user: UserResponse,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl LoginResponse {
    pub fn new(user: User, token: AccessToken) -> Self {
        Self {
            user_id: user.id.to_string(),
            user: UserResponse::from_user(user, true),
            token: token.token,
            token_type: token.token_type,
            expires_in: token.expires_in,
        }
    }
}

/// Profile response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub followers: i64,
    pub following: i64,
    pub tweet_count: i64,
    pub tweets: Vec<TweetResponse>,
}

impl ProfileResponse {
    pub fn new(profile: Profile, include_email: bool) -> Self {
        Self {
            user: UserResponse::from_user(profile.user, include_email),
            followers: profile.followers,
            following: profile.following,
            tweet_count: profile.tweet_count,
            tweets: profile.tweets.into_iter().map(Into::into).collect(),
        }
    }
}

/// `{ "user": ... }`
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: UserResponse,
}

/// `{ "users": [...] }`
#[derive(Debug, Serialize)]
pub struct UsersPayload {
    pub users: Vec<UserResponse>,
}

/// `{ "tweet": ... }`
#[derive(Debug, Serialize)]
pub struct TweetPayload {
    pub tweet: TweetResponse,
}

/// `{ "tweets": [...] }`
#[derive(Debug, Serialize)]
pub struct TweetsPayload<T: Serialize> {
    pub tweets: Vec<T>,
}

/// `{ "comment": ... }`
#[derive(Debug, Serialize)]
pub struct CommentPayload {
    pub comment: CommentResponse,
}

/// `{ "comments": [...] }`
#[derive(Debug, Serialize)]
pub struct CommentsPayload {
    pub comments: Vec<CommentResponse>,
}

/// `{ "edge": ... }`
#[derive(Debug, Serialize)]
pub struct EdgePayload<T: Serialize> {
    pub edge: T,
}

/// `{ "edges": [...] }`
#[derive(Debug, Serialize)]
pub struct EdgesPayload<T: Serialize> {
    pub edges: Vec<T>,
}

/// `{ "profile": ... }`
#[derive(Debug, Serialize)]
pub struct ProfilePayload {
    pub profile: ProfileResponse,
}

/// `{ "removed": bool }`
#[derive(Debug, Serialize)]
pub struct RemovedPayload {
    pub removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_flattens_payload() {
        let body = Envelope::ok(ToggleResponse::from(EdgeState::Present));

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "success": true, "state": "present", "active": true })
        );
    }

    #[test]
    fn test_empty_envelope() {
        assert_eq!(
            serde_json::to_value(Envelope::ok(Empty {})).unwrap(),
            json!({ "success": true })
        );
    }

    #[test]
    fn test_user_response_hides_email_and_hash() {
        let user = User {
            id: 7212345678901234567,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "secret".into(),
            ..User::default()
        };

        let value = serde_json::to_value(UserResponse::from_user(user, false)).unwrap();

        assert_eq!(value["id"], "7212345678901234567");
        assert!(value.get("email").is_none());
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["profilePicture"], serde_json::Value::Null);
    }

    #[test]
    fn test_feed_entry_is_flat() {
        let entry = FeedEntry {
            tweet: Tweet::new(1, 2, "hi".into()),
            author: "bob".into(),
            likes: 3,
            retweets: 0,
            comments: 1,
            liked_by_me: true,
            retweeted_by_me: false,
        };

        let value = serde_json::to_value(FeedEntryResponse::from(entry)).unwrap();

        assert_eq!(value["content"], "hi");
        assert_eq!(value["userId"], "2");
        assert_eq!(value["likedByMe"], true);
    }
}
