//! Request DTOs
//!
//! Data structures for API request bodies and query strings. Identifiers
//! are accepted either as JSON numbers or as strings, since responses
//! serialize them as strings.

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use crate::application::services::{NewComment, NewUser, UserUpdate};
use crate::domain::{ROLE_ADMIN, ROLE_USER};

/// Accept a Snowflake id as a number or a numeric string.
pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl serde::de::Visitor<'_> for IdVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer id or a numeric string")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom("id out of range"))
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim().parse().map_err(|_| E::custom("invalid id"))
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "id")] i64);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
}

/// Only the two known roles may be stored.
fn known_role(role: &str) -> Result<(), ValidationError> {
    if role == ROLE_USER || role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(ValidationError::new("role").with_message("Role must be 'user' or 'admin'".into()))
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 20, message = "Username must be 1-20 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    pub bio: Option<String>,

    pub profile_picture: Option<String>,
}

impl RegisterRequest {
    pub fn into_parts(self) -> (NewUser, String) {
        let user = NewUser {
            username: self.username,
            email: self.email,
            bio: self.bio,
            profile_picture: self.profile_picture,
        };
        (user, self.password)
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Full replacement of a user's profile
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 20, message = "Username must be 1-20 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    pub bio: Option<String>,

    pub profile_picture: Option<String>,

    #[validate(custom(function = "known_role"))]
    pub role: Option<String>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            bio: req.bio,
            profile_picture: req.profile_picture,
            role: req.role,
        }
    }
}

/// Tweet or comment body
#[derive(Debug, Deserialize, Validate)]
pub struct ContentRequest {
    #[validate(length(min = 1, max = 280, message = "Content must be 1-280 characters"))]
    pub content: String,
}

/// Comment submission
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(deserialize_with = "id")]
    pub tweet_id: i64,
    #[serde(default)]
    pub content: String,
}

impl From<CreateCommentRequest> for NewComment {
    fn from(req: CreateCommentRequest) -> Self {
        Self {
            tweet_id: req.tweet_id,
            content: req.content,
        }
    }
}

/// Target of a like or retweet
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetTargetRequest {
    #[serde(deserialize_with = "id")]
    pub tweet_id: i64,
}

/// Target of a follow
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTargetRequest {
    #[serde(deserialize_with = "id")]
    pub user_id: i64,
}

/// Full replacement of a social edge. Field names follow the edge type
/// (`followerId`/`followedId` for follows, `userId`/`tweetId` otherwise).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceEdgeRequest {
    #[serde(alias = "followerId", deserialize_with = "id")]
    pub user_id: i64,

    #[serde(alias = "tweetId", alias = "followedId", deserialize_with = "id")]
    pub target_id: i64,
}

/// Pagination and filtering for list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub tweet_id: Option<i64>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
