//! # Domain Entities
//!
//! Core domain entities representing the main business objects of the
//! social network. All entities map directly to their database tables.
//!
//! ## Core Entities
//!
//! - **User**: Account with credentials, profile and role
//! - **Tweet**: A short post owned by a user
//! - **Comment**: A reply attached to a tweet
//!
//! ## Social Edges
//!
//! - **Follow**: user -> user
//! - **Like**: user -> tweet
//! - **Retweet**: user -> tweet
//!
//! Edges share the [`Edge`] trait and the generic [`EdgeRepository`].
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod user;
mod tweet;
mod comment;
mod edge;
mod follow;
mod like;
mod retweet;
mod session;

pub use user::{User, UserRepository, ROLE_ADMIN, ROLE_USER};
pub use tweet::{check_content, FeedEntry, Tweet, TweetRepository, MAX_CONTENT_LENGTH};
pub use comment::{Comment, CommentRepository};
pub use edge::{Edge, EdgeKind, EdgeRepository, EdgeState, TargetKind};
pub use follow::Follow;
pub use like::Like;
pub use retweet::Retweet;
pub use session::{SessionData, SessionStore};

#[cfg(test)]
pub use user::MockUserRepository;
#[cfg(test)]
pub use tweet::MockTweetRepository;
#[cfg(test)]
pub use comment::MockCommentRepository;
#[cfg(test)]
pub use session::MockSessionStore;
