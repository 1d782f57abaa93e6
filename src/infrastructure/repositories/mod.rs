//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgUserRepository** - User accounts
//! - **PgTweetRepository** - Tweets, profile timelines and the home feed
//! - **PgCommentRepository** - Comments on tweets
//! - **PgEdgeRepository** - Follows, likes and retweets (generic over the edge type)
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::domain::Like;
//! use crate::infrastructure::repositories::{PgEdgeRepository, PgUserRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let like_repo = PgEdgeRepository::<Like>::new(pool.clone());
//! }
//! ```

pub mod user_repository;
pub mod tweet_repository;
pub mod comment_repository;
pub mod edge_repository;

pub use user_repository::PgUserRepository;
pub use tweet_repository::PgTweetRepository;
pub use comment_repository::PgCommentRepository;
pub use edge_repository::{EdgeTable, PgEdgeRepository};
