//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Credentials, registration, login/logout
//! - **Authorization**: Credential resolvers and role checks
//! - **UserService**: Profiles and account management
//! - **TweetService**: Tweet CRUD and the home feed
//! - **CommentService**: Comment CRUD
//! - **SocialService**: Follow/like/retweet toggles and edge CRUD

pub mod auth_service;
pub mod authorization;
pub mod comment_service;
pub mod social_service;
pub mod token;
pub mod tweet_service;
pub mod user_service;

// Re-export auth service types
pub use auth_service::{AuthError, AuthService, AuthServiceImpl, LoginSession, NewUser};
pub use token::{AccessToken, Claims, TokenCodec};

// Re-export authorization types
pub use authorization::{
    authorize, BearerCredentialResolver, CredentialChain, CredentialResolver, Identity,
    RequestCredentials, SessionCredentialResolver, NOT_ALLOWED, NOT_LOGGED_IN,
};

// Re-export user service types
pub use user_service::{Profile, UserError, UserService, UserServiceImpl, UserUpdate};

// Re-export tweet service types
pub use tweet_service::{TweetError, TweetService, TweetServiceImpl};

// Re-export comment service types
pub use comment_service::{CommentError, CommentService, CommentServiceImpl, NewComment};

// Re-export social service types
pub use social_service::{SocialError, SocialService, SocialServiceImpl};
