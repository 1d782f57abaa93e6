//! # Chirp Server Library
//!
//! A Twitter-style social network API:
//! - Registration, login (session cookie and bearer token) and logout
//! - Tweets, comments and a home feed
//! - Follow, like and retweet toggles
//! - PostgreSQL or in-memory persistence, Redis or in-memory sessions
//!
//! ## Module Structure
//!
//! ```text
//! chirp_server/
//! +-- config/         Configuration management
//! +-- domain/         Entities and repository traits
//! +-- application/    Services and DTOs
//! +-- infrastructure/ PostgreSQL, in-memory and Redis implementations
//! +-- presentation/   HTTP routes, handlers and middleware
//! +-- shared/         Errors, snowflake IDs, validation
//! ```

pub mod config;

pub mod domain;

pub mod application;

pub mod infrastructure;

pub mod presentation;

pub mod shared;

pub mod startup;

pub mod telemetry;
