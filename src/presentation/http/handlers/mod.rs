//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod comments;
pub mod health;
pub mod social;
pub mod tweets;
pub mod users;
