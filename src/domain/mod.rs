//! # Domain Layer
//!
//! The domain layer contains the core business types of the social network.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Users, tweets, comments, social edges, sessions and the
//!   repository traits that persist them
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate domain rules (e.g. no self-follow)

pub mod entities;

// Re-export commonly used types
pub use entities::*;
