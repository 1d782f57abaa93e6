//! Session Stores
//!
//! Server-side storage for login sessions.
//!
//! - [`RedisSessionStore`]: production store; each session is one key with a TTL
//! - [`MemorySessionStore`]: process-local store for development and tests
//!
//! Session ids are random UUIDs handed to the browser in an HTTP-only
//! cookie. Only a SHA-256 digest of the id is used as the storage key, so a
//! dump of the store does not reveal usable cookies.

mod memory_store;
mod redis_store;

pub use memory_store::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use redis::aio::ConnectionManager;
use redis::Client;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::RedisSettings;

/// Key prefix for session entries.
pub const SESSION_KEY_PREFIX: &str = "session:";

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Fresh opaque session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Storage key for a session id.
pub fn session_key(session_id: &str) -> String {
    let digest = Sha256::digest(session_id.as_bytes());
    format!("{}{:x}", SESSION_KEY_PREFIX, digest)
}
