//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Persistence configuration (PostgreSQL or in-memory)
    pub database: DatabaseSettings,

    /// Redis configuration (session storage)
    pub redis: RedisSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// Server-side session settings
    pub session: SessionSettings,

    /// Credential resolution settings
    pub auth: AuthSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Log output format ("pretty" or "json")
    pub log_format: String,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Which persistence gateway backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Storage backend for entities
    pub backend: StorageBackend,

    /// Database connection URL (required for the postgres backend)
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Symmetric secret for signing tokens
    pub secret: String,

    /// Expected `iss` claim
    pub issuer: String,

    /// Expected `aud` claim
    pub audience: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
}

/// Which store keeps server-side sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

/// Server-side session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Session storage backend
    pub backend: SessionBackend,

    /// Name of the HTTP-only session cookie
    pub cookie_name: String,

    /// Session lifetime in seconds
    pub ttl_seconds: u64,

    /// Mark the session cookie `Secure`
    pub secure_cookie: bool,
}

/// Credential resolution configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Resolver order, any of "bearer" and "session"
    pub resolvers: Vec<String>,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if any cross-field check in [`Settings::validate`] fails.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("log_format", "pretty")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("jwt.issuer", "chirp-server")?
            .set_default("jwt.audience", "chirp-client")?
            .set_default("jwt.access_token_expiry_minutes", 60)?
            .set_default("session.backend", "redis")?
            .set_default("session.cookie_name", "chirp_session")?
            .set_default("session.ttl_seconds", 60 * 60 * 24)?
            .set_default("session.secure_cookie", false)?
            .set_default("auth.resolvers", vec!["bearer", "session"])?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", 1704067200000_u64)?
            .set_default("cors.allowed_origins", vec!["http://localhost:4200"])?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("auth.resolvers")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }

        if self.database.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url is required when database.backend = \"postgres\"".into(),
            ));
        }

        if self.auth.resolvers.is_empty() {
            return Err(ConfigError::Message(
                "auth.resolvers must name at least one credential resolver".into(),
            ));
        }

        if let Some(unknown) = self
            .auth
            .resolvers
            .iter()
            .find(|r| !matches!(r.as_str(), "bearer" | "session"))
        {
            return Err(ConfigError::Message(format!(
                "Unknown credential resolver '{}', expected \"bearer\" or \"session\"",
                unknown
            )));
        }

        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
impl Settings {
    /// In-memory settings for unit tests.
    pub(crate) fn for_tests() -> Self {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".into(),
                port: 3000,
            },
            database: DatabaseSettings {
                backend: StorageBackend::Memory,
                url: String::new(),
                max_connections: 1,
                min_connections: 1,
                acquire_timeout: 1,
                run_migrations: false,
            },
            redis: RedisSettings {
                url: "redis://127.0.0.1:6379".into(),
            },
            jwt: JwtSettings {
                secret: "0123456789abcdef0123456789abcdef".into(),
                issuer: "chirp-server".into(),
                audience: "chirp-client".into(),
                access_token_expiry_minutes: 60,
            },
            session: SessionSettings {
                backend: SessionBackend::Memory,
                cookie_name: "chirp_session".into(),
                ttl_seconds: 3600,
                secure_cookie: false,
            },
            auth: AuthSettings {
                resolvers: vec!["bearer".into(), "session".into()],
            },
            snowflake: SnowflakeSettings {
                machine_id: 1,
                epoch: 1704067200000,
            },
            cors: CorsSettings {
                allowed_origins: vec![],
            },
            log_format: "pretty".into(),
            environment: "test".into(),
        }
    }
}
