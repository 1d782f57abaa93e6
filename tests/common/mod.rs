//! Common Test Utilities
//!
//! Builds the real router over in-memory repositories and sessions, and
//! wraps the request sequences most tests need.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use chirp_server::config::{
    AuthSettings, CorsSettings, DatabaseSettings, JwtSettings, RedisSettings, ServerSettings,
    SessionBackend, SessionSettings, Settings, SnowflakeSettings, StorageBackend,
};
use chirp_server::domain::{UserRepository, ROLE_ADMIN};
use chirp_server::infrastructure::sessions::MemorySessionStore;
use chirp_server::startup::{build_router, AppState, Repositories};

pub const PASSWORD: &str = "Abcdef1!";
pub const COOKIE_NAME: &str = "chirp_session";

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
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
            secret: "integration-test-secret-0123456789abcdef".into(),
            issuer: "chirp-server".into(),
            audience: "chirp-client".into(),
            access_token_expiry_minutes: 15,
        },
        session: SessionSettings {
            backend: SessionBackend::Memory,
            cookie_name: COOKIE_NAME.into(),
            ttl_seconds: 3600,
            secure_cookie: false,
        },
        auth: AuthSettings {
            resolvers: vec!["bearer".into(), "session".into()],
        },
        snowflake: SnowflakeSettings {
            machine_id: 7,
            epoch: 1704067200000,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        log_format: "pretty".into(),
        environment: "test".into(),
    }
}

/// A logged-in test user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

/// Test application over in-memory backends
pub struct TestApp {
    pub server: TestServer,
    pub repos: Repositories,
}

impl TestApp {
    pub fn new() -> Self {
        let repos = Repositories::memory();
        let state = AppState::new(
            test_settings(),
            repos.clone(),
            Arc::new(MemorySessionStore::new()),
            None,
            None,
        );
        let server = TestServer::new(build_router(state)).unwrap();

        Self { server, repos }
    }

    pub async fn register(&self, username: &str) -> TestResponse {
        self.server
            .post("/api/users")
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
            }))
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.server
            .post("/api/users/login")
            .json(&json!({ "username": username, "password": password }))
            .await
    }

    /// Register and log in, returning the bearer token.
    pub async fn signup(&self, username: &str) -> TestUser {
        self.register(username).await.assert_status_success();

        let body: Value = self.login(username, PASSWORD).await.json();
        TestUser {
            id: body["userId"].as_str().unwrap().to_owned(),
            username: username.to_owned(),
            token: body["token"].as_str().unwrap().to_owned(),
        }
    }

    /// Register and log in a user, then grant them the admin role.
    pub async fn signup_admin(&self, username: &str) -> TestUser {
        let user = self.signup(username).await;

        let mut stored = self
            .repos
            .users
            .find_by_username(username)
            .await
            .unwrap()
            .unwrap();
        stored.role = ROLE_ADMIN.into();
        self.repos.users.update(&stored).await.unwrap();

        user
    }

    pub async fn post_tweet(&self, user: &TestUser, content: &str) -> String {
        let body: Value = self
            .server
            .post("/api/tweets")
            .authorization_bearer(&user.token)
            .json(&json!({ "content": content }))
            .await
            .json();

        body["tweet"]["id"].as_str().unwrap().to_owned()
    }
}
