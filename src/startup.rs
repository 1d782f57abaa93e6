//! Application Startup
//!
//! Backend selection, service wiring and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    AuthService, AuthServiceImpl, BearerCredentialResolver, CommentService, CommentServiceImpl,
    CredentialChain, CredentialResolver, SessionCredentialResolver, SocialService,
    SocialServiceImpl, TokenCodec, TweetService, TweetServiceImpl, UserService, UserServiceImpl,
};
use crate::config::{SessionBackend, Settings, StorageBackend};
use crate::domain::{
    CommentRepository, EdgeRepository, Follow, Like, Retweet, SessionStore, TweetRepository,
    UserRepository,
};
use crate::infrastructure::memory::{
    MemoryCommentRepository, MemoryDatabase, MemoryEdgeRepository, MemoryTweetRepository,
    MemoryUserRepository,
};
use crate::infrastructure::repositories::{
    PgCommentRepository, PgEdgeRepository, PgTweetRepository, PgUserRepository,
};
use crate::infrastructure::sessions::{self, MemorySessionStore, RedisSessionStore};
use crate::infrastructure::database;
use crate::presentation::http::{handlers::health, routes};
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UserService>,
    pub tweets: Arc<dyn TweetService>,
    pub comments: Arc<dyn CommentService>,
    pub follows: Arc<dyn SocialService<Follow>>,
    pub likes: Arc<dyn SocialService<Like>>,
    pub retweets: Arc<dyn SocialService<Retweet>>,
    pub credentials: CredentialChain,
    /// Present only with the postgres backend
    pub db: Option<PgPool>,
    /// Present only with the redis session backend
    pub redis: Option<ConnectionManager>,
}

/// The persistence gateway: one repository per entity.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tweets: Arc<dyn TweetRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn EdgeRepository<Follow>>,
    pub likes: Arc<dyn EdgeRepository<Like>>,
    pub retweets: Arc<dyn EdgeRepository<Retweet>>,
}

impl Repositories {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tweets: Arc::new(PgTweetRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            follows: Arc::new(PgEdgeRepository::<Follow>::new(pool.clone())),
            likes: Arc::new(PgEdgeRepository::<Like>::new(pool.clone())),
            retweets: Arc::new(PgEdgeRepository::<Retweet>::new(pool.clone())),
        }
    }

    /// All repositories over one set of in-process tables, so deletes
    /// cascade the same way the database does.
    pub fn memory() -> Self {
        let db = MemoryDatabase::new();
        Self {
            users: Arc::new(MemoryUserRepository::new(db.clone())),
            tweets: Arc::new(MemoryTweetRepository::new(db.clone())),
            comments: Arc::new(MemoryCommentRepository::new(db.clone())),
            follows: Arc::new(MemoryEdgeRepository::<Follow>::shared(db.clone())),
            likes: Arc::new(MemoryEdgeRepository::<Like>::shared(db.clone())),
            retweets: Arc::new(MemoryEdgeRepository::<Retweet>::shared(db)),
        }
    }
}

impl AppState {
    /// Wire every service over the given repositories and session store.
    pub fn new(
        settings: Settings,
        repos: Repositories,
        sessions: Arc<dyn SessionStore>,
        db: Option<PgPool>,
        redis: Option<ConnectionManager>,
    ) -> Self {
        let ids = Arc::new(SnowflakeGenerator::new(
            u64::from(settings.snowflake.machine_id),
            settings.snowflake.epoch,
        ));
        let tokens = Arc::new(TokenCodec::new(settings.jwt.clone()));

        let credentials = build_credential_chain(
            &settings.auth.resolvers,
            repos.users.clone(),
            sessions.clone(),
            tokens.clone(),
        );
        tracing::info!(resolvers = ?credentials.resolver_names(), "Credential chain ready");

        let auth = AuthServiceImpl::new(
            repos.users.clone(),
            sessions,
            ids.clone(),
            tokens,
            settings.session.ttl_seconds,
        );
        let users = UserServiceImpl::new(
            repos.users.clone(),
            repos.tweets.clone(),
            repos.follows.clone(),
        );
        let tweets = TweetServiceImpl::new(repos.tweets.clone(), ids.clone());
        let comments =
            CommentServiceImpl::new(repos.comments.clone(), repos.tweets.clone(), ids.clone());
        let follows = SocialServiceImpl::<Follow, _, _, _>::new(
            repos.follows,
            repos.users.clone(),
            repos.tweets.clone(),
            ids.clone(),
        );
        let likes = SocialServiceImpl::<Like, _, _, _>::new(
            repos.likes,
            repos.users.clone(),
            repos.tweets.clone(),
            ids.clone(),
        );
        let retweets = SocialServiceImpl::<Retweet, _, _, _>::new(
            repos.retweets,
            repos.users,
            repos.tweets,
            ids,
        );

        Self {
            settings: Arc::new(settings),
            auth: Arc::new(auth),
            users: Arc::new(users),
            tweets: Arc::new(tweets),
            comments: Arc::new(comments),
            follows: Arc::new(follows),
            likes: Arc::new(likes),
            retweets: Arc::new(retweets),
            credentials,
            db,
            redis,
        }
    }

    /// State over in-memory repositories and sessions.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(
            settings,
            Repositories::memory(),
            Arc::new(MemorySessionStore::new()),
            None,
            None,
        )
    }
}

/// Resolvers in the configured order. Names are checked by
/// [`Settings::validate`].
fn build_credential_chain(
    names: &[String],
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenCodec>,
) -> CredentialChain {
    let resolvers = names
        .iter()
        .filter_map(|name| -> Option<Arc<dyn CredentialResolver>> {
            match name.as_str() {
                "bearer" => Some(Arc::new(BearerCredentialResolver::new(
                    users.clone(),
                    tokens.clone(),
                ))),
                "session" => Some(Arc::new(SessionCredentialResolver::new(
                    sessions.clone(),
                    users.clone(),
                ))),
                other => {
                    tracing::warn!(resolver = other, "Ignoring unknown credential resolver");
                    None
                }
            }
        })
        .collect();

    CredentialChain::new(resolvers)
}

/// Router with every route and the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    routes::create_router(state)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let (repos, db) = match settings.database.backend {
            StorageBackend::Postgres => {
                let pool = database::create_pool(&settings.database)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                tracing::info!("Database connection pool created");

                if settings.database.run_migrations {
                    database::run_migrations(&pool)
                        .await
                        .context("Failed to run database migrations")?;
                    tracing::info!("Database migrations applied");
                }

                (Repositories::postgres(&pool), Some(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                (Repositories::memory(), None)
            }
        };

        let (store, redis) = match settings.session.backend {
            SessionBackend::Redis => {
                let redis = sessions::create_redis_client(&settings.redis)
                    .await
                    .context("Failed to connect to Redis")?;
                let store: Arc<dyn SessionStore> = Arc::new(RedisSessionStore::new(redis.clone()));
                (store, Some(redis))
            }
            SessionBackend::Memory => {
                tracing::warn!("Using in-memory sessions; logins are lost on shutdown");
                let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
                (store, None)
            }
        };

        let addr: SocketAddr = settings
            .server_addr()
            .parse()
            .with_context(|| format!("Invalid listen address {}", settings.server_addr()))?;

        let state = AppState::new(settings, repos, store, db, redis);
        let router = build_router(state);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until ctrl-c
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
