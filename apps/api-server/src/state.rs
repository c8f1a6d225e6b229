//! Application state - shared across all handlers.

use std::sync::Arc;

use conduit_core::domain::SlugAllocator;
use conduit_core::ports::{AuthError, PasswordService, RateLimitError, RateLimiter};
use conduit_core::services::{AccountService, ContentService, Deadline, SocialGraph, Stores};
use conduit_infra::{Argon2PasswordService, JwtCredentialCodec, memory_stores};

#[cfg(feature = "postgres")]
use conduit_infra::{DatabaseConnections, postgres_stores};
#[cfg(feature = "rate-limit")]
use conduit_infra::{InMemoryRateLimiter, RateLimitConfig};

use crate::config::AppConfig;
use crate::session::CookiePolicy;

/// Failure to assemble the services at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("credential setup failed: {0}")]
    Credentials(#[from] AuthError),

    #[error("rate limiter setup failed: {0}")]
    RateLimiter(#[from] RateLimitError),
}

/// Which backend the stores live in.
#[derive(Clone)]
pub enum Storage {
    Memory,
    #[cfg(feature = "postgres")]
    Postgres(Arc<DatabaseConnections>),
}

impl Storage {
    pub fn name(&self) -> &'static str {
        match self {
            Storage::Memory => "memory",
            #[cfg(feature = "postgres")]
            Storage::Postgres(_) => "postgres",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub content: Arc<ContentService>,
    pub graph: Arc<SocialGraph>,
    pub cookies: CookiePolicy,
    pub login_limiter: Option<Arc<dyn RateLimiter>>,
    pub storage: Storage,
}

impl AppState {
    /// Connect to Postgres when configured, otherwise (or on failure) fall
    /// back to the in-memory store.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let (stores, storage) = Self::connect(config).await;
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        let state = Self::assemble(stores, storage, config, passwords)?;
        tracing::info!(storage = state.storage.name(), "Application state initialized");
        Ok(state)
    }

    #[cfg(feature = "postgres")]
    async fn connect(config: &AppConfig) -> (Stores, Storage) {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
            return (memory_stores(), Storage::Memory);
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => {
                let stores = postgres_stores(connections.main.clone());
                (stores, Storage::Postgres(Arc::new(connections)))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to connect to database. Using the in-memory store."
                );
                (memory_stores(), Storage::Memory)
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect(config: &AppConfig) -> (Stores, Storage) {
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
        }
        (memory_stores(), Storage::Memory)
    }

    /// Wire services over the given stores.
    pub fn assemble(
        stores: Stores,
        storage: Storage,
        config: &AppConfig,
        passwords: Arc<dyn PasswordService>,
    ) -> Result<Self, StartupError> {
        let deadline = Deadline::new(config.storage_timeout);
        let codec = Arc::new(JwtCredentialCodec::new(config.credentials.clone())?);

        let accounts = AccountService::new(stores.clone(), codec, passwords, deadline)?;
        let content = ContentService::new(stores.clone(), SlugAllocator::default(), deadline);
        let graph = SocialGraph::new(stores, deadline);

        Ok(Self {
            accounts: Arc::new(accounts),
            content: Arc::new(content),
            graph: Arc::new(graph),
            cookies: CookiePolicy::new(config.production),
            login_limiter: Self::login_limiter(config)?,
            storage,
        })
    }

    #[cfg(feature = "rate-limit")]
    fn login_limiter(config: &AppConfig) -> Result<Option<Arc<dyn RateLimiter>>, StartupError> {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: config.login_limit.max_attempts,
            window: config.login_limit.window,
        })?;
        Ok(Some(Arc::new(limiter)))
    }

    #[cfg(not(feature = "rate-limit"))]
    fn login_limiter(_config: &AppConfig) -> Result<Option<Arc<dyn RateLimiter>>, StartupError> {
        Ok(None)
    }
}
