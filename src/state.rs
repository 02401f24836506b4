use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    cache::{ListingCache, MemoryCache},
    config::{Config, ConfigError},
    services::{
        auth::AuthService, comment::CommentService, post::PostService, upvote::UpvoteService,
    },
    utils::{
        hash::PasswordHasher,
        session::{SessionCodec, SessionConfig},
    },
};

/// Process-wide state, built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub sessions: Arc<SessionCodec>,
    pub hasher: PasswordHasher,
    /// Verified against when a login names an unknown user, so both failure
    /// paths do the same amount of work.
    pub dummy_hash: Arc<str>,
    pub cache: Option<Arc<dyn ListingCache>>,
}

impl AppState {
    /// Fails when the session secret is missing or the hash cost is invalid.
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self, ConfigError> {
        let sessions = SessionCodec::new(SessionConfig::from_config(&config))?;
        let hasher = PasswordHasher::new(config.hash_memory_kib, config.hash_iterations)?;
        let dummy_hash = hasher
            .hash("pheedback-placeholder-password")
            .map_err(|e| ConfigError::Invalid {
                var: "PASSWORD_HASH_MEMORY_KIB/PASSWORD_HASH_ITERATIONS",
                reason: e.to_string(),
            })?;

        let cache: Option<Arc<dyn ListingCache>> = if config.roadmap_cache_ttl.is_zero() {
            None
        } else {
            Some(Arc::new(MemoryCache::new(config.roadmap_cache_ttl)))
        };

        Ok(Self {
            pool,
            config,
            sessions: Arc::new(sessions),
            hasher,
            dummy_hash: dummy_hash.into(),
            cache,
        })
    }

    /// Replaces the listing cache, e.g. with a shared one.
    pub fn with_cache(mut self, cache: Option<Arc<dyn ListingCache>>) -> Self {
        self.cache = cache;
        self
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        AuthService::new(
            state.pool.clone(),
            state.sessions.clone(),
            state.hasher.clone(),
            state.dummy_hash.clone(),
        )
    }
}

impl FromRef<AppState> for UpvoteService {
    fn from_ref(state: &AppState) -> Self {
        UpvoteService::new(state.pool.clone(), state.cache.clone())
    }
}

impl FromRef<AppState> for PostService {
    fn from_ref(state: &AppState) -> Self {
        PostService::new(state.pool.clone(), state.cache.clone())
    }
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        CommentService::new(state.pool.clone(), state.cache.clone())
    }
}
