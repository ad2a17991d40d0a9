use std::sync::Arc;

use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;

use crate::{
    config::Config,
    crypto::seal::{AesGcmSealer, SealKey, TokenSealer},
    error::Result,
    repositories::{
        directory::{Directory, PgDirectory},
        session::{RedisSessionStore, SessionValidator},
    },
};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The user and API key store.
    pub directory: Arc<dyn Directory>,
    /// The session store.
    pub sessions: Arc<dyn SessionValidator>,
    /// Seals and unseals API key claims.
    pub sealer: Arc<dyn TokenSealer>,
}

impl AppState {
    /// Creates a new `AppState` backed by PostgreSQL and Redis.
    ///
    /// # Returns
    ///
    /// The state and the pool, so the caller can apply the schema.
    pub async fn new(config: &Config) -> Result<(Self, Pool)> {
        let db = crate::db::create_pool(&config.database_url, config.db_pool_size)?;
        tracing::info!(
            "✅ PostgreSQL Pool initialized (max {} connections)",
            config.db_pool_size
        );

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis Connection Manager initialized");

        let sealer = AesGcmSealer::new(SealKey::from_slice(&config.seal_key)?);
        tracing::info!("🔐 API key sealer initialized");

        let state = Self::from_parts(
            Arc::new(PgDirectory::new(db.clone())),
            Arc::new(RedisSessionStore::new(redis)),
            Arc::new(sealer),
        );

        Ok((state, db))
    }

    /// Assembles state from already-built collaborators.
    pub fn from_parts(
        directory: Arc<dyn Directory>,
        sessions: Arc<dyn SessionValidator>,
        sealer: Arc<dyn TokenSealer>,
    ) -> Self {
        Self {
            directory,
            sessions,
            sealer,
        }
    }
}
