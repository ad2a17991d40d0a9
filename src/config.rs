use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::seal::KEY_SIZE;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server holding sessions.
    pub redis_url: String,
    /// The key used to seal API key claims.
    pub seal_key: Zeroizing<Vec<u8>>,
    /// The address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// The maximum number of pooled database connections.
    pub db_pool_size: usize,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        let mut seal_key_hex = env::var("SEAL_KEY")
            .context("SEAL_KEY must be set (generate with: openssl rand -hex 32)")?;

        let seal_key_bytes =
            hex::decode(&seal_key_hex).context("SEAL_KEY must be valid hexadecimal")?;

        seal_key_hex.zeroize();

        if seal_key_bytes.len() != KEY_SIZE {
            anyhow::bail!("SEAL_KEY must be exactly 32 bytes (64 hex characters)");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            seal_key: Zeroizing::new(seal_key_bytes),
            listen_addr: env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:13431".to_string())
                .parse()
                .context("Invalid LISTEN_ADDR")?,
            db_pool_size: env::var("DB_POOL_SIZE")
                .unwrap_or_else(|_| "16".to_string())
                .parse()
                .context("Invalid DB_POOL_SIZE")?,
        })
    }
}
