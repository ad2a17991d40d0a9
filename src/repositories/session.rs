//! Session lookups.
//!
//! Sessions are written by the login flow as JSON under `session:{token}`,
//! with the token also added to the set `user_sessions:{user_id}`. This core
//! reads them and deletes them when an account is locked.

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::{
    error::{AppError, Result},
    models::session::Session,
};

#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// The live session for `session_token`, or `None` if there is none.
    async fn find_session(&self, session_token: &str) -> Result<Option<Session>>;

    /// Deletes every session belonging to `user_id`. Returns how many went.
    async fn invalidate_user_sessions(&self, user_id: i64) -> Result<usize>;
}

fn session_key(session_token: &str) -> String {
    format!("session:{}", session_token)
}

fn user_sessions_key(user_id: i64) -> String {
    format!("user_sessions:{}", user_id)
}

/// Sessions held in Redis.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionValidator for RedisSessionStore {
    async fn find_session(&self, session_token: &str) -> Result<Option<Session>> {
        let mut redis = self.redis.clone();
        let key = session_key(session_token);

        let session_json: Option<String> = redis.get(&key).await?;
        let Some(session_json) = session_json else {
            tracing::debug!("Session not found");
            return Ok(None);
        };

        let session: Session = sonic_rs::from_str(&session_json)
            .map_err(|e| AppError::Internal(format!("Invalid session JSON: {}", e)))?;

        if !session.is_live_at(Utc::now()) {
            tracing::debug!("Session for user {} is no longer live", session.user_id);
            if let Err(e) = redis.del::<_, ()>(&key).await {
                tracing::warn!(
                    "❌ Failed to delete expired session for user {}: {}",
                    session.user_id,
                    e
                );
            }
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn invalidate_user_sessions(&self, user_id: i64) -> Result<usize> {
        let mut redis = self.redis.clone();
        let index_key = user_sessions_key(user_id);

        let tokens: Vec<String> = redis.smembers(&index_key).await?;
        let mut keys: Vec<String> = tokens.iter().map(|t| session_key(t)).collect();
        let removed = tokens.len();
        keys.push(index_key);

        let _: () = redis.del(keys).await?;

        tracing::info!("🧹 Invalidated {} session(s) for user {}", removed, user_id);
        Ok(removed)
    }
}
