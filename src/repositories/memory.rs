//! In-memory collaborators, used by the test suites and local experiments.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, Result},
    models::{
        apikey::ApiKeyRecord,
        session::Session,
        user::{User, UserUpdate},
    },
    repositories::{directory::Directory, session::SessionValidator, user::EMAIL_IN_USE},
};

/// A `Directory` over maps. The users map is ordered by id.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<BTreeMap<i64, User>>>,
    apikeys: Arc<RwLock<HashMap<String, ApiKeyRecord>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.user_id, user);
    }

    pub async fn user(&self, user_id: i64) -> Option<User> {
        self.users.read().await.get(&user_id).cloned()
    }

    pub async fn apikey_count(&self) -> usize {
        self.apikeys.read().await.len()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_users(&self, user_id: Option<i64>) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(match user_id {
            Some(id) => users.get(&id).cloned().into_iter().collect(),
            None => users.values().cloned().collect(),
        })
    }

    async fn update_user(&self, user_id: i64, changes: &UserUpdate) -> Result<Option<User>> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email {
            if users.values().any(|u| u.user_id != user_id && &u.email == email) {
                return Err(AppError::Validation(EMAIL_IN_USE.to_string()));
            }
        }
        Ok(users.get_mut(&user_id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }

    async fn insert_apikey(&self, record: &ApiKeyRecord) -> Result<()> {
        let mut apikeys = self.apikeys.write().await;
        if apikeys.contains_key(&record.apikey) {
            return Err(AppError::Internal("duplicate apikey".to_string()));
        }
        apikeys.insert(record.apikey.clone(), record.clone());
        Ok(())
    }

    async fn find_apikey(&self, apikey: &str) -> Result<Option<ApiKeyRecord>> {
        Ok(self.apikeys.read().await.get(apikey).cloned())
    }
}

/// A `SessionValidator` over a map keyed by session token.
#[derive(Clone, Default)]
pub struct InMemorySessions {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session_token: impl Into<String>, session: Session) {
        self.sessions.write().await.insert(session_token.into(), session);
    }

    pub async fn contains(&self, session_token: &str) -> bool {
        self.sessions.read().await.contains_key(session_token)
    }
}

#[async_trait]
impl SessionValidator for InMemorySessions {
    async fn find_session(&self, session_token: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_token)
            .filter(|s| s.is_live_at(Utc::now()))
            .cloned())
    }

    async fn invalidate_user_sessions(&self, user_id: i64) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok(before - sessions.len())
    }
}
