#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use warden::{
    crypto::seal::{AesGcmSealer, SealKey},
    error::{AppError, Result},
    models::{
        apikey::ApiKeyRecord,
        role::Role,
        session::Session,
        user::{User, UserUpdate},
    },
    repositories::{
        directory::Directory,
        memory::{InMemoryDirectory, InMemorySessions},
        session::SessionValidator,
    },
    state::AppState,
};

pub const IP_ADDRESS: &str = "192.168.1.10";
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) warden-tests";

pub const SUPERUSER_ID: i64 = 1;
pub const STAFF_ID: i64 = 10;
pub const AUTHENTICATED_ID: i64 = 11;
pub const OTHER_ID: i64 = 12;
pub const INACTIVE_ID: i64 = 13;

// Shared test context
pub struct TestContext {
    pub directory: InMemoryDirectory,
    pub sessions: InMemorySessions,
}

pub fn user(user_id: i64, role: Role, is_active: bool) -> User {
    User {
        user_id,
        full_name: Some(format!("User {}", user_id)),
        email: format!("user{}@example.org", user_id),
        is_active,
        user_role: role,
        email_verified: true,
        created_on: Utc::now() - Duration::days(30),
        last_login_try: None,
        last_login_success: None,
    }
}

pub fn session(user_id: i64, role: Role) -> Session {
    let now = Utc::now();
    Session {
        user_id,
        user_role: role,
        ip_address: IP_ADDRESS.to_string(),
        user_agent: USER_AGENT.to_string(),
        is_active: true,
        created_at: now - Duration::minutes(5),
        expires_at: now + Duration::days(1),
    }
}

impl TestContext {
    pub async fn new() -> Self {
        let directory = InMemoryDirectory::new();

        // inserted out of order so listing has to sort
        for u in [
            user(STAFF_ID, Role::Staff, true),
            user(SUPERUSER_ID, Role::Superuser, true),
            user(OTHER_ID, Role::Authenticated, true),
            user(2, Role::Anonymous, true),
            user(AUTHENTICATED_ID, Role::Authenticated, true),
            user(3, Role::Locked, false),
            user(INACTIVE_ID, Role::Authenticated, false),
        ] {
            directory.insert_user(u).await;
        }

        Self {
            directory,
            sessions: InMemorySessions::new(),
        }
    }

    /// Opens a live session for `user_id` and returns its token.
    pub async fn login(&self, user_id: i64, role: Role) -> String {
        let token = format!("session-token-{}", user_id);
        self.sessions.insert(token.clone(), session(user_id, role)).await;
        token
    }

    pub fn state(&self) -> AppState {
        AppState::from_parts(
            Arc::new(self.directory.clone()),
            Arc::new(self.sessions.clone()),
            Arc::new(AesGcmSealer::new(SealKey::generate())),
        )
    }
}

/// A session store that is always down.
pub struct UnavailableSessions;

#[async_trait]
impl SessionValidator for UnavailableSessions {
    async fn find_session(&self, _session_token: &str) -> Result<Option<Session>> {
        Err(AppError::Internal("session store unavailable".to_string()))
    }

    async fn invalidate_user_sessions(&self, _user_id: i64) -> Result<usize> {
        Err(AppError::Internal("session store unavailable".to_string()))
    }
}

/// Reads from the wrapped directory but refuses every API key write.
pub struct RejectingApiKeyWrites(pub InMemoryDirectory);

#[async_trait]
impl Directory for RejectingApiKeyWrites {
    async fn find_users(&self, user_id: Option<i64>) -> Result<Vec<User>> {
        self.0.find_users(user_id).await
    }

    async fn update_user(&self, user_id: i64, changes: &UserUpdate) -> Result<Option<User>> {
        self.0.update_user(user_id, changes).await
    }

    async fn insert_apikey(&self, _record: &ApiKeyRecord) -> Result<()> {
        Err(AppError::Internal("apikeys table unavailable".to_string()))
    }

    async fn find_apikey(&self, apikey: &str) -> Result<Option<ApiKeyRecord>> {
        self.0.find_apikey(apikey).await
    }
}
