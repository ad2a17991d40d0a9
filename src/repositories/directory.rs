use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::{
    error::Result,
    models::{
        apikey::ApiKeyRecord,
        user::{User, UserUpdate},
    },
    repositories::{apikey as apikey_repo, user as user_repo},
};

/// Raw reads and writes against the users and apikeys tables.
///
/// Carries no business logic. Every authorization decision is made before a
/// method here is called.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Users ascending by `user_id`; zero or one row when an id is given.
    async fn find_users(&self, user_id: Option<i64>) -> Result<Vec<User>>;

    /// Applies `changes` atomically and returns the fresh row, or `None` if
    /// the user does not exist.
    async fn update_user(&self, user_id: i64, changes: &UserUpdate) -> Result<Option<User>>;

    async fn insert_apikey(&self, record: &ApiKeyRecord) -> Result<()>;

    async fn find_apikey(&self, apikey: &str) -> Result<Option<ApiKeyRecord>>;
}

/// The Postgres-backed directory.
#[derive(Clone)]
pub struct PgDirectory {
    pool: Pool,
}

impl PgDirectory {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_users(&self, user_id: Option<i64>) -> Result<Vec<User>> {
        user_repo::find_users(&self.pool, user_id).await
    }

    async fn update_user(&self, user_id: i64, changes: &UserUpdate) -> Result<Option<User>> {
        user_repo::update_user(&self.pool, user_id, changes).await
    }

    async fn insert_apikey(&self, record: &ApiKeyRecord) -> Result<()> {
        apikey_repo::insert_apikey(&self.pool, record).await
    }

    async fn find_apikey(&self, apikey: &str) -> Result<Option<ApiKeyRecord>> {
        apikey_repo::find_apikey(&self.pool, apikey).await
    }
}
