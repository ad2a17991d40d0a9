use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// A server-tracked session, as written by the login flow.
///
/// This core only ever reads it. A session is authoritative for who is acting
/// now: any identity or role claim in a request is checked against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The ID of the user this session belongs to.
    pub user_id: i64,
    /// The role the user held when the session was bound.
    pub user_role: Role,
    /// The client IP address the session was opened from.
    pub ip_address: String,
    /// The client user agent the session was opened with.
    pub user_agent: String,
    /// Whether the session is live.
    pub is_active: bool,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session can still vouch for its user at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    /// Whether the session is bound to exactly this actor and role.
    pub fn binds(&self, user_id: i64, role: Role) -> bool {
        self.user_id == user_id && self.user_role == role
    }
}
