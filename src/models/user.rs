use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// Represents a user in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The stable, unique identifier for the user.
    pub user_id: i64,
    /// The user's full name.
    pub full_name: Option<String>,
    /// The user's email address.
    pub email: String,
    /// Whether the user is active.
    pub is_active: bool,
    /// The user's role.
    pub user_role: Role,
    /// Whether the user's email address has been verified.
    pub email_verified: bool,
    /// The timestamp when the user was created.
    pub created_on: DateTime<Utc>,
    /// The timestamp of the user's last login attempt.
    pub last_login_try: Option<DateTime<Utc>>,
    /// The timestamp of the user's last successful login.
    pub last_login_success: Option<DateTime<Utc>>,
}

/// A user column that an edit may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    FullName,
    Email,
    IsActive,
    UserRole,
    EmailVerified,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::FullName => "full_name",
            UserField::Email => "email",
            UserField::IsActive => "is_active",
            UserField::UserRole => "user_role",
            UserField::EmailVerified => "email_verified",
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of changes requested for a user row. `None` leaves a column alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    #[garde(length(min = 1, max = 280))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[garde(email, length(max = 280))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Role>,
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl UserUpdate {
    /// The update applied when locking an account.
    pub fn lock() -> Self {
        Self {
            is_active: Some(false),
            user_role: Some(Role::Locked),
            ..Self::default()
        }
    }

    /// The update applied when unlocking an account. Always the least
    /// privileged active tier, whatever the role was before the lock.
    pub fn unlock() -> Self {
        Self {
            is_active: Some(true),
            user_role: Some(Role::Authenticated),
            ..Self::default()
        }
    }

    /// The fields this update touches.
    pub fn fields(&self) -> BTreeSet<UserField> {
        let mut fields = BTreeSet::new();
        if self.full_name.is_some() {
            fields.insert(UserField::FullName);
        }
        if self.email.is_some() {
            fields.insert(UserField::Email);
        }
        if self.is_active.is_some() {
            fields.insert(UserField::IsActive);
        }
        if self.user_role.is_some() {
            fields.insert(UserField::UserRole);
        }
        if self.email_verified.is_some() {
            fields.insert(UserField::EmailVerified);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Whether every column this update sets holds the requested value in `user`.
    pub fn is_reflected_in(&self, user: &User) -> bool {
        self.full_name
            .as_ref()
            .is_none_or(|v| user.full_name.as_ref() == Some(v))
            && self.email.as_ref().is_none_or(|v| &user.email == v)
            && self.is_active.is_none_or(|v| user.is_active == v)
            && self.user_role.is_none_or(|v| user.user_role == v)
            && self.email_verified.is_none_or(|v| user.email_verified == v)
    }

    /// Applies this update to an in-memory row.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name = Some(full_name.clone());
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(role) = self.user_role {
            user.user_role = role;
        }
        if let Some(email_verified) = self.email_verified {
            user.email_verified = email_verified;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_reflect_set_columns() {
        let update = UserUpdate {
            full_name: Some("A".into()),
            user_role: Some(Role::Staff),
            ..UserUpdate::default()
        };
        let fields: Vec<_> = update.fields().into_iter().collect();
        assert_eq!(fields, vec![UserField::FullName, UserField::UserRole]);
        assert!(UserUpdate::default().is_empty());
    }

    #[test]
    fn lock_and_unlock_updates() {
        assert_eq!(UserUpdate::lock().user_role, Some(Role::Locked));
        assert_eq!(UserUpdate::lock().is_active, Some(false));
        assert_eq!(UserUpdate::unlock().user_role, Some(Role::Authenticated));
        assert_eq!(UserUpdate::unlock().is_active, Some(true));
    }

    #[test]
    fn reflected_update_matches_row() {
        let mut user = User {
            user_id: 5,
            full_name: None,
            email: "a@example.org".into(),
            is_active: true,
            user_role: Role::Staff,
            email_verified: true,
            created_on: chrono::Utc::now(),
            last_login_try: None,
            last_login_success: None,
        };
        let update = UserUpdate::lock();
        assert!(!update.is_reflected_in(&user));
        update.apply_to(&mut user);
        assert!(update.is_reflected_in(&user));
        assert_eq!(user.email, "a@example.org");
    }

    #[test]
    fn garde_rejects_bad_email() {
        let update = UserUpdate {
            email: Some("not-an-email".into()),
            ..UserUpdate::default()
        };
        assert!(update.validate().is_err());

        let update = UserUpdate {
            email: Some("someone@example.org".into()),
            ..UserUpdate::default()
        };
        assert!(update.validate().is_ok());
    }
}
