use std::fmt;
use std::str::FromStr;

use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// User id of the system-wide anonymous account.
pub const ANONYMOUS_USER_ID: i64 = 2;
/// User id of the locked sentinel account.
pub const LOCKED_USER_ID: i64 = 3;

/// Whether `user_id` is one of the reserved system accounts.
pub fn is_reserved_user(user_id: i64) -> bool {
    user_id == ANONYMOUS_USER_ID || user_id == LOCKED_USER_ID
}

/// Every role known to the system.
///
/// Maps onto the `user_role` Postgres enum. Unknown strings never parse, so
/// no code path can fall through to a default grant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSql, FromSql,
)]
#[serde(rename_all = "lowercase")]
#[postgres(name = "user_role")]
pub enum Role {
    #[postgres(name = "superuser")]
    Superuser,
    #[postgres(name = "staff")]
    Staff,
    #[postgres(name = "authenticated")]
    Authenticated,
    #[postgres(name = "anonymous")]
    Anonymous,
    #[postgres(name = "locked")]
    Locked,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Superuser,
        Role::Staff,
        Role::Authenticated,
        Role::Anonymous,
        Role::Locked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superuser => "superuser",
            Role::Staff => "staff",
            Role::Authenticated => "authenticated",
            Role::Anonymous => "anonymous",
            Role::Locked => "locked",
        }
    }

    /// Whether a superuser may set a user's role to this value.
    ///
    /// `anonymous` belongs to the reserved account only.
    pub fn is_assignable(&self) -> bool {
        match self {
            Role::Superuser | Role::Staff | Role::Authenticated | Role::Locked => true,
            Role::Anonymous => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superuser" => Ok(Role::Superuser),
            "staff" => Ok(Role::Staff),
            "authenticated" => Ok(Role::Authenticated),
            "anonymous" => Ok(Role::Anonymous),
            "locked" => Ok(Role::Locked),
            other => Err(AppError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_role_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("admin".parse::<Role>().is_err());
        assert!("Superuser".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn anonymous_is_not_assignable() {
        assert!(!Role::Anonymous.is_assignable());
        assert!(Role::Locked.is_assignable());
        assert!(Role::Superuser.is_assignable());
    }

    #[test]
    fn reserved_ids() {
        assert!(is_reserved_user(2));
        assert!(is_reserved_user(3));
        assert!(!is_reserved_user(1));
        assert!(!is_reserved_user(4));
    }
}
