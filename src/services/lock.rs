use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::{
        role::Role,
        user::{User, UserUpdate},
    },
    repositories::{directory::Directory, session::SessionValidator},
    services::gate::{self, Actor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockAction {
    Lock,
    Unlock,
}

impl LockAction {
    fn changes(&self) -> UserUpdate {
        match self {
            LockAction::Lock => UserUpdate::lock(),
            LockAction::Unlock => UserUpdate::unlock(),
        }
    }
}

/// The request payload for locking or unlocking a user.
#[derive(Debug, Clone, Deserialize)]
pub struct SetLockRequest {
    pub user_id: i64,
    pub user_role: Role,
    pub session_token: String,
    pub target_user_id: i64,
    pub action: LockAction,
}

/// Locks or unlocks `target_user_id` on behalf of a session-verified superuser.
pub async fn set_lock(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    request: &SetLockRequest,
) -> Result<User> {
    gate::ensure_mutable_target(request.target_user_id)?;

    let actor = Actor {
        user_id: request.user_id,
        role: request.user_role,
        session_token: &request.session_token,
    };
    gate::require_superuser(directory, sessions, &actor).await?;

    tracing::info!(
        "🔐 Superuser {} requested {:?} of user {}",
        request.user_id,
        request.action,
        request.target_user_id
    );

    internal_set_lock(directory, sessions, request.target_user_id, request.action).await
}

/// Locks or unlocks without an authorization check.
///
/// For same-process automation only, such as locking an account after too
/// many failed logins. Never route an external request here.
///
/// # Arguments
///
/// * `directory` - The user store.
/// * `sessions` - The session store, used to revoke the target's sessions on lock.
/// * `target_user_id` - The user to lock or unlock.
/// * `action` - Lock or unlock.
///
/// # Returns
///
/// The user row as re-read after the update.
pub async fn internal_set_lock(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    target_user_id: i64,
    action: LockAction,
) -> Result<User> {
    gate::ensure_mutable_target(target_user_id)?;

    let changes = action.changes();
    let user = directory
        .update_user(target_user_id, &changes)
        .await?
        .ok_or_else(|| {
            tracing::warn!("❌ User {} not found for lock toggle", target_user_id);
            AppError::NotFound
        })?;

    if !changes.is_reflected_in(&user) {
        tracing::error!("❌ User {} re-read does not reflect {:?}", target_user_id, action);
        return Err(AppError::Internal(
            "User lock toggle failed, state unknown".to_string(),
        ));
    }

    // The row update has committed; session cleanup is best effort.
    if action == LockAction::Lock {
        if let Err(e) = sessions.invalidate_user_sessions(target_user_id).await {
            tracing::error!(
                "❌ Failed to invalidate sessions for locked user {}: {}",
                target_user_id,
                e
            );
        }
    }

    tracing::info!(
        "✅ User {} is now {} (active: {})",
        user.user_id,
        user.user_role,
        user.is_active
    );

    Ok(user)
}
