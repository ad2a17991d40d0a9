use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::{
        role::Role,
        user::{User, UserUpdate},
    },
    repositories::{directory::Directory, session::SessionValidator},
    services::gate::{self, Actor},
    validation::requests::validate_update,
};

/// The request payload for editing a user.
#[derive(Debug, Clone, Deserialize)]
pub struct EditUserRequest {
    pub user_id: i64,
    pub user_role: Role,
    pub session_token: String,
    pub target_user_id: i64,
    pub update: UserUpdate,
}

impl EditUserRequest {
    pub fn actor(&self) -> Actor<'_> {
        Actor {
            user_id: self.user_id,
            role: self.user_role,
            session_token: &self.session_token,
        }
    }
}

/// Lists users ascending by id, or the single user `user_id`.
pub async fn list_users(directory: &dyn Directory, user_id: Option<i64>) -> Result<Vec<User>> {
    let users = directory.find_users(user_id).await?;
    tracing::debug!("User look up returned {} row(s)", users.len());
    Ok(users)
}

/// Edits a user after the gate approves the requested fields.
///
/// # Returns
///
/// The user row as re-read after the update.
pub async fn edit_user(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    request: &EditUserRequest,
) -> Result<User> {
    gate::ensure_mutable_target(request.target_user_id)?;
    validate_update(&request.update)?;

    let permission = gate::authorize_edit(
        directory,
        sessions,
        &request.actor(),
        request.target_user_id,
        &request.update,
    )
    .await?;

    let requested = request.update.fields();
    debug_assert!(requested.is_subset(&permission.editable_fields));

    let user = directory
        .update_user(request.target_user_id, &request.update)
        .await?
        .ok_or_else(|| {
            tracing::warn!("❌ User {} not found for edit", request.target_user_id);
            AppError::NotFound
        })?;

    if !request.update.is_reflected_in(&user) {
        tracing::error!("❌ User {} re-read does not reflect the update", user.user_id);
        return Err(AppError::Internal(
            "User update failed, state unknown".to_string(),
        ));
    }

    tracing::info!(
        "✅ User {} updated by {} ({}): {:?}",
        user.user_id,
        request.user_id,
        permission.reason,
        requested
    );

    Ok(user)
}
