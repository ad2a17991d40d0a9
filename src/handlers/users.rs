use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use crate::{
    error::Result,
    handlers::envelope::{ApiResponse, accept_json},
    models::role::Role,
    services::{
        gate::{self, Actor},
        lock::{self as lock_service, SetLockRequest},
        users::{self as user_service, EditUserRequest},
    },
    state::AppState,
};

/// The request payload for listing users.
#[derive(Deserialize, Debug)]
pub struct ListUsersRequest {
    pub user_id: i64,
    pub user_role: Role,
    pub session_token: String,
    /// A single user to look up. All users when absent.
    #[serde(default)]
    pub target_user_id: Option<i64>,
}

/// Lists users for a session-verified superuser.
pub async fn list_users(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ListUsersRequest>, JsonRejection>,
) -> Result<Response> {
    let request = accept_json(payload)?;

    let actor = Actor {
        user_id: request.user_id,
        role: request.user_role,
        session_token: &request.session_token,
    };
    gate::require_superuser(state.directory.as_ref(), state.sessions.as_ref(), &actor).await?;

    let users = user_service::list_users(state.directory.as_ref(), request.target_user_id).await?;

    let message = if users.is_empty() {
        "No users found."
    } else {
        "User look up successful."
    };

    Ok(ApiResponse::ok(users, message).respond(StatusCode::OK))
}

/// Edits a user.
pub async fn edit_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EditUserRequest>, JsonRejection>,
) -> Result<Response> {
    let request = accept_json(payload)?;

    let user = user_service::edit_user(
        state.directory.as_ref(),
        state.sessions.as_ref(),
        &request,
    )
    .await?;

    Ok(ApiResponse::ok(user, "User edit successful.").respond(StatusCode::OK))
}

/// Locks or unlocks a user.
pub async fn set_lock(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SetLockRequest>, JsonRejection>,
) -> Result<Response> {
    let request = accept_json(payload)?;

    let user = lock_service::set_lock(
        state.directory.as_ref(),
        state.sessions.as_ref(),
        &request,
    )
    .await?;

    Ok(ApiResponse::ok(user, "User lock toggle successful.").respond(StatusCode::OK))
}
