use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Serialize;

use crate::{
    error::Result,
    handlers::envelope::{ApiResponse, accept_json},
    services::access::{self as access_service, AccessRequest, LimitRequest},
    state::AppState,
};

#[derive(Serialize, Debug)]
pub struct Decision {
    pub granted: bool,
}

fn decision(granted: bool, passed: &str, failed: &str) -> Response {
    if granted {
        ApiResponse::ok(Decision { granted }, passed).respond(StatusCode::OK)
    } else {
        ApiResponse::<Decision>::failed(failed).respond(StatusCode::FORBIDDEN)
    }
}

/// Checks an access request against the role and item policy.
pub async fn check_access(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AccessRequest>, JsonRejection>,
) -> Result<Response> {
    let request = accept_json(payload)?;
    let granted = access_service::check_access(state.directory.as_ref(), &request).await?;

    Ok(decision(
        granted,
        "Access request check successful.",
        "Access request check failed.",
    ))
}

/// Checks a value against the caller's role limit.
pub async fn check_limit(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LimitRequest>, JsonRejection>,
) -> Result<Response> {
    let request = accept_json(payload)?;
    let granted = access_service::check_limit(state.directory.as_ref(), &request).await?;

    Ok(decision(
        granted,
        "Limit check successful.",
        "Limit check failed.",
    ))
}
