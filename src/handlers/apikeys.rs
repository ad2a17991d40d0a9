use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    handlers::envelope::{ApiResponse, accept_json},
    services::apikeys::{self as apikey_service, IssueApiKeyRequest, Verification},
    state::AppState,
};

/// The response payload for a newly issued key.
#[derive(Serialize, Debug)]
pub struct IssueResponse {
    /// The sealed claim set, handed to the client as an opaque string.
    pub apikey: String,
    pub expires: DateTime<Utc>,
}

/// The request payload for verifying a key.
#[derive(Deserialize, Debug)]
pub struct VerifyRequest {
    pub apikey: String,
}

const NOT_VERIFIED: &str = "API key could not be verified.";

/// Issues and seals an API key.
pub async fn issue(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IssueApiKeyRequest>, JsonRejection>,
) -> Result<Response> {
    let request = accept_json(payload)?;

    let issued = apikey_service::issue(
        state.directory.as_ref(),
        state.sessions.as_ref(),
        &request,
    )
    .await?;

    let apikey = state.sealer.seal(&issued.claims)?;
    let message = format!(
        "API key generated successfully, expires: {}",
        issued.expires.to_rfc3339()
    );

    Ok(ApiResponse::ok(
        IssueResponse {
            apikey,
            expires: issued.expires,
        },
        message,
    )
    .respond(StatusCode::OK))
}

/// Verifies a sealed API key.
///
/// A key that fails to unseal is reported exactly like one that fails the
/// stored-record checks.
pub async fn verify(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Response> {
    let request = accept_json(payload)?;

    let claims = match state.sealer.unseal(&request.apikey) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("API key failed to unseal: {}", e);
            return Ok(ApiResponse::<Verification>::failed(NOT_VERIFIED)
                .respond(StatusCode::UNAUTHORIZED));
        }
    };

    let verification = apikey_service::verify(state.directory.as_ref(), &claims).await?;

    match verification.expires {
        Some(expires) if verification.valid => {
            let message = format!(
                "API key verified successfully. Expires: {}",
                expires.to_rfc3339()
            );
            Ok(ApiResponse::ok(verification, message).respond(StatusCode::OK))
        }
        _ => Ok(ApiResponse::<Verification>::failed(NOT_VERIFIED).respond(StatusCode::UNAUTHORIZED)),
    }
}
