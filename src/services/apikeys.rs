//! Issuing and verifying API keys.
//!
//! An API key is a claim set sealed at the boundary. Its authority comes from
//! the random token it carries matching a stored record bound to the same user
//! and role, inside the stored validity window. The claim set's own timestamps
//! are never trusted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::token::{generate_apikey_token, tokens_match},
    error::{AppError, Result},
    models::{
        apikey::{ApiKeyClaims, ApiKeyRecord},
        role::Role,
    },
    repositories::{directory::Directory, session::SessionValidator},
    validation::requests::validate_fingerprint,
};

/// The request payload for issuing an API key.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueApiKeyRequest {
    /// The service the key is issued for.
    pub audience: String,
    /// The endpoint the key is issued for.
    pub subject: String,
    pub apiversion: u32,
    pub expires_days: u32,
    /// Seconds after issuance before the key becomes usable. May be zero.
    pub not_valid_before_seconds: u32,
    pub user_id: i64,
    pub user_role: Role,
    pub ip_address: String,
    pub user_agent: String,
    pub session_token: String,
}

/// A freshly minted key, not yet sealed.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedApiKey {
    pub claims: ApiKeyClaims,
    pub expires: DateTime<Utc>,
}

/// The outcome of a verification. Carries nothing that says why a key failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl Verification {
    fn invalid() -> Self {
        Self {
            valid: false,
            expires: None,
        }
    }
}

/// Issues an API key bound to the caller's live session.
pub async fn issue(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    request: &IssueApiKeyRequest,
) -> Result<IssuedApiKey> {
    issue_at(directory, sessions, request, Utc::now()).await
}

/// Issues an API key as of `now`.
///
/// # Arguments
///
/// * `directory` - Where the key record is persisted.
/// * `sessions` - Used to check the request against the caller's session.
/// * `request` - The issue request.
/// * `now` - The issuance time.
///
/// # Returns
///
/// The plaintext claim set for the caller to seal. Nothing is returned unless
/// the record was written.
pub async fn issue_at(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    request: &IssueApiKeyRequest,
    now: DateTime<Utc>,
) -> Result<IssuedApiKey> {
    validate_fingerprint(&[
        ("audience", request.audience.as_str()),
        ("subject", request.subject.as_str()),
        ("ip_address", request.ip_address.as_str()),
        ("user_agent", request.user_agent.as_str()),
        ("session_token", request.session_token.as_str()),
    ])?;

    let session = sessions
        .find_session(&request.session_token)
        .await?
        .ok_or_else(|| {
            tracing::warn!("❌ No live session for API key request by {}", request.user_id);
            AppError::SessionMismatch
        })?;

    let session_ok = session.is_active
        && session.user_id == request.user_id
        && session.ip_address == request.ip_address
        && session.user_agent == request.user_agent
        && session.user_role == request.user_role;

    if !session_ok {
        tracing::warn!(
            "❌ Session fingerprint does not match API key request by {}",
            request.user_id
        );
        return Err(AppError::SessionMismatch);
    }

    // The session's role is a snapshot; the user row is authoritative.
    let row_ok = directory
        .find_users(Some(request.user_id))
        .await?
        .first()
        .is_some_and(|u| u.is_active && u.user_role == request.user_role);

    if !row_ok {
        tracing::warn!(
            "❌ User {} is no longer an active {}, refusing API key",
            request.user_id,
            request.user_role
        );
        return Err(AppError::SessionMismatch);
    }

    let expires = now
        .checked_add_signed(Duration::days(i64::from(request.expires_days)))
        .ok_or_else(|| AppError::Validation("expires_days is out of range".to_string()))?;
    // A not-before at or past expiry yields a key that never verifies. That is
    // the caller's choice and is not rejected here.
    let not_valid_before = now
        .checked_add_signed(Duration::seconds(i64::from(request.not_valid_before_seconds)))
        .ok_or_else(|| AppError::Validation("not_valid_before is out of range".to_string()))?;

    let token = generate_apikey_token();

    let record = ApiKeyRecord {
        apikey: token.clone(),
        issued: now,
        expires,
        not_valid_before,
        user_id: request.user_id,
        user_role: request.user_role,
        session_token: request.session_token.clone(),
    };

    directory.insert_apikey(&record).await.map_err(|e| {
        tracing::error!("❌ Failed to persist API key for user {}: {}", request.user_id, e);
        e
    })?;

    tracing::info!(
        "✅ API key generated for user_id = {}, expires: {}",
        request.user_id,
        expires.to_rfc3339()
    );

    Ok(IssuedApiKey {
        claims: ApiKeyClaims {
            version: request.apiversion,
            user_id: request.user_id,
            role: request.user_role,
            client_agent: request.user_agent.clone(),
            audience: request.audience.clone(),
            subject: request.subject.clone(),
            ip_address: request.ip_address.clone(),
            token,
            issued_at: now,
            not_before: not_valid_before,
            expires_at: expires,
        },
        expires,
    })
}

/// Verifies an unsealed claim set against the stored record.
pub async fn verify(directory: &dyn Directory, claims: &ApiKeyClaims) -> Result<Verification> {
    verify_at(directory, claims, Utc::now()).await
}

/// Verifies an unsealed claim set against the stored record as of `now`.
///
/// Valid iff a record exists whose token, user id and role equal the claims'
/// and whose stored window satisfies `issued < now`, `not_valid_before < now`
/// and `now < expires`. Every check runs whatever the others found.
pub async fn verify_at(
    directory: &dyn Directory,
    claims: &ApiKeyClaims,
    now: DateTime<Utc>,
) -> Result<Verification> {
    let Some(record) = directory.find_apikey(&claims.token).await? else {
        tracing::debug!("API key could not be verified");
        return Ok(Verification::invalid());
    };

    let token_ok = tokens_match(&claims.token, &record.apikey);
    let user_ok = record.user_id == claims.user_id;
    let role_ok = record.user_role == claims.role;
    let not_expired = record.expires > now;
    let issued_ok = record.issued < now;
    let active_ok = record.not_valid_before < now;

    let valid = token_ok & user_ok & role_ok & not_expired & issued_ok & active_ok;

    if !valid {
        tracing::debug!("API key could not be verified");
        return Ok(Verification::invalid());
    }

    tracing::debug!("✅ API key verified for user {}", record.user_id);

    Ok(Verification {
        valid: true,
        expires: Some(record.expires),
    })
}
