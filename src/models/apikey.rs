use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// A row of the `apikeys` table. Never mutated once written.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyRecord {
    /// The random token. The store of record for it.
    pub apikey: String,
    pub issued: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub not_valid_before: DateTime<Utc>,
    pub user_id: i64,
    pub user_role: Role,
    /// The session the key was minted under.
    pub session_token: String,
}

/// The plaintext claim set handed out (after sealing) as an API key.
///
/// Field names on the wire are kept short since the sealed form travels in
/// request headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyClaims {
    /// The API version the key is valid for.
    #[serde(rename = "ver")]
    pub version: u32,
    #[serde(rename = "uid")]
    pub user_id: i64,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "clt")]
    pub client_agent: String,
    /// The service the key was issued for.
    #[serde(rename = "aud")]
    pub audience: String,
    /// The endpoint the key was issued for.
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "ipa")]
    pub ip_address: String,
    #[serde(rename = "tkn")]
    pub token: String,
    #[serde(rename = "iat")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "nbf")]
    pub not_before: DateTime<Utc>,
    #[serde(rename = "exp")]
    pub expires_at: DateTime<Utc>,
}
