//! The singleton OAuth token record for the upstream integration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The stored OAuth token record. There is exactly one per deployment,
/// seeded out-of-band from the initial authorization-code exchange and
/// mutated in place on every successful refresh.
///
/// The refresh token is held encrypted (hex-encoded AES-256-GCM blob);
/// access tokens are never persisted. `last_refreshed` exists for
/// observability only — correctness relies on the reactive guard, not on
/// a locally computed expiry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OauthTokenRecord {
    pub refresh_token_enc: String,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Success response from the upstream OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error response from the upstream OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
