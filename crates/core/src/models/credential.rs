//! Password setup / reset credential tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a credential token authorizes. Both purposes behave identically in
/// the core (single-use, time-bounded password write); the distinction only
/// affects which email template the portal asks the mailer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    PasswordSetup,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordSetup => "password_setup",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "password_setup" => TokenPurpose::PasswordSetup,
            _ => TokenPurpose::PasswordReset,
        }
    }
}

/// A stored credential token, keyed by the opaque token value.
///
/// Valid iff the row exists and `now < expires_at`. Multiple outstanding
/// tokens for one identity are allowed; each is independent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CredentialToken {
    pub token: String,
    pub email: String,
    pub user_uuid: String,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CredentialToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The non-sensitive claim a valid token carries, returned by `peek`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialClaim {
    pub email: String,
    pub user_uuid: String,
    pub purpose: TokenPurpose,
}
