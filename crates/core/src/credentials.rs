//! Password setup / reset credential tokens.
//!
//! A token is minted when a user is created or requests a reset, travels
//! out-of-band inside a link, and authorizes exactly one password write.
//! `peek` is the read-only "is this link still usable" check; only
//! `consume` may trigger a state change.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{error, warn};

use crate::crypto::hex_encode;
use crate::db::repository::PortalRepository;
use crate::error::{PortalError, Result};
use crate::models::credential::{CredentialClaim, CredentialToken, TokenPurpose};

/// Tokens are valid for 24 hours from issue.
const TOKEN_TTL_HOURS: i64 = 24;

pub struct CredentialTokenManager {
    repo: Arc<dyn PortalRepository>,
}

impl CredentialTokenManager {
    pub fn new(repo: Arc<dyn PortalRepository>) -> Self {
        Self { repo }
    }

    /// Mint a single-use token for the given identity. Multiple outstanding
    /// tokens per identity are allowed; each is independent.
    pub async fn generate(
        &self,
        email: &str,
        user_uuid: &str,
        purpose: TokenPurpose,
    ) -> Result<String> {
        let token = generate_token();
        let now = Utc::now();
        self.repo
            .put_credential_token(&CredentialToken {
                token: token.clone(),
                email: email.trim().to_lowercase(),
                user_uuid: user_uuid.to_string(),
                purpose: purpose.as_str().to_string(),
                created_at: now,
                expires_at: now + Duration::hours(TOKEN_TTL_HOURS),
            })
            .await?;
        Ok(token)
    }

    /// Read-only existence + expiry check. Never mutates state and must not
    /// be used to authorize anything.
    pub async fn peek(&self, token: &str) -> Result<Option<CredentialClaim>> {
        match self.repo.get_credential_token(token).await? {
            Some(row) if !row.is_expired(Utc::now()) => Ok(Some(CredentialClaim {
                email: row.email,
                user_uuid: row.user_uuid,
                purpose: TokenPurpose::parse(&row.purpose),
            })),
            _ => Ok(None),
        }
    }

    /// Validate the token and, if valid, write the new password hash to the
    /// identity record and consume the token.
    ///
    /// The token delete is the commit point: if zero rows were removed, a
    /// concurrent consume won and this call reports invalid. A failed
    /// password write leaves the token in place so the user can retry.
    /// Not-found, expired, and already-consumed all collapse to
    /// [`PortalError::CredentialInvalid`] so callers cannot distinguish why
    /// a link failed.
    pub async fn consume(&self, token: &str, new_password: &str) -> Result<()> {
        let row = match self.repo.get_credential_token(token).await? {
            Some(row) => row,
            None => return Err(PortalError::CredentialInvalid),
        };
        if row.is_expired(Utc::now()) {
            return Err(PortalError::CredentialInvalid);
        }

        let user = match self.repo.get_user(&row.user_uuid).await? {
            Some(user) => user,
            None => {
                // The identity this token pointed at was deleted after
                // issue. Data inconsistency, not an attack signal.
                warn!(
                    user_uuid = %row.user_uuid,
                    "credential token references a missing user"
                );
                return Err(PortalError::CredentialInvalid);
            }
        };

        let hash = hash_password(new_password)?;
        if !self.repo.set_password_hash(&user.uuid, &hash).await? {
            warn!(user_uuid = %user.uuid, "password write hit a missing user, token left intact");
            return Err(PortalError::CredentialInvalid);
        }

        match self.repo.delete_credential_token(token).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                // Lost the race to a concurrent consume of the same token.
                warn!("credential token was consumed concurrently");
                Err(PortalError::CredentialInvalid)
            }
            Err(e) => {
                // The password is already updated but the token survived:
                // it remains replayable until it expires.
                error!(
                    error = %e,
                    "failed to delete credential token after password write; \
                     token remains valid until expiry"
                );
                Err(e)
            }
        }
    }
}

/// Generate a 256-bit random token, hex encoded (64 characters).
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    hex_encode(&bytes)
}

/// Hash a password using argon2.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = argon2::password_hash::SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PortalError::Crypto(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
