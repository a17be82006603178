use async_trait::async_trait;

use crate::error::Result;
use crate::models::{credential::CredentialToken, oauth::OauthTokenRecord, user::PortalUser};

/// Durable storage for the singleton OAuth token record.
///
/// `put_oauth_record` is a full overwrite; callers must read-modify-write
/// under their own serialization discipline (the refresher's single-flight
/// lock). Store unavailability surfaces as `PortalError::Database` with no
/// retries at this layer.
#[async_trait]
pub trait OauthTokenRepository: Send + Sync {
    async fn get_oauth_record(&self) -> Result<Option<OauthTokenRecord>>;
    async fn put_oauth_record(&self, record: &OauthTokenRecord) -> Result<()>;
}

/// Storage for password setup/reset tokens, keyed by token value.
#[async_trait]
pub trait CredentialTokenRepository: Send + Sync {
    async fn put_credential_token(&self, token: &CredentialToken) -> Result<()>;
    async fn get_credential_token(&self, token: &str) -> Result<Option<CredentialToken>>;
    /// Atomic check-then-delete: returns whether a row was actually removed.
    /// This rows-affected signal is the mutual-exclusion point for
    /// concurrent consume attempts.
    async fn delete_credential_token(&self, token: &str) -> Result<bool>;
    /// TTL sweep: remove every token whose expiry has passed.
    async fn delete_expired_credential_tokens(&self) -> Result<u64>;
}

#[async_trait]
pub trait PortalUserRepository: Send + Sync {
    async fn create_user(&self, user: &PortalUser) -> Result<()>;
    async fn get_user(&self, uuid: &str) -> Result<Option<PortalUser>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<PortalUser>>;
    /// Returns false when no user with that uuid exists.
    async fn set_password_hash(&self, uuid: &str, hash: &str) -> Result<bool>;
}

/// Combined repository trait for all entity types.
pub trait PortalRepository:
    OauthTokenRepository + CredentialTokenRepository + PortalUserRepository
{
}
