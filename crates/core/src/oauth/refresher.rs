//! The token refresh engine.
//!
//! Exchanges the stored refresh token for a new access+refresh pair,
//! persists the rotated refresh token, and hands the access token to
//! callers in memory. Access tokens are never written to the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::config::UpstreamConfig;
use crate::crypto;
use crate::db::repository::OauthTokenRepository;
use crate::error::{PortalError, Result};
use crate::models::oauth::{OauthTokenRecord, TokenErrorResponse, TokenResponse};

/// Serializes every refresh through one async mutex and caches the most
/// recent access token. Concurrent callers asking for a token while a
/// refresh is in flight queue on the lock and reuse its result instead of
/// issuing their own exchange — uncoordinated refreshes would burn the
/// single-use refresh token and strand the deployment on `invalid_grant`.
pub struct TokenRefresher {
    token_url: String,
    client_id: String,
    client_secret: String,
    key: [u8; 32],
    repo: Arc<dyn OauthTokenRepository>,
    http: reqwest::Client,
    cached: Mutex<Option<String>>,
}

impl TokenRefresher {
    pub fn new(
        config: &UpstreamConfig,
        key: [u8; 32],
        repo: Arc<dyn OauthTokenRepository>,
    ) -> Result<Self> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(PortalError::Config(
                "upstream.client_id and upstream.client_secret are required".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            key,
            repo,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, refreshing if none is cached yet.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        self.refresh_locked(&mut cached).await
    }

    /// Unconditionally perform a refresh cycle. Used by the proactive
    /// scheduler tick.
    pub async fn force_refresh(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        self.refresh_locked(&mut cached).await
    }

    /// Refresh after observing `failed_token` rejected upstream. If another
    /// caller already rotated past it, the newer cached token is returned
    /// without a second exchange.
    pub async fn refresh_after_failure(&self, failed_token: &str) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(current) = cached.as_ref() {
            if current != failed_token {
                debug!("access token already rotated by a concurrent refresh, reusing it");
                return Ok(current.clone());
            }
        }
        self.refresh_locked(&mut cached).await
    }

    /// The actual refresh-token grant. Caller must hold the cache lock.
    async fn refresh_locked(&self, cached: &mut Option<String>) -> Result<String> {
        let record = self.repo.get_oauth_record().await?.ok_or_else(|| {
            PortalError::Config(
                "no refresh token stored; run `jobport seed-token` after authorizing the app"
                    .into(),
            )
        })?;
        let refresh_token = crypto::decrypt_from_hex(&self.key, &record.refresh_token_enc)?;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.map_token_error(status.as_u16(), &body));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            PortalError::Serialization(format!("failed to parse token response: {e}"))
        })?;

        // Persist the rotated refresh token before handing out the access
        // token; losing the rotation loses the integration.
        let updated = OauthTokenRecord {
            refresh_token_enc: crypto::encrypt_to_hex(&self.key, &token_response.refresh_token)?,
            last_refreshed: Some(Utc::now()),
            updated_at: Utc::now(),
        };
        self.repo.put_oauth_record(&updated).await?;

        *cached = Some(token_response.access_token.clone());
        debug!("access token refreshed");
        Ok(token_response.access_token)
    }

    fn map_token_error(&self, status: u16, body: &str) -> PortalError {
        let parsed: TokenErrorResponse = serde_json::from_str(body).unwrap_or_else(|_| {
            TokenErrorResponse {
                error: String::new(),
                error_description: None,
            }
        });
        let description = parsed
            .error_description
            .unwrap_or_else(|| body.chars().take(200).collect());

        match parsed.error.as_str() {
            "invalid_grant" => {
                // The stored refresh token was consumed or revoked. The
                // automated path cannot recover; an operator must re-run
                // the authorization flow and reseed the store.
                error!(
                    "upstream rejected the refresh token (invalid_grant); \
                     re-authorize the integration and run `jobport seed-token`"
                );
                PortalError::RefreshTokenInvalid(description)
            }
            "invalid_client" => {
                error!("upstream rejected client credentials (invalid_client)");
                PortalError::Config(format!("invalid client credentials: {description}"))
            }
            _ => {
                warn!(status, "token endpoint returned a transient error");
                PortalError::Upstream {
                    status,
                    body: description,
                }
            }
        }
    }
}
