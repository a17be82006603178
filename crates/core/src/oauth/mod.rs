//! OAuth access-token lifecycle for the upstream integration.
//!
//! The refresh token is a single-use rotating credential: every exchange
//! invalidates the previous value, so all refresh paths serialize through
//! [`refresher::TokenRefresher`]. The [`scheduler::RefreshScheduler`] keeps
//! a cycle ahead of access-token expiry; the reactive guard in
//! `crate::upstream` recovers when the timing assumption is violated.

pub mod refresher;
pub mod scheduler;

use std::sync::Arc;

use chrono::Utc;

use crate::crypto;
use crate::db::repository::OauthTokenRepository;
use crate::error::Result;
use crate::models::oauth::OauthTokenRecord;

/// Store the refresh token obtained out-of-band from the initial
/// authorization-code exchange. Until this has run, every refresh fails
/// with a configuration error.
pub async fn seed_refresh_token(
    repo: Arc<dyn OauthTokenRepository>,
    key: &[u8; 32],
    refresh_token: &str,
) -> Result<()> {
    let record = OauthTokenRecord {
        refresh_token_enc: crypto::encrypt_to_hex(key, refresh_token)?,
        last_refreshed: None,
        updated_at: Utc::now(),
    };
    repo.put_oauth_record(&record).await
}
