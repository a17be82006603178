//! Outbound mail collaborator.
//!
//! The portal hands a fully-formed link to a delivery endpoint and moves
//! on. Delivery is fire-and-forget: failures are logged but never surfaced
//! to the requester, so the auth endpoints stay oracle-free.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use jobport_core::models::credential::TokenPurpose;

/// HTTP timeout for mail webhook submissions.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a password setup/reset link to `to`.
    async fn send_credential_link(&self, to: &str, purpose: TokenPurpose, link: &str);
}

/// POSTs mail jobs to a delivery webhook (a transactional mail relay).
pub struct WebhookMailer {
    endpoint: String,
    from_address: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MailJob<'a> {
    to: &'a str,
    from: Option<&'a str>,
    template: &'a str,
    link: &'a str,
}

impl WebhookMailer {
    pub fn new(endpoint: String, from_address: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            endpoint,
            from_address,
            client,
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send_credential_link(&self, to: &str, purpose: TokenPurpose, link: &str) {
        let template = match purpose {
            TokenPurpose::PasswordSetup => "password_setup",
            TokenPurpose::PasswordReset => "password_reset",
        };
        let job = MailJob {
            to,
            from: self.from_address.as_deref(),
            template,
            link,
        };
        match self.client.post(&self.endpoint).json(&job).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "mail webhook rejected delivery");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "failed to submit mail job");
            }
        }
    }
}

/// Used when mail is disabled: logs the event and drops the link.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_credential_link(&self, to: &str, purpose: TokenPurpose, _link: &str) {
        info!(to, purpose = purpose.as_str(), "mail disabled, dropping credential link");
    }
}
