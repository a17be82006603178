//! TOML-based configuration system for Jobport.
//!
//! Configuration is loaded once at process start into an immutable
//! [`PortalConfig`] and passed down to components; nothing reads the
//! environment inside business logic.

use crate::error::{PortalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level Jobport configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub portal: PortalSection,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

/// Core portal instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSection {
    pub instance_name: String,
    pub data_dir: String,
    /// Public base URL embedded in password setup/reset links.
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database backend configuration (SQLite).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Some("/var/lib/jobport/jobport.db".into()),
        }
    }
}

/// Upstream field-service API (ServiceM8) OAuth integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// OAuth 2.0 token endpoint used for the refresh-token grant.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Proactive refresh cadence. Must sit under the upstream access-token
    /// TTL (60 minutes) so a valid token exists before anyone needs it.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64,
    /// Per-request timeout for upstream and token-endpoint calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_interval_minutes: default_refresh_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.servicem8.com/api_1.0".into()
}

fn default_token_url() -> String {
    "https://go.servicem8.com/oauth/access_token".into()
}

fn default_refresh_interval() -> u64 {
    48
}

fn default_request_timeout() -> u64 {
    30
}

/// Outbound mail delivery configuration. The portal hands fully-formed
/// links to a delivery webhook; it never renders or sends email itself.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub from_address: Option<String>,
}

impl PortalConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PortalError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.portal.instance_name.is_empty() {
            return Err(PortalError::Config(
                "portal.instance_name must not be empty".into(),
            ));
        }

        if self.portal.data_dir.is_empty() {
            return Err(PortalError::Config(
                "portal.data_dir must not be empty".into(),
            ));
        }

        if self.portal.database.path.is_none() {
            return Err(PortalError::Config("portal.database.path is required".into()));
        }

        if self.upstream.client_id.is_empty() || self.upstream.client_secret.is_empty() {
            return Err(PortalError::Config(
                "upstream.client_id and upstream.client_secret are required".into(),
            ));
        }

        if self.upstream.refresh_interval_minutes == 0
            || self.upstream.refresh_interval_minutes >= 60
        {
            return Err(PortalError::Config(
                "upstream.refresh_interval_minutes must be between 1 and 59".into(),
            ));
        }

        // A stuck tick must not delay the next one.
        if self.upstream.request_timeout_secs * 2 > self.upstream.refresh_interval_minutes * 60 {
            return Err(PortalError::Config(
                "upstream.request_timeout_secs must be well under the refresh interval".into(),
            ));
        }

        if self.mail.enabled && self.mail.webhook_url.is_none() {
            return Err(PortalError::Config(
                "mail.webhook_url is required when mail is enabled".into(),
            ));
        }

        if self.mail.enabled && self.portal.public_url.is_none() {
            return Err(PortalError::Config(
                "portal.public_url is required when mail is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Generate a sensible default configuration.
    pub fn generate_default() -> Self {
        Self {
            portal: PortalSection {
                instance_name: "My Trade Business".into(),
                data_dir: "/var/lib/jobport".into(),
                public_url: None,
                database: DatabaseConfig::default(),
            },
            upstream: UpstreamConfig::default(),
            mail: MailConfig::default(),
        }
    }

    /// Path to the secret key file protecting the refresh token at rest.
    pub fn key_file_path(&self) -> std::path::PathBuf {
        Path::new(&self.portal.data_dir).join("secret.key")
    }
}
