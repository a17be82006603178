//! Portal user model — the identity record a credential token activates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A portal login identity. `company_uuid` links the user to the upstream
/// client record their jobs belong to; `password_hash` is absent until the
/// setup link has been used.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortalUser {
    pub uuid: String,
    pub email: String,
    pub company_uuid: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PortalUser {
    /// Create a new user with no password set yet.
    pub fn new(email: &str, company_uuid: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            company_uuid: company_uuid.map(str::to_string),
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}
