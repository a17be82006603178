//! Jobport Portal — the HTTP surface of the backend-for-frontend.
//!
//! Thin handlers over `jobport-core`: the password setup/reset flow, a
//! small set of upstream proxy routes, and health.

pub mod mailer;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use jobport_core::config::PortalConfig;
use jobport_core::credentials::CredentialTokenManager;
use jobport_core::db::sqlite::SqliteRepository;
use jobport_core::upstream::UpstreamClient;

use crate::mailer::Mailer;

/// Shared application state for all portal routes.
pub struct AppState {
    pub repo: Arc<SqliteRepository>,
    pub config: PortalConfig,
    pub credentials: CredentialTokenManager,
    pub upstream: Arc<UpstreamClient>,
    pub mailer: Arc<dyn Mailer>,
}

/// Build the portal router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/users", post(routes::create_user))
        .route("/auth/forgot-password", post(routes::forgot_password))
        .route("/auth/resend-setup", post(routes::resend_setup))
        .route("/auth/reset/:token", get(routes::check_reset_link))
        .route("/auth/reset/:token", post(routes::submit_password))
        .route("/api/jobs", get(routes::list_jobs))
        .route("/api/jobs/:uuid", get(routes::get_job))
        .route("/api/jobs/:uuid/notes", post(routes::create_job_note))
        .with_state(state)
}
