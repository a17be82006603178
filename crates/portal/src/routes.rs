//! Portal route handlers.
//!
//! Every handler is a thin translation layer: decode the request, call the
//! core, map the outcome to a status code. Credential-link failures are
//! deliberately uniform so responses leak nothing about why a link failed
//! or whether an account exists.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use jobport_core::error::PortalError;
use jobport_core::models::credential::TokenPurpose;
use jobport_core::models::upstream::NewJobNote;
use jobport_core::models::user::PortalUser;

use crate::AppState;

pub async fn health() -> &'static str {
    "ok"
}

// -- Request payloads --

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub company_uuid: Option<String>,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Deserialize)]
pub struct JobsQuery {
    pub company: String,
}

#[derive(Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

// -- Handlers --

/// POST /users — create a portal identity and send its setup link.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    use jobport_core::db::repository::PortalUserRepository;

    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "a valid email address is required"})),
        )
            .into_response();
    }

    match state.repo.get_user_by_email(&email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"error": "a user with that email already exists"})),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => return error_response(e),
    }

    let user = PortalUser::new(&email, req.company_uuid.as_deref());
    if let Err(e) = state.repo.create_user(&user).await {
        return error_response(e);
    }

    send_credential_link(&state, &user, TokenPurpose::PasswordSetup).await;

    (StatusCode::CREATED, Json(json!({"uuid": user.uuid, "email": user.email})))
        .into_response()
}

/// POST /auth/forgot-password — always 204, whether or not the account
/// exists.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Response {
    use jobport_core::db::repository::PortalUserRepository;

    match state.repo.get_user_by_email(&req.email).await {
        Ok(Some(user)) => {
            send_credential_link(&state, &user, TokenPurpose::PasswordReset).await;
        }
        Ok(None) => {}
        Err(e) => return error_response(e),
    }
    StatusCode::NO_CONTENT.into_response()
}

/// POST /auth/resend-setup — re-send the setup link for an account that
/// has not set a password yet. Always 204.
pub async fn resend_setup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Response {
    use jobport_core::db::repository::PortalUserRepository;

    match state.repo.get_user_by_email(&req.email).await {
        Ok(Some(user)) if user.password_hash.is_none() => {
            send_credential_link(&state, &user, TokenPurpose::PasswordSetup).await;
        }
        Ok(_) => {}
        Err(e) => return error_response(e),
    }
    StatusCode::NO_CONTENT.into_response()
}

/// GET /auth/reset/:token — UI-only link validity check. Read-only; never
/// consumes the token.
pub async fn check_reset_link(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Response {
    match state.credentials.peek(&token).await {
        Ok(Some(claim)) => Json(claim).into_response(),
        Ok(None) => invalid_link_response(StatusCode::NOT_FOUND),
        Err(e) => error_response(e),
    }
}

/// POST /auth/reset/:token — consume the token and set the password.
pub async fn submit_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<PasswordRequest>,
) -> Response {
    if req.password.len() < 8 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "password must be at least 8 characters"})),
        )
            .into_response();
    }

    match state.credentials.consume(&token, &req.password).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(PortalError::CredentialInvalid) => invalid_link_response(StatusCode::BAD_REQUEST),
        Err(e) => error_response(e),
    }
}

/// GET /api/jobs?company=<uuid> — proxy the job list for one client.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JobsQuery>,
) -> Response {
    match state.upstream.list_jobs(&query.company).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/jobs/:uuid — proxy a single job.
pub async fn get_job(State(state): State<Arc<AppState>>, Path(uuid): Path<String>) -> Response {
    match state.upstream.get_job(&uuid).await {
        Ok(job) => Json(job).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/jobs/:uuid/notes — attach a note to a job.
pub async fn create_job_note(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
    Json(req): Json<NoteRequest>,
) -> Response {
    let note = req.note.trim();
    if note.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "note must not be empty"})),
        )
            .into_response();
    }
    let new_note = NewJobNote {
        related_object_uuid: uuid,
        note: note.to_string(),
    };
    match state.upstream.create_job_note(&new_note).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => error_response(e),
    }
}

// -- Helpers --

async fn send_credential_link(state: &AppState, user: &PortalUser, purpose: TokenPurpose) {
    let token = match state
        .credentials
        .generate(&user.email, &user.uuid, purpose)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "failed to generate credential token");
            return;
        }
    };

    let base = state
        .config
        .portal
        .public_url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string();
    let link = format!("{base}/reset/{token}");
    state
        .mailer
        .send_credential_link(&user.email, purpose, &link)
        .await;
}

fn invalid_link_response(status: StatusCode) -> Response {
    // One message for not-found, expired, and consumed alike.
    (status, Json(json!({"error": "invalid or expired link"}))).into_response()
}

fn error_response(err: PortalError) -> Response {
    match err {
        PortalError::CredentialInvalid => invalid_link_response(StatusCode::BAD_REQUEST),
        PortalError::Upstream { status: 404, .. } => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "not found"})),
        )
            .into_response(),
        PortalError::Upstream { .. } | PortalError::Http(_) | PortalError::Unauthorized(_) => {
            warn!(error = %err, "upstream call failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "upstream service unavailable"})),
            )
                .into_response()
        }
        PortalError::RefreshTokenInvalid(_) | PortalError::Config(_) => {
            error!(error = %err, "upstream integration is not operational");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "service temporarily unavailable"})),
            )
                .into_response()
        }
        other => {
            error!(error = %other, "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
                .into_response()
        }
    }
}
