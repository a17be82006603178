use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use jobport_core::credentials::CredentialTokenManager;
use jobport_core::crypto;
use jobport_core::oauth::refresher::TokenRefresher;
use jobport_core::oauth::scheduler::RefreshScheduler;
use jobport_core::upstream::UpstreamClient;
use jobport_portal::mailer::{Mailer, NoopMailer, WebhookMailer};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

/// Run the `serve` command: start the portal web server and the proactive
/// token refresh scheduler.
pub async fn run(config_path: &str, port: u16) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let key = crypto::load_key_file(&config.key_file_path())?;
    let repo = super::open_repository(&config).await?;

    let refresher = Arc::new(TokenRefresher::new(&config.upstream, key, repo.clone())?);
    let upstream = Arc::new(UpstreamClient::new(&config.upstream, refresher.clone())?);

    let scheduler = RefreshScheduler::start(
        refresher,
        repo.clone(),
        Duration::from_secs(config.upstream.refresh_interval_minutes * 60),
        Duration::from_secs(config.upstream.request_timeout_secs * 2),
    );
    info!(
        interval_minutes = config.upstream.refresh_interval_minutes,
        "proactive token refresh scheduler started"
    );

    let mailer: Arc<dyn Mailer> = if config.mail.enabled {
        // validate() guarantees webhook_url is present when enabled.
        let webhook_url = config.mail.webhook_url.clone().unwrap_or_default();
        Arc::new(WebhookMailer::new(webhook_url, config.mail.from_address.clone()))
    } else {
        info!("mail delivery is disabled; credential links will be logged and dropped");
        Arc::new(NoopMailer)
    };

    let state = Arc::new(jobport_portal::AppState {
        repo: repo.clone(),
        config: config.clone(),
        credentials: CredentialTokenManager::new(repo),
        upstream,
        mailer,
    });

    let app = jobport_portal::router(state)
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    println!("Jobport portal listening on http://{}", addr);
    info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
