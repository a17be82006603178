//! Timer-driven proactive refresh.
//!
//! Keeps one refresh cycle ahead of access-token expiry so request paths
//! rarely see a 401. A failed tick is logged and the cadence continues —
//! the reactive guard recovers correctness on the next real request.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::db::repository::CredentialTokenRepository;
use crate::error::PortalError;

use super::refresher::TokenRefresher;

/// A cancellable background task: each tick runs one timeout-bounded
/// refresh cycle and sweeps expired credential tokens. Stopped -> Running
/// on [`RefreshScheduler::start`], back to Stopped on
/// [`RefreshScheduler::stop`]; a failed tick never leaves Running.
pub struct RefreshScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn start(
        refresher: Arc<TokenRefresher>,
        tokens: Arc<dyn CredentialTokenRepository>,
        interval: Duration,
        tick_timeout: Duration,
    ) -> Self {
        let (shutdown, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tick(&refresher, tokens.as_ref(), tick_timeout).await;
                    }
                    _ = rx.changed() => {
                        debug!("proactive refresh scheduler stopping");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the scheduler and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

async fn tick(
    refresher: &TokenRefresher,
    tokens: &dyn CredentialTokenRepository,
    tick_timeout: Duration,
) {
    match tokio::time::timeout(tick_timeout, refresher.force_refresh()).await {
        Ok(Ok(_)) => debug!("proactive token refresh succeeded"),
        Ok(Err(e)) => match e {
            // Fatal categories stop all upstream integration until an
            // operator intervenes; they must never drown in warn noise.
            PortalError::RefreshTokenInvalid(_) | PortalError::Config(_) => {
                error!(error = %e, "proactive token refresh failed fatally");
            }
            _ => {
                warn!(error = %e, "proactive token refresh failed, will retry next tick");
            }
        },
        Err(_) => {
            warn!("proactive token refresh timed out");
        }
    }

    match tokens.delete_expired_credential_tokens().await {
        Ok(0) => {}
        Ok(removed) => debug!(removed, "swept expired credential tokens"),
        Err(e) => warn!(error = %e, "failed to sweep expired credential tokens"),
    }
}
