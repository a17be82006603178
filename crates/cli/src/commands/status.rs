use std::sync::Arc;

use jobport_core::crypto;
use jobport_core::db::repository::OauthTokenRepository;
use jobport_core::oauth::refresher::TokenRefresher;
use jobport_core::upstream::UpstreamClient;
use tracing::info;

/// Run the `status` command: show configuration and integration status.
pub async fn run(config_path: &str, check_upstream: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    info!("Loaded configuration from {}", config_path);

    let db_size = config
        .portal
        .database
        .path
        .as_deref()
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|| "unknown".to_string());

    let repo = super::open_repository(&config).await?;

    println!("Jobport Status");
    println!("==============");
    println!("Instance:  {}", config.portal.instance_name);
    println!("Database:  SQLite ({})", db_size);
    println!("Upstream:  {}", config.upstream.base_url);
    println!(
        "Refresh:   every {} minutes",
        config.upstream.refresh_interval_minutes
    );
    println!();

    match repo.get_oauth_record().await? {
        Some(record) => {
            println!("OAuth Integration");
            println!("-----------------");
            match record.last_refreshed {
                Some(at) => {
                    println!("Last refresh: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
                }
                None => {
                    println!("Last refresh: never (token seeded, not yet exchanged)");
                }
            }
            println!(
                "Updated:      {}",
                record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => {
            println!("No refresh token stored.");
            println!("Run `jobport seed-token <refresh_token>` to connect the upstream account.");
            return Ok(());
        }
    }

    if check_upstream {
        println!();
        let key = crypto::load_key_file(&config.key_file_path())?;
        let refresher = Arc::new(TokenRefresher::new(&config.upstream, key, repo)?);
        let upstream = UpstreamClient::new(&config.upstream, refresher)?;
        match upstream.test_connection().await {
            Ok(()) => println!("Upstream check: OK"),
            Err(e) => {
                println!("Upstream check: FAILED ({})", e);
                anyhow::bail!("upstream connectivity check failed");
            }
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
