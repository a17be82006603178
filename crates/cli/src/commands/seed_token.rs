use jobport_core::crypto;
use jobport_core::oauth::seed_refresh_token;
use tracing::info;

/// Run the `seed-token` command: encrypt and store the refresh token
/// obtained out-of-band from the app authorization flow.
pub async fn run(config_path: &str, refresh_token: &str) -> anyhow::Result<()> {
    let refresh_token = refresh_token.trim();
    if refresh_token.is_empty() {
        anyhow::bail!("refresh token must not be empty");
    }

    let config = super::load_config(config_path)?;
    let key = crypto::load_key_file(&config.key_file_path())?;
    let repo = super::open_repository(&config).await?;

    seed_refresh_token(repo, &key, refresh_token).await?;
    info!("Stored upstream refresh token");

    println!("Refresh token stored.");
    println!("Run `jobport status --check-upstream` to verify the integration.");
    Ok(())
}
