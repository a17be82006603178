use std::path::Path;

use jobport_core::config::PortalConfig;
use jobport_core::crypto;
use jobport_core::db::DatabasePool;
use tracing::info;

/// Run the `init` command: create the data directory, write a default
/// config, generate the secret key, and set up the database.
pub async fn run(data_dir: &str) -> anyhow::Result<()> {
    let data_path = Path::new(data_dir);

    if !data_path.exists() {
        std::fs::create_dir_all(data_path)?;
        info!("Created data directory: {}", data_dir);
    }

    let db_path = data_path.join("jobport.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let mut config = PortalConfig::generate_default();
    config.portal.data_dir = data_dir.to_string();
    config.portal.database.path = Some(db_path_str.clone());

    // Key protecting the stored refresh token at rest.
    let key_path = config.key_file_path();
    if key_path.exists() {
        anyhow::bail!(
            "refusing to overwrite existing key file at {}",
            key_path.display()
        );
    }
    crypto::create_key_file(&key_path)?;
    info!("Generated secret key: {}", key_path.display());

    let config_path = data_path.join("jobport.toml");
    let toml_str = toml::to_string_pretty(&config)?;
    std::fs::write(&config_path, &toml_str)?;
    info!("Wrote configuration to {}", config_path.display());

    let connect_str = format!("sqlite:{}?mode=rwc", db_path_str);
    DatabasePool::new_sqlite(&connect_str).await?;
    info!("Database initialized at {}", db_path_str);

    println!("Jobport initialized successfully!");
    println!("  Data directory: {}", data_dir);
    println!("  Configuration: {}", config_path.display());
    println!("  Database:      {}", db_path_str);
    println!("  Secret key:    {}", key_path.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} and fill in upstream.client_id / client_secret",
        config_path.display()
    );
    println!("  2. Authorize the app with your ServiceM8 account and run");
    println!("     `jobport seed-token <refresh_token>` with the token you receive");
    println!("  3. Run `jobport status --check-upstream` to verify the connection");
    println!("  4. Run `jobport serve` to start the portal");

    Ok(())
}
