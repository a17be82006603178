pub mod init;
pub mod seed_token;
pub mod serve;
pub mod status;

use std::path::Path;
use std::sync::Arc;

use jobport_core::config::PortalConfig;
use jobport_core::db::sqlite::SqliteRepository;
use jobport_core::db::DatabasePool;

/// Load and validate configuration, then open the configured database.
pub(crate) async fn open_repository(
    config: &PortalConfig,
) -> anyhow::Result<Arc<SqliteRepository>> {
    let path = config
        .portal
        .database
        .path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SQLite path not configured"))?;
    let connect_str = format!("sqlite:{}?mode=rwc", path);
    let pool = match DatabasePool::new_sqlite(&connect_str).await? {
        DatabasePool::Sqlite(p) => p,
    };
    Ok(Arc::new(SqliteRepository::new(pool)))
}

pub(crate) fn load_config(config_path: &str) -> anyhow::Result<PortalConfig> {
    let config = PortalConfig::load(Path::new(config_path))?;
    config.validate()?;
    Ok(config)
}
