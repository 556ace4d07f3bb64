//! CLI command handlers
//!
//! Each subcommand is implemented in its own module.

pub mod init;
pub mod serve;
pub mod users;

use feedback_core::{config::AppConfig, error::Result, SqliteStorage};
use tracing::debug;

/// Open the configured database and make sure the schema exists
pub async fn open_storage(config: &AppConfig) -> Result<SqliteStorage> {
    debug!("Database path: {}", config.database_path.display());
    let storage = SqliteStorage::with_pool_size(&config.database_path, config.pool_size)?;
    storage.init_schema().await?;
    Ok(storage)
}
