//! Database initialization command

use feedback_core::{config::AppConfig, error::Result};
use tracing::debug;

/// Create the database file and apply the schema
pub async fn handle(config: &AppConfig) -> Result<()> {
    debug!("Initializing database...");

    super::open_storage(config).await?;

    println!("Database initialized: {}", config.database_path.display());
    Ok(())
}
