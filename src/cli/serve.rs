//! HTTP API server command

use feedback_core::{
    api::{ApiServer, ApiServerConfig, AppState},
    auth::Authenticator,
    config::AppConfig,
    error::Result,
    storage::ReportStorage,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Start the API server and run until Ctrl-C
pub async fn handle(config: &AppConfig) -> Result<()> {
    debug!("Starting HTTP API server...");

    let addr = config.socket_addr()?;
    let storage: Arc<dyn ReportStorage> = Arc::new(super::open_storage(config).await?);
    let auth = Arc::new(Authenticator::from_config(storage.clone(), config)?);
    let state = AppState::new(storage, auth);

    let server = ApiServer::new(ApiServerConfig { addr }, state);
    info!("Starting feedback API server [{}]", server.instance_id());

    server
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
