//! HTTP API server for the reporting dashboard

use super::handlers::{auth, feedback, health, low_relevance, no_result, qa_logs, rerank, sync, users};
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::{future::Future, net::SocketAddr};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 8000).into(),
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn instance_id(&self) -> &str {
        &self.state.instance_id
    }

    /// Build router
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            // Health check
            .route("/health", get(health::health))
            // Session
            .route("/login", post(auth::login))
            .route("/me", get(auth::me))
            .route("/logout", post(auth::logout))
            // User administration
            .route("/users", post(users::create_user).get(users::list_users))
            // Feedback
            .route(
                "/feedback",
                post(feedback::create_feedback).get(feedback::list_feedback),
            )
            .route("/feedback/summary", get(feedback::feedback_summary))
            .route(
                "/feedback/dashboard-summary",
                get(feedback::dashboard_summary),
            )
            // QA logs and retrieval diagnostics
            .route(
                "/qa-logs",
                post(qa_logs::create_qa_log).get(qa_logs::list_qa_logs),
            )
            .route("/rerank-results", post(rerank::create_rerank_result))
            .route(
                "/low-relevance-results",
                post(low_relevance::create_low_relevance_result)
                    .get(low_relevance::low_relevance_summary),
            )
            .route("/no-result", post(no_result::create_no_result))
            .route("/no-result/summary", get(no_result::no_result_summary))
            // OneNote sync
            .route("/onenote-sync/logs", post(sync::create_sync_log))
            .route(
                "/onenote-sync/pages/:page_id",
                put(sync::upsert_page_metadata),
            )
            .route("/onenote-sync/stats", get(sync::sync_stats))
            .route(
                "/onenote-sync/stats/:sync_run_id",
                get(sync::sync_run_details),
            )
            // State
            .with_state(state)
            // Middleware
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = Self::build_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;

        info!(
            "API server [{}] listening on http://{}",
            self.state.instance_id,
            listener.local_addr()?
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server [{}] stopped", self.state.instance_id);
        Ok(())
    }
}
