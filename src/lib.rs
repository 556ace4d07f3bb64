//! Feedback Backend - reporting service for a question-answering product
//!
//! Records user feedback on answers, QA exchanges, rerank diagnostics,
//! low-relevance and no-result retrieval outcomes, and OneNote sync logs,
//! and serves paginated reports over them to an admin dashboard.
//!
//! # Architecture
//!
//! - **Types**: Records, write payloads, summaries, pagination and date ranges
//! - **Storage**: `ReportStorage` trait and its SQLite implementation
//! - **Auth**: bcrypt password checks and signed bearer tokens
//! - **API**: axum router, extractors and handlers
//!
//! # Example
//!
//! ```ignore
//! use feedback_core::{api::{ApiServer, ApiServerConfig, AppState}, auth::Authenticator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = feedback_core::config::AppConfig::load(None)?;
//!     let storage = Arc::new(feedback_core::SqliteStorage::new(&config.database_path)?);
//!     storage.init_schema().await?;
//!
//!     let auth = Arc::new(Authenticator::from_config(storage.clone(), &config)?);
//!     let server = ApiServer::new(ApiServerConfig::default(), AppState::new(storage, auth));
//!     server.serve(async { let _ = tokio::signal::ctrl_c().await; }).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{FeedbackError, Result};
pub use storage::{sqlite::SqliteStorage, ReportStorage};
pub use types::{DateRange, Page, Pagination};
