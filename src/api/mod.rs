//! HTTP API for the feedback dashboard and QA pipeline
//!
//! Provides:
//! - Bearer-token login and user administration
//! - Write endpoints for feedback, QA logs and retrieval diagnostics
//! - Paginated report endpoints
//! - OneNote sync statistics

pub mod error;
pub mod extract;
pub mod handlers;
pub mod params;
pub mod server;
pub mod state;

pub use server::{ApiServer, ApiServerConfig};
pub use state::AppState;
