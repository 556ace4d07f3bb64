//! Route handlers, one module per resource

pub mod auth;
pub mod feedback;
pub mod health;
pub mod low_relevance;
pub mod no_result;
pub mod qa_logs;
pub mod rerank;
pub mod sync;
pub mod users;

use serde::Serialize;

/// `{success, data}` wrapper used by the session endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
