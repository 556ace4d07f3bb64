//! Shared handler state

use crate::auth::Authenticator;
use crate::storage::ReportStorage;
use std::sync::Arc;

/// Cloned into every handler; holds no mutable request state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ReportStorage>,
    pub auth: Arc<Authenticator>,
    /// Short id distinguishing server processes in logs
    pub instance_id: String,
}

impl AppState {
    pub fn new(storage: Arc<dyn ReportStorage>, auth: Arc<Authenticator>) -> Self {
        Self {
            storage,
            auth,
            instance_id: uuid::Uuid::new_v4().to_string()[..8].to_string(),
        }
    }
}
