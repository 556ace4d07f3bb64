use crate::api::extract::ValidJson;
use crate::api::state::AppState;
use crate::error::Result;
use crate::types::{RerankResult, RerankResultCreate};
use axum::{extract::State, http::StatusCode, Json};

/// Called by the retrieval pipeline, which holds no user credentials
pub async fn create_rerank_result(
    State(state): State<AppState>,
    ValidJson(result): ValidJson<RerankResultCreate>,
) -> Result<(StatusCode, Json<RerankResult>)> {
    let created = state.storage.record_rerank_result(&result).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
