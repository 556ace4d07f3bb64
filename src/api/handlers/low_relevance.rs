use crate::api::extract::{AuthUser, ValidJson, ValidQuery};
use crate::api::params::LowRelevanceParams;
use crate::api::state::AppState;
use crate::error::Result;
use crate::types::{LowRelevanceGroup, LowRelevanceResult, LowRelevanceResultCreate, Page};
use axum::{extract::State, http::StatusCode, Json};

pub async fn create_low_relevance_result(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidJson(result): ValidJson<LowRelevanceResultCreate>,
) -> Result<(StatusCode, Json<LowRelevanceResult>)> {
    let created = state.storage.record_low_relevance_result(&result).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn low_relevance_summary(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidQuery(params): ValidQuery<LowRelevanceParams>,
) -> Result<Json<Page<LowRelevanceGroup>>> {
    let window = params.window()?;
    let range = params.range()?;
    let page = state.storage.low_relevance_summary(window, range).await?;
    Ok(Json(page))
}
