use crate::api::extract::{AuthUser, ValidJson, ValidQuery};
use crate::api::params::NoResultSummaryParams;
use crate::api::state::AppState;
use crate::error::Result;
use crate::types::{NoResultLog, NoResultLogCreate, NoResultSummary};
use axum::{extract::State, http::StatusCode, Json};

pub async fn create_no_result(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidJson(log): ValidJson<NoResultLogCreate>,
) -> Result<(StatusCode, Json<NoResultLog>)> {
    let created = state.storage.record_no_result(&log).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn no_result_summary(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidQuery(params): ValidQuery<NoResultSummaryParams>,
) -> Result<Json<Vec<NoResultSummary>>> {
    let limit = params.limit()?;
    let range = params.range()?;
    let summary = state.storage.no_result_summary(limit, range).await?;
    Ok(Json(summary))
}
