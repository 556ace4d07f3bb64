use crate::api::extract::{AuthUser, ValidJson, ValidQuery};
use crate::api::params::QaLogListParams;
use crate::api::state::AppState;
use crate::error::Result;
use crate::types::{Page, QaLog, QaLogCreate};
use axum::{extract::State, http::StatusCode, Json};

pub async fn create_qa_log(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidJson(qa_log): ValidJson<QaLogCreate>,
) -> Result<(StatusCode, Json<QaLog>)> {
    let created = state.storage.record_qa_log(&qa_log).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Case-insensitive substring search over query text, newest first
pub async fn list_qa_logs(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidQuery(params): ValidQuery<QaLogListParams>,
) -> Result<Json<Page<QaLog>>> {
    let page = state
        .storage
        .list_qa_logs(params.window()?, params.search.as_deref())
        .await?;
    Ok(Json(page))
}
