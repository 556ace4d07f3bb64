//! OneNote sync logging and run statistics

use crate::api::extract::{AuthUser, ValidJson, ValidQuery};
use crate::api::params::SyncStatsParams;
use crate::api::state::AppState;
use crate::error::{FeedbackError, Result};
use crate::types::{
    PageMetadata, PageMetadataUpdate, SyncLogCreate, SyncLogEntry, SyncRunDetails, SyncStatsPage,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn create_sync_log(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidJson(log): ValidJson<SyncLogCreate>,
) -> Result<(StatusCode, Json<SyncLogEntry>)> {
    if log.sync_run_id.trim().is_empty() || log.page_id.trim().is_empty() {
        return Err(FeedbackError::Validation(
            "sync_run_id and page_id must not be empty".to_string(),
        ));
    }
    let created = state.storage.record_sync_log(&log).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn upsert_page_metadata(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(page_id): Path<String>,
    ValidJson(update): ValidJson<PageMetadataUpdate>,
) -> Result<Json<PageMetadata>> {
    let stored = state
        .storage
        .upsert_page_metadata(&update.into_metadata(page_id))
        .await?;
    Ok(Json(stored))
}

pub async fn sync_stats(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidQuery(params): ValidQuery<SyncStatsParams>,
) -> Result<Json<SyncStatsPage>> {
    let window = params.window()?;
    let page = state.storage.sync_stats(window).await?;
    Ok(Json(SyncStatsPage {
        total: page.total,
        page: window.skip / window.limit + 1,
        page_size: window.limit,
        data: page.data,
    }))
}

pub async fn sync_run_details(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(sync_run_id): Path<String>,
) -> Result<Json<SyncRunDetails>> {
    let details = state.storage.sync_run_details(&sync_run_id).await?;
    Ok(Json(details))
}
