//! Feedback capture and dashboard reads

use crate::api::extract::{AuthUser, ValidJson, ValidQuery};
use crate::api::params::{FeedbackListParams, SummaryParams};
use crate::api::state::AppState;
use crate::error::Result;
use crate::types::{
    Feedback, FeedbackCreate, FeedbackDashboardSummary, FeedbackDetail, FeedbackSummary, Page,
};
use axum::{extract::State, http::StatusCode, Json};

/// Distinct queries shown in the dashboard's recent list
const RECENT_FEEDBACK_LIMIT: u32 = 5;

pub async fn create_feedback(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidJson(feedback): ValidJson<FeedbackCreate>,
) -> Result<(StatusCode, Json<Feedback>)> {
    let created = state.storage.record_feedback(&feedback).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidQuery(params): ValidQuery<FeedbackListParams>,
) -> Result<Json<Page<FeedbackDetail>>> {
    let page = state
        .storage
        .list_feedback(params.window()?, params.liked)
        .await?;
    Ok(Json(page))
}

pub async fn feedback_summary(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidQuery(params): ValidQuery<SummaryParams>,
) -> Result<Json<Vec<FeedbackSummary>>> {
    let summary = state
        .storage
        .feedback_summary_by_query(params.limit()?)
        .await?;
    Ok(Json(summary))
}

pub async fn dashboard_summary(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<FeedbackDashboardSummary>> {
    let summary = state
        .storage
        .feedback_dashboard_summary(RECENT_FEEDBACK_LIMIT)
        .await?;
    Ok(Json(summary))
}
