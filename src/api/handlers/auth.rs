//! Login, current user and logout

use super::ApiResponse;
use crate::api::extract::{AuthUser, ValidForm};
use crate::api::state::AppState;
use crate::error::{FeedbackError, Result};
use crate::types::AccessToken;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub username: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub is_authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct LogoutMessage {
    pub message: String,
    pub username: String,
}

pub async fn login(
    State(state): State<AppState>,
    ValidForm(form): ValidForm<LoginForm>,
) -> Result<Json<ApiResponse<AccessToken>>> {
    let user = state
        .auth
        .authenticate(&form.username, &form.password)
        .await?
        .ok_or_else(|| FeedbackError::Unauthorized("Incorrect username or password".to_string()))?;

    let token = state.auth.issue_token(&user.username)?;
    Ok(Json(ApiResponse::ok(token)))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser { username }: AuthUser,
) -> Result<Json<ApiResponse<CurrentUser>>> {
    let user = state
        .storage
        .get_user(&username)
        .await?
        .ok_or_else(|| FeedbackError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(CurrentUser {
        username: user.username,
        full_name: user.full_name,
        is_admin: user.is_admin,
        is_authenticated: true,
    })))
}

/// Tokens are stateless; the client discards its copy
pub async fn logout(AuthUser { username }: AuthUser) -> Json<ApiResponse<LogoutMessage>> {
    info!("User '{}' logged out", username);
    Json(ApiResponse::ok(LogoutMessage {
        message: "Successfully logged out".to_string(),
        username,
    }))
}
