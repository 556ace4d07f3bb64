use crate::api::extract::{AdminUser, ValidJson, ValidQuery};
use crate::api::params::ListParams;
use crate::api::state::AppState;
use crate::error::Result;
use crate::types::{Page, User, UserCreate};
use axum::{extract::State, http::StatusCode, Json};

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(user): ValidJson<UserCreate>,
) -> Result<(StatusCode, Json<User>)> {
    tracing::info!("Admin '{}' creating user '{}'", admin.username, user.username);
    let created = state.auth.register(&user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Page<User>>> {
    let page = state.storage.list_users(params.window()?).await?;
    Ok(Json(page))
}
