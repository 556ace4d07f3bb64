//! Request extractors
//!
//! Bearer authentication plus query/body wrappers whose rejections become
//! `400 {"detail": ...}` instead of axum's plain-text defaults.

use super::state::AppState;
use crate::auth::INVALID_CREDENTIALS;
use crate::error::FeedbackError;
use crate::types::User;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Form, Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Caller identified by a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = FeedbackError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                let (scheme, token) = value.split_once(' ')?;
                scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
            })
            .filter(|token| !token.is_empty())
            .ok_or_else(|| FeedbackError::Unauthorized("Not authenticated".to_string()))?;

        let username = state.auth.verify_token(token)?;
        Ok(Self { username })
    }
}

/// Authenticated caller with the administrator flag
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = FeedbackError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser { username } = AuthUser::from_request_parts(parts, state).await?;

        let user = state
            .storage
            .get_user(&username)
            .await?
            .ok_or_else(|| FeedbackError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !user.is_admin {
            warn!("User '{}' denied access to admin route", username);
            return Err(FeedbackError::Forbidden(
                "You don't have permission to access this resource.".to_string(),
            ));
        }

        Ok(Self(user))
    }
}

/// `Query` with validation-style rejections
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = FeedbackError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Query(value)| Self(value))
            .map_err(|rejection| FeedbackError::Validation(rejection.body_text()))
    }
}

/// `Json` with validation-style rejections
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = FeedbackError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| FeedbackError::Validation(rejection.body_text()))
    }
}

/// URL-encoded form with validation-style rejections
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = FeedbackError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Form::<T>::from_request(req, state)
            .await
            .map(|Form(value)| Self(value))
            .map_err(|rejection| FeedbackError::Validation(rejection.body_text()))
    }
}
