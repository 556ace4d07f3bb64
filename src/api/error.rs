//! Mapping of `FeedbackError` onto HTTP responses
//!
//! Every error body is `{"detail": "<message>"}`. Internal failures are
//! logged and replaced with a generic message.

use crate::error::FeedbackError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl FeedbackError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FeedbackError::Validation(_) | FeedbackError::Conflict(_) => StatusCode::BAD_REQUEST,
            FeedbackError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FeedbackError::Forbidden(_) => StatusCode::FORBIDDEN,
            FeedbackError::NotFound(_) => StatusCode::NOT_FOUND,
            FeedbackError::Database(_)
            | FeedbackError::Hashing(_)
            | FeedbackError::Config(_)
            | FeedbackError::Io(_)
            | FeedbackError::Serialization(_)
            | FeedbackError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FeedbackError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(ErrorBody { detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (FeedbackError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (FeedbackError::Conflict("x".into()), StatusCode::BAD_REQUEST),
            (FeedbackError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (FeedbackError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (FeedbackError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (FeedbackError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (FeedbackError::Hashing("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = FeedbackError::Unauthorized("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_internal_errors_hidden() {
        let response = FeedbackError::Database("disk I/O error".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
