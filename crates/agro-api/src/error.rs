//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure resolves to one of the stable codes in
//! [`agro_core::ErrorCode`] and is rendered as
//! `{"error": {"code", "title", "status", "detail"}}`. Unclassified store
//! failures are reported as 422 and their cause is only logged.

use agro_core::{ErrorCode, ValidationError};
use agro_store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `"INVALID_PARAMS"`.
    pub code: String,
    /// Human-readable title.
    pub title: String,
    /// HTTP status, repeated in the body.
    pub status: u16,
    /// Additional context. Omitted for unclassified failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body or path could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Failure raised by a use case or a store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::BadRequest(_) => ErrorCode::InvalidParams,
            Self::Store(err) => err.code(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        let code = self.code();
        let status =
            StatusCode::from_u16(code.status()).unwrap_or(StatusCode::UNPROCESSABLE_ENTITY);
        (status, code.as_str())
    }

    fn title(&self) -> String {
        match self {
            Self::BadRequest(_) => ErrorCode::InvalidParams.title().to_string(),
            Self::Store(err) if err.is_typed() => err.title(),
            Self::Store(_) => ErrorCode::UnprocessableEntity.title().to_string(),
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::BadRequest(msg) => Some(msg.clone()),
            Self::Store(err) if err.is_typed() => Some(err.to_string()),
            Self::Store(_) => None,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Store(StoreError::Validation(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            Self::Store(err) if !err.is_typed() => {
                tracing::error!(error = %err, "unclassified store failure");
            }
            other => tracing::debug!(error = %other, code, "request rejected"),
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                title: self.title(),
                status: status.as_u16(),
                detail: self.detail(),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_store::DbError;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn bad_request_status_code() {
        let err = AppError::BadRequest("malformed JSON".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "INVALID_PARAMS");
    }

    #[test]
    fn not_found_status_code() {
        let err = AppError::from(StoreError::NotFound("No producers found.".into()));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn validation_errors_are_client_errors() {
        let err = AppError::from(ValidationError::InvalidState("XX".into()));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "INVALID_STATE");
    }

    #[test]
    fn unclassified_store_error_is_unprocessable() {
        let err = AppError::from(StoreError::from(DbError::Other("connection reset".into())));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn into_response_invalid_params() {
        let err = AppError::from(StoreError::InvalidParams("Invalid crop_id: 99".into()));
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, "INVALID_PARAMS");
        assert_eq!(body.error.title, "Invalid crop_id: 99");
        assert_eq!(body.error.status, 400);
    }

    #[tokio::test]
    async fn into_response_validation_uses_code_title() {
        let err = AppError::from(ValidationError::InvalidName("Fulano".into()));
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, "INVALID_NAME");
        assert_eq!(body.error.title, "Invalid Name");
        assert!(body.error.detail.unwrap().contains("Fulano"));
    }

    #[tokio::test]
    async fn into_response_hides_unclassified_cause() {
        let err = AppError::from(StoreError::from(DbError::Other(
            "password authentication failed".into(),
        )));
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.title, "Unprocessable Entity");
        assert!(body.error.detail.is_none());
    }

    #[test]
    fn error_body_skips_missing_detail() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "NOT_FOUND".to_string(),
                title: "No producers found.".to_string(),
                status: 404,
                detail: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("No producers found."));
        assert!(!json.contains("detail"));
    }
}
