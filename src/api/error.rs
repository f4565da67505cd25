//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::llm::LlmError;
use crate::store::StoreError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("External tool failed: {0}")]
    ExternalTool(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone())
            }
            ApiError::InvalidInput(detail) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", detail.clone())
            }
            ApiError::ExternalTool(detail) => (
                StatusCode::BAD_GATEWAY,
                "EXTERNAL_TOOL",
                detail.clone(),
            ),
            ApiError::Storage(detail) => {
                tracing::error!(detail, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE",
                    "An internal storage error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::JobNotFound(id) => ApiError::NotFound(format!("Job not found: {id}")),
            StoreError::InvalidPath(path) => {
                ApiError::InvalidInput(format!("Invalid path: {path}"))
            }
            StoreError::Io(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        ApiError::ExternalTool(err.to_string())
    }
}

impl From<crate::archive::ArchiveError> for ApiError {
    fn from(err: crate::archive::ArchiveError) -> Self {
        match err {
            crate::archive::ArchiveError::Invalid(detail) => {
                ApiError::InvalidInput(format!("Invalid ZIP archive: {detail}"))
            }
            crate::archive::ArchiveError::Io(e) => ApiError::Storage(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound("Job not found: deadbeef".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "Job not found: deadbeef");
    }

    #[tokio::test]
    async fn invalid_input_returns_400() {
        let response = ApiError::InvalidInput("Only .py and .zip accepted".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn external_tool_returns_502() {
        let response = ApiError::ExternalTool("LLM request timed out".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "EXTERNAL_TOOL");
    }

    #[tokio::test]
    async fn storage_returns_500_and_hides_detail() {
        let response = ApiError::Storage("disk full at /var/data".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "STORAGE");
        assert_eq!(json["error"]["message"], "An internal storage error occurred");
    }

    #[tokio::test]
    async fn store_not_found_maps_to_404() {
        let api_err: ApiError = StoreError::JobNotFound("cafebabe".into()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_path_maps_to_400() {
        let api_err: ApiError = StoreError::InvalidPath("../x".into()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
