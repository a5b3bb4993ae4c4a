//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::compile::CompileError;
use super::deployments::StoreError;

/// An error rendered as `{"error": "..."}` with a matching status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<CompileError> for ApiError {
    fn from(err: CompileError) -> Self {
        let status = match err {
            CompileError::EmptySource
            | CompileError::SourceTooLarge { .. }
            | CompileError::InvalidName(_) => StatusCode::BAD_REQUEST,
            CompileError::Failed { .. } | CompileError::ContractNotFound(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CompileError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CompileError::Workspace(_)
            | CompileError::Spawn(_)
            | CompileError::MalformedOutput(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(_) | StoreError::LabelTooLong => Self::bad_request(err.to_string()),
            StoreError::Io(_) | StoreError::Corrupt(_) => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn compile_errors_map_to_status() {
        assert_eq!(
            ApiError::from(CompileError::EmptySource).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CompileError::Timeout(Duration::from_secs(30))).status,
            StatusCode::GATEWAY_TIMEOUT
        );
        let err = ApiError::from(CompileError::Failed {
            status: "exit status: 1".to_string(),
            stderr: "ParserError".to_string(),
        });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("ParserError"));
    }

    #[test]
    fn store_errors_map_to_status() {
        assert_eq!(
            ApiError::from(StoreError::LabelTooLong).status,
            StatusCode::BAD_REQUEST
        );
    }
}
