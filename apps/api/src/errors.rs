use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::posts::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to connect to the AI service: {0}")]
    Upstream(String),

    #[error("The AI service returned unusable content: {0}")]
    Parse(String),

    #[error("Failed to load posts: {0}")]
    Store(#[from] StoreError),

    /// Generation succeeded but the result could not be saved.
    #[error("Content was generated but could not be saved: {0}")]
    Persist(StoreError),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Http(_) | LlmError::Api { .. } => AppError::Upstream(e.to_string()),
            LlmError::Envelope(_) | LlmError::EmptyContent | LlmError::Content(_) => {
                AppError::Parse(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
            AppError::Parse(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PARSE_ERROR"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            AppError::Persist(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSIST_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code, "{message}");
        }

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
