use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::forum::ForumError;
use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid thread URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch thread: {0}")]
    FetchFailure(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AppError::FetchFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingCredentials(_) => "missing_credentials",
            AppError::InvalidUrl(_) => "invalid_url",
            AppError::FetchFailure(_) => "fetch_failure",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Config(_) => "config_error",
        }
    }
}

impl From<ForumError> for AppError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::MissingCredentials(what) => AppError::MissingCredentials(what),
            other => AppError::FetchFailure(other.to_string()),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingCredentials(what) => AppError::MissingCredentials(what),
            other => AppError::Config(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        error!(error_code = code, message = %message, "Request failed");

        let body = Json(json!({
            "error": {
                "message": message,
                "code": code
            }
        }));

        (status, body).into_response()
    }
}
