use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend error ({status}): {message}")]
    BackendError { status: u16, message: String },

    #[error("Malformed backend response: {0}")]
    MalformedBackendResponse(String),
}

// Unreadable request bodies are client input errors like any other.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

impl AppError {
    /// Wrap a non-success backend reply, keeping its body text as-is.
    pub fn from_backend(status: StatusCode, body: &str) -> Self {
        AppError::BackendError {
            status: status.as_u16(),
            message: format!("speaches.ai server error: {}", body),
        }
    }
}

/// Start-up failures; these never reach a client.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid SPEACHES_URL '{0}': {1}")]
    BackendUrl(String, url::ParseError),

    #[error("PORT must be a number, got '{0}'")]
    Port(String),

    #[error("Invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            AppError::BackendUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "BACKEND_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::BackendError { status, message } => (
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                "BACKEND_ERROR",
                message.clone(),
            ),
            AppError::MalformedBackendResponse(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MALFORMED_BACKEND_RESPONSE",
                msg.clone(),
            ),
        };

        tracing::error!("Request failed: {} - {}", code, message);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
