//! Error types for the BDJ4 web endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Main error type for the web endpoints
#[derive(Error, Debug)]
pub enum WebError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Notification error: {0}")]
    NotifyError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl WebError {
    /// True when the underlying IO error is "already exists"
    pub fn is_already_exists(&self) -> bool {
        matches!(self, WebError::IoError(e) if e.kind() == std::io::ErrorKind::AlreadyExists)
    }

    /// True when the underlying IO error is "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, WebError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        let status = match self {
            WebError::ValidationError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, status.canonical_reason().unwrap_or("error")).into_response()
    }
}
