//! Error types for the highlighter service
//!
//! All errors use thiserror for structured error handling.
//! At the HTTP boundary they are rendered as `{"error": "..."}` bodies.

use crate::auth::TokenError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("No account found for email: {0}")]
    UserNotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] TokenError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("File is too large (limit is {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// Conflicts, bad credentials and upload constraint failures answer 400,
    /// which is what existing clients of the API expect.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Conflict(_)
            | AppError::InvalidCredentials
            | AppError::UserNotFound(_)
            | AppError::PayloadTooLarge { .. }
            | AppError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            tracing::debug!("Request rejected ({}): {}", status.as_u16(), self);
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
