//! Unified error handling for the route layer.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as a status
//! code with a plain-text body; server faults are logged and replaced with a
//! generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::ValidationError, repository::RepositoryError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested record does not exist. Carries the client-facing message.
    #[error("{0}")]
    NotFound(&'static str),

    /// Caller is anonymous or not an admin on an admin-gated route.
    #[error("Forbidden")]
    Forbidden,

    /// Route needs an authenticated session and there is none.
    #[error("Not authenticated")]
    Unauthorized,

    /// Unknown username or wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Body failed to parse or broke a field rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),

    /// Session token could not be signed.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Configured session lifetime does not produce a valid expiry.
    #[error("Session lifetime of {0} hours is out of range")]
    SessionTtl(i64),

    /// Password hashing failed.
    #[error("Password hashing failed")]
    PasswordHash,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError(rejection.body_text()))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Repository(RepositoryError::UsernameTaken) => StatusCode::BAD_REQUEST,
            Self::Repository(_) | Self::Token(_) | Self::SessionTtl(_) | Self::PasswordHash => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            match &self {
                Self::Repository(RepositoryError::UsernameTaken) => {
                    "Username already exists".to_string()
                }
                _ => self.to_string(),
            }
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
