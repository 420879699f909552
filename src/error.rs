//! Error types for the GitHub login bridge
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Each step of the login flow fails with its own variant so the
/// handler can answer with a distinct status and message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// User declined the GitHub consent screen (400)
    #[error("GitHub authorization was denied: {0}")]
    AuthorizationDenied(String),

    /// Code-for-token exchange with GitHub failed (400)
    #[error("Failed to auth using github - access token: {0}")]
    Exchange(String),

    /// Fetching the GitHub user profile failed (400)
    #[error("Failed to auth using github - user details: {0}")]
    Profile(String),

    /// Token could not be signed (500)
    #[error("Signing error: {0}")]
    Signing(String),

    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::AuthorizationDenied(_) => "authorization_denied",
            AppError::Exchange(_) => "exchange",
            AppError::Profile(_) => "profile",
            AppError::Signing(_) => "signing",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::AuthorizationDenied(_)
            | AppError::Exchange(_)
            | AppError::Profile(_) => StatusCode::BAD_REQUEST,
            AppError::Signing(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to a plain-text HTTP response
    ///
    /// Upstream details stay in the logs; the client only sees which
    /// step of the flow failed.
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::AuthorizationDenied(_) => self.to_string(),
            AppError::Exchange(_) => "Failed to auth using github - access token".to_string(),
            AppError::Profile(_) => "Failed to auth using github - user details".to_string(),
            AppError::Signing(_) => "Failed to issue tokens".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal server error".to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
        } else {
            tracing::warn!(error = %self, kind = self.kind(), "Request rejected");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.kind()]).inc();

        (status, message).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
