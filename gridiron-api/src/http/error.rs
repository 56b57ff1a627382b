// HTTP error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Result type for HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

/// Application error with HTTP status code
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for AppError {}

/// Error response JSON structure
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Convert core errors to HTTP errors.
///
/// The browser-facing message is deliberately uniform for anything
/// security-relevant; the distinct variants exist so the log tells
/// operators whether a provider integration broke at the state check, the
/// exchange or the signature.
impl From<gridiron_core::Error> for AppError {
    fn from(err: gridiron_core::Error) -> Self {
        use gridiron_core::Error;

        match err {
            Error::UnknownProvider(name) => {
                tracing::warn!(provider = %name, "request for unregistered provider");
                AppError::not_found("provider not found")
            }
            Error::InvalidState => AppError::unauthorized("authentication failed"),
            Error::TokenVerification(reason) => {
                tracing::warn!(reason = %reason, "identity token verification failed");
                AppError::unauthorized("authentication failed")
            }
            Error::Exchange(reason) => {
                tracing::error!(reason = %reason, "code exchange failed");
                AppError::internal_server_error("authentication failed")
            }
            Error::MissingIdentityToken => {
                tracing::error!("provider response carried no identity token");
                AppError::internal_server_error("authentication failed")
            }
            Error::MalformedClaims(reason) => {
                tracing::error!(reason = %reason, "provider returned malformed claims");
                AppError::internal_server_error("authentication failed")
            }
            Error::ProviderInit { provider, reason } => {
                tracing::error!(provider = %provider, reason = %reason, "provider initialization failed");
                AppError::internal_server_error("internal server error")
            }
            Error::Redis(e) => {
                tracing::error!("redis error: {e}");
                AppError::internal_server_error("service temporarily unavailable")
            }
            Error::Serialization(e) => {
                tracing::error!("serialization error: {e}");
                AppError::internal_server_error("internal server error")
            }
            Error::Internal(reason) => {
                tracing::error!(reason = %reason, "internal error");
                AppError::internal_server_error("internal server error")
            }
        }
    }
}
