//! Error types for proplet.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    /// Admin action on a record that does not satisfy its preconditions.
    /// Approving an already-verified identity lands here rather than being
    /// silently swallowed.
    #[error("Not found or ineligible: {0}")]
    NotFoundOrIneligible(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment-unlock attempted before identity verification. Carries the
    /// path the caller should resume from once verification completes.
    #[error("Identity not verified")]
    IdentityNotVerified {
        /// Where to continue the interrupted flow.
        resume: String,
    },

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    /// Payment or notification transport failure. Retryable.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::NotFoundOrIneligible(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::IdentityNotVerified { .. } => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Redis(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::NotFoundOrIneligible(_) => "NOT_FOUND_OR_INELIGIBLE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::IdentityNotVerified { .. } => "IDENTITY_NOT_VERIFIED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let mut error = json!({
            "code": code,
            "message": self.to_string(),
        });

        // The unlock flow resumes after verification; tell the caller where.
        if let Self::IdentityNotVerified { resume } = &self {
            error["resume"] = json!(resume);
        }

        let body = Json(json!({ "error": error }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFoundOrIneligible("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::IdentityNotVerified {
                resume: "/api/identity/submit".into()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Provider("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            AppError::Validation("bad nin".into()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::IdentityNotVerified {
                resume: "/".into()
            }
            .error_code(),
            "IDENTITY_NOT_VERIFIED"
        );
    }
}
