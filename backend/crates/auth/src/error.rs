//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Another identity already uses the email
    #[error("There is an identity with that email already")]
    DuplicateEmail,

    /// Identity not found
    #[error("Identity not found")]
    NotFound,

    /// Password did not match
    #[error("Invalid email or password")]
    InvalidCredential,

    /// No pending verification for the code
    #[error("Verification code not found")]
    VerificationNotFound,

    /// Token malformed, forged, expired or missing its subject
    #[error("Invalid token")]
    InvalidToken,

    /// Protected operation without an attached identity
    #[error("Authentication required")]
    Unauthorized,

    /// Input rejected by a value object
    #[error("{0}")]
    Validation(String),

    /// Concurrent edits kept winning the version check
    #[error("Identity was modified concurrently, please retry")]
    EditConflict,

    /// Mail collaborator failed
    #[error("Mail delivery failed: {0}")]
    MailDelivery(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Any other collaborator failure
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::DuplicateEmail | AuthError::EditConflict => ErrorKind::Conflict,
            AuthError::NotFound | AuthError::VerificationNotFound => ErrorKind::NotFound,
            AuthError::InvalidCredential | AuthError::InvalidToken | AuthError::Unauthorized => {
                ErrorKind::Unauthorized
            }
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::MailDelivery(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Unexpected(_) => ErrorKind::InternalServerError,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::InvalidCredential => "INVALID_CREDENTIAL",
            AuthError::VerificationNotFound => "VERIFICATION_NOT_FOUND",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::Validation(_) => "VALIDATION",
            AuthError::EditConflict => "EDIT_CONFLICT",
            AuthError::MailDelivery(_) => "MAIL_DELIVERY",
            AuthError::Database(_) | AuthError::Unexpected(_) => "UNEXPECTED",
        }
    }

    /// Collapse login failures so callers cannot probe which emails exist
    pub fn collapse_login(self) -> Self {
        match self {
            AuthError::NotFound | AuthError::InvalidCredential => AuthError::InvalidCredential,
            other => other,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side details (database messages) never reach the caller.
    pub fn to_app_error(&self) -> AppError {
        let message = match self {
            AuthError::Database(_) | AuthError::Unexpected(_) => {
                "Something went wrong, please try again later".to_string()
            }
            other => other.to_string(),
        };
        AppError::new(self.kind(), message).with_code(self.code())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Unexpected(msg) => {
                tracing::error!(message = %msg, "Auth unexpected error");
            }
            AuthError::MailDelivery(msg) => {
                tracing::error!(message = %msg, "Mail delivery error");
            }
            AuthError::InvalidCredential => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::EditConflict => {
                tracing::warn!("Identity edit lost the version race");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<kernel::id::InvalidId> for AuthError {
    fn from(err: kernel::id::InvalidId) -> Self {
        AuthError::Validation(err.to_string())
    }
}
