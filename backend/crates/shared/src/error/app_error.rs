//! Application Error - Unified error type for the HTTP boundary
//!
//! Domain crates keep their own `thiserror` enums and convert into
//! [`AppError`] only when a response has to be rendered.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use super::kind::ErrorKind;

/// アプリケーション統一エラー型
///
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::Conflict, "Email already registered")
///     .with_code("DUPLICATE_EMAIL");
/// assert_eq!(err.code(), Some("DUPLICATE_EMAIL"));
/// ```
#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    /// Stable machine-readable code (e.g. `DUPLICATE_EMAIL`)
    code: Option<&'static str>,
}

/// `Result<T, AppError>` の省略形です。
pub type AppResult<T> = Result<T, AppError>;

/// RFC 7807 problem document
#[derive(Debug, Serialize)]
pub struct Problem<'a> {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: &'static str,
    pub status: u16,
    pub detail: &'a str,
    pub code: Option<&'static str>,
}

impl AppError {
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    #[inline]
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn code(&self) -> Option<&'static str> {
        self.code
    }

    /// Body rendered at the HTTP boundary
    pub fn problem(&self) -> Problem<'_> {
        Problem {
            type_uri: format!("https://httpstatuses.io/{}", self.status_code()),
            title: self.kind.as_str(),
            status: self.status_code(),
            detail: &self.message,
            code: self.code,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(code) = self.code {
            write!(f, " ({})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
