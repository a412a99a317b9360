//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum that maps to HTTP status codes.

use serde::Serialize;

/// エラー種別の列挙体
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::Conflict.status_code(), 409);
/// assert_eq!(ErrorKind::Conflict.as_str(), "Conflict");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed or rejected input
    BadRequest,
    /// No usable identity on the request
    Unauthorized,
    NotFound,
    /// Uniqueness violation or lost concurrent modification
    Conflict,
    /// An outbound collaborator (mail API) is unreachable
    ServiceUnavailable,
    InternalServerError,
}

impl ErrorKind {
    /// Status code and reason phrase
    const fn status_line(&self) -> (u16, &'static str) {
        use ErrorKind::*;
        match self {
            BadRequest => (400, "Bad Request"),
            Unauthorized => (401, "Unauthorized"),
            NotFound => (404, "Not Found"),
            Conflict => (409, "Conflict"),
            ServiceUnavailable => (503, "Service Unavailable"),
            InternalServerError => (500, "Internal Server Error"),
        }
    }

    #[inline]
    pub const fn status_code(&self) -> u16 {
        self.status_line().0
    }

    /// Reason phrase, used as the problem document title
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.status_line().1
    }

    /// 5xx系のエラーは `true` を返します。
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
