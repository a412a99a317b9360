//! Error conversions
//!
//! Rendering of [`AppError`](super::app_error::AppError) as an HTTP
//! response (feature `axum`).

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for super::app_error::AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self.problem())).into_response()
    }
}
