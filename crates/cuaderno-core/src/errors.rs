//! Application error type.
//!
//! Every handler and service returns `Result<T, AppError>`. The error carries
//! the HTTP status it maps to and an [`anyhow::Error`] whose message becomes
//! the `error` field of the JSON body:
//!
//! ```json
//! { "error": "Subject not found" }
//! ```
//!
//! Any `E: Into<anyhow::Error>` converts into a 500 through `?`, so database
//! and I/O errors bubble up without ceremony. Use the named constructors when
//! the failure is the client's fault.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn internal_error(message: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow::anyhow!(message))
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn unauthorized(message: String) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message))
    }

    pub fn forbidden(message: String) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            // Internal details stay in the logs.
            tracing::error!(error = ?self.error, "Request failed");
        }

        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_status() {
        assert_eq!(
            AppError::bad_request(anyhow::anyhow!("x")).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found(anyhow::anyhow!("x")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::conflict(anyhow::anyhow!("x")).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::unauthorized("x".to_string()).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("x".to_string()).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::unprocessable(anyhow::anyhow!("x")).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_question_mark_maps_to_internal() {
        fn fails() -> Result<(), AppError> {
            let _: i32 = "not a number".parse::<i32>()?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_keeps_status() {
        let response = AppError::not_found(anyhow::anyhow!("Subject not found")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
