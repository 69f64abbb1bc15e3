use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if !err.is_client_error() {
            tracing::error!("Internal error: {:?}", err);
            return Self::InternalError("Internal server error".to_string());
        }

        match err {
            AppError::Validation(msg) => Self::ValidationError(msg),
            other => Self::ValidationError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InternalError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            Self::ValidationError(message) => (StatusCode::BAD_REQUEST, message),
        };

        let body = ErrorResponse {
            error: message,
            status: "error".to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    fn assert_status_code<T: IntoResponse + Debug>(response: T, expected_status: StatusCode) {
        let response = response.into_response();
        assert_eq!(response.status(), expected_status);
    }

    #[test]
    fn test_app_error_to_api_error_conversion() {
        let validation = AppError::Validation("Only PDF files are allowed".to_string());
        let api_error = ApiError::from(validation);
        assert!(
            matches!(api_error, ApiError::ValidationError(msg) if msg == "Only PDF files are allowed")
        );

        let encrypted = AppError::Encrypted("locked.pdf".to_string());
        let api_error = ApiError::from(encrypted);
        assert!(matches!(api_error, ApiError::ValidationError(msg) if msg.contains("locked.pdf")));

        let internal_error = AppError::Io(std::io::Error::other("io error"));
        let api_error = ApiError::from(internal_error);
        assert!(matches!(api_error, ApiError::InternalError(_)));
    }

    #[test]
    fn test_comparison_failures_are_sanitised() {
        let err = AppError::comparison(
            "Error comparing documents",
            AppError::Configuration("GROQ_API_KEY=secret".to_string()),
        );

        let api_error = ApiError::from(err);

        assert!(matches!(&api_error, ApiError::InternalError(msg) if !msg.contains("secret")));
        assert_status_code(api_error, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_response_status_codes() {
        assert_status_code(
            ApiError::InternalError("server error".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_status_code(
            ApiError::ValidationError("invalid input".to_string()),
            StatusCode::BAD_REQUEST,
        );
    }

    #[test]
    fn test_error_messages() {
        let error = ApiError::ValidationError("bad upload".to_string());
        assert_eq!(error.to_string(), "Validation error: bad upload");

        let error = ApiError::InternalError("db password incorrect".to_string());
        assert_eq!(error.to_string(), "Internal server error");
    }
}
