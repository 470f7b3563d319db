use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please enter a search query")]
    EmptyQuery,

    #[error("Rate limit exceeded. Please try again in an hour.")]
    RateLimited,

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Request processing timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Upstream request failed: {0}")]
    TransportError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyQuery => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidMode(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TransportError(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::TransportError(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(AppError::EmptyQuery.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::InvalidMode("turbo".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InternalError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
