use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            // Plain text, not the JSON error envelope.
            AppError::RateLimited => {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    RATE_LIMIT_MESSAGE,
                )
                    .into_response();
            }
            AppError::Internal => {
                tracing::error!("Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Why a single URL in a batch produced no metadata. The display text is
/// exactly what the client sees in the result's `error` field.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Failed to fetch metadata")]
    Fetch(#[from] reqwest::Error),
}
