use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::background_manager::BackgroundError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Background error: {0}")]
    Background(#[from] BackgroundError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a key-value, blob or bookmark store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    Invalid(String),
}

/// Image bytes that cannot be turned into pixel statistics.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Pixel buffer too short: expected {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },

    #[error("Analysis task failed: {0}")]
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Background(BackgroundError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Background(BackgroundError::Persist(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Invalid(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
