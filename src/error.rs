use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Story generation failed: {0}")]
    StoryGeneration(String),

    #[error("Image generation failed: {0}")]
    ImageGeneration(String),

    #[error("Narration failed: {0}")]
    Narration(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Image decode error: {0}")]
    DecodeError(#[from] image::ImageError),
}

impl AppError {
    /// The underlying message, without the variant's prefix.
    pub fn detail(&self) -> String {
        match self {
            AppError::Config(msg)
            | AppError::BadRequest(msg)
            | AppError::StoryGeneration(msg)
            | AppError::ImageGeneration(msg)
            | AppError::Narration(msg)
            | AppError::Unexpected(msg) => msg.clone(),
            AppError::HttpError(e) => e.to_string(),
            AppError::DecodeError(e) => e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::StoryGeneration(msg) => {
                (StatusCode::BAD_GATEWAY, "STORY_ERROR", msg.clone())
            }
            AppError::ImageGeneration(msg) => {
                (StatusCode::BAD_GATEWAY, "IMAGE_ERROR", msg.clone())
            }
            AppError::Narration(msg) => (StatusCode::BAD_GATEWAY, "NARRATION_ERROR", msg.clone()),
            AppError::Unexpected(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UNEXPECTED_ERROR",
                format!(
                    "An unexpected error occurred: {}. Please try again with a different prompt or refresh the page.",
                    msg
                ),
            ),
            AppError::HttpError(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            AppError::DecodeError(e) => (StatusCode::BAD_GATEWAY, "DECODE_ERROR", e.to_string()),
        };

        tracing::error!("Request failed: {} - {}", code, message);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
