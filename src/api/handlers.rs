use axum::{extract::State, Json};
use std::sync::Arc;

use super::{AccentsResponse, HealthResponse, StoryResponse};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::storyteller::StoryRequest;
use crate::tts::Accent;

pub async fn create_story(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StoryRequest>,
) -> Result<Json<StoryResponse>, AppError> {
    // Run on its own task so a panic anywhere in the pipeline becomes an
    // error response for this request only.
    let task_state = Arc::clone(&state);
    let report = tokio::spawn(async move { task_state.storyteller.tell(request).await })
        .await
        .map_err(|e| AppError::Unexpected(e.to_string()))??;

    Ok(Json(report.into()))
}

pub async fn list_accents() -> Json<AccentsResponse> {
    Json(AccentsResponse {
        accents: Accent::ALL.iter().map(|a| a.info()).collect(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
