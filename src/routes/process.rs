use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::job::Job;
use crate::models::requests::{ProcessRequest, ProcessResponse};
use crate::routes::upload::upload_file_name;
use crate::services::processor::BatchRequest;

/// POST /api/process: Start a background job over previously uploaded files.
pub async fn start_processing(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::validation(format!("Invalid request: {}", e.body_text())))?;
    request.validate()?;

    let mut files = Vec::with_capacity(request.files.len());
    for name in &request.files {
        let path = upload_file_name(name)
            .map(|base| state.upload_dir.join(base))
            .ok_or_else(|| ApiError::validation(format!("File not found: {name}")))?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ApiError::validation(format!("File not found: {name}")));
        }
        files.push(path);
    }

    let job_id = state.processor.submit(BatchRequest {
        files,
        include_topic_cards: request.include_topic_cards,
        cards_per_topic: Some(request.cards_per_topic).filter(|n| *n > 0),
    })?;

    Ok(Json(ProcessResponse {
        message: "Processing started".to_string(),
        job_id,
    }))
}

/// GET /api/process/{job_id}: Current status of a job.
pub async fn get_processing_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    state
        .registry
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found"))
}
