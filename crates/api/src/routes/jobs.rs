use axum::{
    extract::{Path, State},
    Json,
};
use jobs::JobStatus;
use serde::Serialize;
use types::{GenerateRequest, GenerationResult};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::routes::generate::hydrate;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
    post,
    path = "/v1/jobs",
    request_body = GenerateRequest,
    responses((status = 200, description = "Job enqueued", body = JobCreated))
)]
pub async fn create(
    State(state): State<AppState>,
    Json(mut req): Json<GenerateRequest>,
) -> Result<Json<JobCreated>, ApiError> {
    hydrate(&state, &mut req).await?;
    let id = state.jobs.enqueue(req);
    Ok(Json(JobCreated {
        job_id: id.0,
        status: "queued",
    }))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job status", body = JobStatus),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("job {id} not found")))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/result",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Generation result (if ready)", body = GenerationResult),
        (status = 404, description = "Unknown job"),
        (status = 409, description = "Job not finished or failed")
    )
)]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenerationResult>, ApiError> {
    match state.jobs.get(&id) {
        Some(JobStatus::Done { result }) => Ok(Json(result)),
        Some(JobStatus::Failed { message }) => {
            Err(ApiError::conflict(format!("job failed: {message}")))
        }
        Some(_) => Err(ApiError::conflict("job not ready")),
        None => Err(ApiError::not_found(format!("job {id} not found"))),
    }
}
