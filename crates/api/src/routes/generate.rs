use axum::{extract::State, Json};
use sched_core::{EngineError, ScheduleStore, Solver};
use solver_heur::report;
use tracing::{error, info};
use types::{GenerateRequest, GenerateResponse, GenerationResult, ValidationResult};

use crate::error::ApiError;
use crate::state::AppState;

/// Fills empty course or venue lists from the store.
pub async fn hydrate(state: &AppState, req: &mut GenerateRequest) -> Result<(), EngineError> {
    if req.courses.is_empty() {
        req.courses = state
            .store
            .fetch_courses()
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;
    }
    if req.venues.is_empty() {
        req.venues = state
            .store
            .fetch_venues()
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;
    }
    Ok(())
}

fn unvalidated() -> ValidationResult {
    ValidationResult {
        is_valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
    }
}

/// Runs one generation and saves the draft. Infrastructure failures become a failed
/// result with one `system-error` conflict per course.
pub async fn run(state: &AppState, mut req: GenerateRequest) -> Result<GenerationResult, ApiError> {
    if let Err(e) = hydrate(state, &mut req).await {
        if req.courses.is_empty() {
            return Err(e.into());
        }
        error!(error = %e, "could not load inputs");
        return Ok(report::failed_result(&req.courses, &e.to_string(), unvalidated()));
    }

    let courses = req.courses.clone();
    let result = match state.solver().generate(req).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "generation aborted");
            return Ok(report::failed_result(&courses, &e.to_string(), unvalidated()));
        }
    };

    if !result.schedule.is_empty() {
        if let Err(e) = state.store.save_schedule(result.schedule.clone(), false).await {
            let e = EngineError::Storage(e.to_string());
            error!(error = %e, "draft not saved");
            return Ok(report::failed_result(&courses, &e.to_string(), result.validation_result));
        }
    }
    Ok(result)
}

#[utoipa::path(
    post,
    path = "/v1/generate",
    request_body = GenerateRequest,
    responses(
        (
            status = 200,
            description = "Generated timetable; success=false carries only conflicts",
            body = GenerateResponse
        )
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let result = run(&state, req).await?;
    for (kind, list) in report::group_conflicts(&result.conflicts) {
        info!(?kind, count = list.len(), "conflicts");
    }
    let resp = report::to_response(result);
    info!(outcome = ?resp.outcome, message = %resp.message, "generate finished");
    Ok(Json(resp))
}
