use axum::{extract::State, Json};
use sched_core::{EngineError, ScheduleStore};
use solver_heur::exam::generate_exam_schedule;
use tracing::info;
use types::{ExamGenerateRequest, ExamScheduleResult};

use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/v1/exams/generate",
    request_body = ExamGenerateRequest,
    responses(
        (status = 200, description = "Exam timetable", body = ExamScheduleResult),
        (status = 400, description = "Inverted date range or no venues")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(mut req): Json<ExamGenerateRequest>,
) -> Result<Json<ExamScheduleResult>, ApiError> {
    let storage = |e: anyhow::Error| EngineError::Storage(e.to_string());
    if req.courses.is_empty() {
        req.courses = state.store.fetch_exam_courses().await.map_err(storage)?;
    }
    if req.venues.is_empty() {
        req.venues = state.store.fetch_venues().await.map_err(storage)?;
    }
    let policy = req.policy.as_ref().unwrap_or(&state.config.policy);

    let out = generate_exam_schedule(
        &req.courses,
        &req.venues,
        req.start_date,
        req.end_date,
        policy,
    )?;
    if !out.schedule.is_empty() {
        state
            .store
            .save_exam_schedule(out.schedule.clone(), false)
            .await
            .map_err(storage)?;
    }
    info!(
        placed = out.summary.scheduled_courses,
        conflicts = out.conflicts.len(),
        "exam generation finished"
    );
    Ok(Json(out))
}
