use axum::{extract::State, Json};
use jobs::StoredSchedule;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/v1/schedule",
    responses((status = 200, description = "Stored timetable", body = StoredSchedule))
)]
pub async fn current(State(state): State<AppState>) -> Json<StoredSchedule> {
    Json(state.store.snapshot())
}

#[utoipa::path(
    post,
    path = "/v1/schedule/publish",
    responses(
        (status = 200, description = "Published timetable", body = StoredSchedule),
        (status = 409, description = "Nothing to publish")
    )
)]
pub async fn publish(State(state): State<AppState>) -> Result<Json<StoredSchedule>, ApiError> {
    if !state.store.publish() {
        return Err(ApiError::conflict("no schedule has been generated yet"));
    }
    let snap = state.store.snapshot();
    info!(items = snap.items.len(), exams = snap.exams.len(), "schedule published");
    Ok(Json(snap))
}
