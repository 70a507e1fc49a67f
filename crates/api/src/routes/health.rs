use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub remote_solver: bool,
}

#[utoipa::path(
    get,
    path = "/v1/health",
    responses((status = 200, description = "OK", body = Health))
)]
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        remote_solver: state.config.remote.is_some(),
    })
}
