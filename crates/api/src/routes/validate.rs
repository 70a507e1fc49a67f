use axum::{extract::State, Json};
use sched_core::perform_pre_generation_validation;
use serde::Deserialize;
use solver_heur::report::group_issues;
use tracing::info;
use types::{Course, SchedulingPolicy, ValidationResult, Venue};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::routes::generate::hydrate;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateIn {
    pub courses: Vec<Course>,
    #[serde(default)]
    pub venues: Vec<Venue>,
    #[serde(default)]
    pub policy: Option<SchedulingPolicy>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = ValidateIn,
    responses(
        (status = 200, description = "Pre-generation validation result", body = ValidationResult)
    )
)]
pub async fn validate_handler(
    State(state): State<AppState>,
    Json(input): Json<ValidateIn>,
) -> Result<Json<ValidationResult>, ApiError> {
    let mut req = types::GenerateRequest::new(input.courses, input.venues);
    hydrate(&state, &mut req).await?;
    let policy = input.policy.as_ref().unwrap_or(&state.config.policy);
    let result = perform_pre_generation_validation(&req.courses, &req.venues, policy);
    for (kind, issues) in group_issues(&result) {
        info!(?kind, count = issues.len(), "validation issues");
    }
    Ok(Json(result))
}
