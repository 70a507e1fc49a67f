use axum::{extract::State, Json};
use sched_core::grouping::{apply_grouping, identify_shared_courses};
use serde::{Deserialize, Serialize};
use types::{Course, CourseGroup, SchedulingPolicy};
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupsIn {
    pub courses: Vec<Course>,
    #[serde(default)]
    pub policy: Option<SchedulingPolicy>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupsOut {
    pub groups: Vec<CourseGroup>,
    /// Courses as they would be placed, with shared sections capped and tagged.
    pub courses: Vec<Course>,
}

#[utoipa::path(
    post,
    path = "/v1/groups",
    request_body = GroupsIn,
    responses((status = 200, description = "Shared-course groups", body = GroupsOut))
)]
pub async fn groups(State(state): State<AppState>, Json(input): Json<GroupsIn>) -> Json<GroupsOut> {
    let policy = input.policy.as_ref().unwrap_or(&state.config.policy);
    let groups = identify_shared_courses(&input.courses);
    let courses = apply_grouping(&input.courses, &groups, policy);
    Json(GroupsOut { groups, courses })
}
