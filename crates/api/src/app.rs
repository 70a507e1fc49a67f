use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::routes;
use crate::state::AppState;
use crate::telemetry;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::validate::validate_handler,
        routes::groups::groups,
        routes::generate::generate,
        routes::jobs::create,
        routes::jobs::status,
        routes::jobs::result,
        routes::exams::generate,
        routes::schedule::current,
        routes::schedule::publish,
    ),
    components(schemas(
        types::Day, types::TimeSlot, types::Course, types::Venue, types::ScheduleItem,
        types::CourseGroup, types::ConflictType, types::Severity, types::ScheduleConflict,
        types::ValidationErrorType, types::WarningType, types::ValidationIssue,
        types::ValidationWarning, types::ValidationResult, types::FallbackOptions,
        types::SchedulingPolicy, types::SolverKind, types::GenerateRequest,
        types::ScheduleSummary, types::GenerationResult, types::RunOutcome,
        types::GenerateResponse, types::ExamCourse, types::Session, types::ExamScheduleItem,
        types::ExamConflict, types::ExamGenerateRequest, types::ExamScheduleResult,
        types::CourseId, types::VenueId,
        jobs::JobId, jobs::JobStatus, jobs::StoredSchedule,
        routes::health::Health,
        routes::validate::ValidateIn,
        routes::groups::GroupsIn,
        routes::groups::GroupsOut,
        routes::jobs::JobCreated,
    )),
    tags(
        (name = "unischedule", description = "Timetable generation API")
    )
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/groups", post(routes::groups::groups))
        .route("/v1/generate", post(routes::generate::generate))
        .route("/v1/jobs", post(routes::jobs::create))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/v1/exams/generate", post(routes::exams::generate))
        .route("/v1/schedule", get(routes::schedule::current))
        .route("/v1/schedule/publish", post(routes::schedule::publish))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(state)
}
