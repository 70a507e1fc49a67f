pub mod conformance;
pub mod grid;
pub mod grouping;
pub mod suggestions;
pub mod validation;
pub mod venue;

use async_trait::async_trait;
use thiserror::Error;

pub use types::{
    Course, CourseGroup, ExamCourse, ExamScheduleItem, GenerateRequest, GenerationResult,
    ScheduleConflict, ScheduleItem, SchedulingPolicy, TimeSlot, ValidationResult, Venue,
};
pub use validation::perform_pre_generation_validation;

/// Suffix a fallback pass appends to a lecturer name to flag the course for review.
pub const REASSIGNMENT_TAG: &str = "(Reassignment Needed)";

/// The person behind a lecturer field: trimmed, with any reassignment flag removed.
/// Flagged courses still belong to their lecturer until someone reassigns them.
pub fn lecturer_identity(lecturer: &str) -> &str {
    let name = lecturer.trim();
    name.strip_suffix(REASSIGNMENT_TAG).map_or(name, str::trim_end)
}

/// Failures that end a run early. Per-course problems are never reported this way.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no venues available")]
    NoVenues,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("remote scheduler failed: {0}")]
    Remote(String),
    #[error("malformed remote response: {0}")]
    MalformedResponse(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

#[async_trait]
pub trait Solver: Send + Sync + 'static {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerationResult>;
}

/// Persistence collaborator. Saves replace every row of their scope.
#[async_trait]
pub trait ScheduleStore: Send + Sync + 'static {
    async fn fetch_courses(&self) -> anyhow::Result<Vec<Course>>;
    async fn fetch_venues(&self) -> anyhow::Result<Vec<Venue>>;
    async fn fetch_exam_courses(&self) -> anyhow::Result<Vec<ExamCourse>>;
    async fn save_schedule(&self, items: Vec<ScheduleItem>, published: bool) -> anyhow::Result<()>;
    async fn save_exam_schedule(
        &self,
        items: Vec<ExamScheduleItem>,
        published: bool,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lecturer_identity_ignores_padding_and_review_flag() {
        assert_eq!(lecturer_identity("  Dr. X "), "Dr. X");
        assert_eq!(lecturer_identity("Dr. X (Reassignment Needed)"), "Dr. X");
        assert_eq!(lecturer_identity(REASSIGNMENT_TAG), "");
        assert_eq!(lecturer_identity(""), "");
    }
}
