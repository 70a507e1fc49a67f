//! Canned remediation text keyed by problem type.

use types::{ConflictType, ValidationErrorType};

pub fn suggestion_for(kind: ConflictType) -> &'static str {
    match kind {
        ConflictType::Lecturer => {
            "Move one of the lecturer's other classes or assign a co-lecturer to free a slot"
        }
        ConflictType::Venue => "Split the class or add a larger venue to the pool",
        ConflictType::CrossDepartmental => {
            "Coordinate with the other departments to agree on a shared slot"
        }
        ConflictType::Resource => "Add venues or widen the teaching week",
        ConflictType::SystemError => "Retry the generation; contact support if it persists",
    }
}

pub fn remediation_for(kind: ValidationErrorType) -> &'static str {
    match kind {
        ValidationErrorType::VenueCapacity => "Split the class into sections or add a larger venue",
        ValidationErrorType::LecturerOverload => "Redistribute courses among available lecturers",
        ValidationErrorType::MissingData => "Fill in the missing course fields",
        ValidationErrorType::CrossLevelConflict => {
            "Co-schedule the shared sections for carryover students"
        }
    }
}

/// Placement-time conflict category a pre-validation problem turns into when it stops a run.
pub fn conflict_type_for(kind: ValidationErrorType) -> ConflictType {
    match kind {
        ValidationErrorType::VenueCapacity => ConflictType::Venue,
        ValidationErrorType::LecturerOverload => ConflictType::Lecturer,
        ValidationErrorType::MissingData => ConflictType::Resource,
        ValidationErrorType::CrossLevelConflict => ConflictType::CrossDepartmental,
    }
}
