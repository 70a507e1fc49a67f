//! Static checks over the whole course set and venue pool, run before any placement.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use types::{
    Course, CourseId, SchedulingPolicy, Severity, ValidationErrorType, ValidationIssue,
    ValidationResult, ValidationWarning, Venue, WarningType,
};

use crate::grouping::{identify_shared_courses, level_of};
use crate::lecturer_identity;
use crate::venue::{div_ceil, max_capacity};

/// Runs every check and returns their union. Never mutates its input.
pub fn perform_pre_generation_validation(
    courses: &[Course],
    venues: &[Venue],
    policy: &SchedulingPolicy,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_venue_capacity(courses, venues, &mut errors);
    check_lecturer_load(courses, policy, &mut errors, &mut warnings);
    check_missing_data(courses, &mut errors);
    check_cross_level(courses, &mut errors);
    check_utilization(courses, venues, policy, &mut warnings);

    let is_valid = !errors.iter().any(|e| e.severity.is_blocking());
    debug!(
        errors = errors.len(),
        warnings = warnings.len(),
        is_valid,
        "pre-generation validation finished"
    );
    ValidationResult {
        is_valid,
        errors,
        warnings,
    }
}

fn check_venue_capacity(courses: &[Course], venues: &[Venue], errors: &mut Vec<ValidationIssue>) {
    let max_cap = max_capacity(venues);
    for c in courses.iter().filter(|c| c.class_size > max_cap) {
        let suggestion = if max_cap == 0 {
            "Add at least one venue to the pool".to_string()
        } else {
            let groups = div_ceil(c.class_size, max_cap);
            format!(
                "Split into {} sections of {}",
                groups,
                div_ceil(c.class_size, groups)
            )
        };
        errors.push(ValidationIssue {
            r#type: ValidationErrorType::VenueCapacity,
            severity: Severity::Critical,
            message: format!(
                "{} has {} students but the largest venue holds {}",
                c.code, c.class_size, max_cap
            ),
            affected_courses: vec![c.id.clone()],
            suggestion: Some(suggestion),
        });
    }
}

fn check_lecturer_load(
    courses: &[Course],
    policy: &SchedulingPolicy,
    errors: &mut Vec<ValidationIssue>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut by_lecturer: BTreeMap<&str, Vec<CourseId>> = BTreeMap::new();
    for c in courses {
        let lecturer = lecturer_identity(&c.lecturer);
        if !lecturer.is_empty() {
            by_lecturer.entry(lecturer).or_default().push(c.id.clone());
        }
    }

    for (lecturer, ids) in by_lecturer {
        let n = ids.len();
        if n > policy.lecturer_overload_threshold {
            errors.push(ValidationIssue {
                r#type: ValidationErrorType::LecturerOverload,
                severity: Severity::High,
                message: format!("{lecturer} is assigned {n} courses"),
                affected_courses: ids,
                suggestion: Some(format!(
                    "Redistribute {} courses to other lecturers",
                    n - policy.lecturer_overload_threshold
                )),
            });
        } else if n >= policy.lecturer_warning_threshold {
            warnings.push(ValidationWarning {
                r#type: WarningType::LecturerLoad,
                message: format!("{lecturer} carries a heavy load of {n} courses"),
                affected_courses: ids,
                suggestion: Some("Monitor the weekly distribution for this lecturer".into()),
            });
        }
    }
}

fn check_missing_data(courses: &[Course], errors: &mut Vec<ValidationIssue>) {
    for c in courses {
        let mut missing = Vec::new();
        if c.code.trim().is_empty() {
            missing.push("code");
        }
        if c.name.trim().is_empty() {
            missing.push("name");
        }
        if c.lecturer.trim().is_empty() {
            missing.push("lecturer");
        }
        if c.department.trim().is_empty() {
            missing.push("department");
        }
        if c.class_size == 0 {
            missing.push("classSize");
        }
        if missing.is_empty() {
            continue;
        }
        errors.push(ValidationIssue {
            r#type: ValidationErrorType::MissingData,
            severity: Severity::Critical,
            message: format!("course {} is missing: {}", c.id, missing.join(", ")),
            affected_courses: vec![c.id.clone()],
            suggestion: Some("Complete the course record before generating".into()),
        });
    }
}

fn check_cross_level(courses: &[Course], errors: &mut Vec<ValidationIssue>) {
    for group in identify_shared_courses(courses)
        .iter()
        .filter(|g| g.is_shared_course)
    {
        let levels: BTreeSet<u32> = group.courses.iter().filter_map(level_of).collect();
        if levels.len() < 2 {
            continue;
        }
        let shown: Vec<String> = levels.iter().map(|l| format!("{l}00")).collect();
        errors.push(ValidationIssue {
            r#type: ValidationErrorType::CrossLevelConflict,
            severity: Severity::Medium,
            message: format!(
                "{} is taken at levels {} across {}",
                group.course_code,
                shown.join(", "),
                group.departments.join(", ")
            ),
            affected_courses: group.courses.iter().map(|c| c.id.clone()).collect(),
            suggestion: Some(
                "Co-schedule the sections so carryover students can attend".into(),
            ),
        });
    }
}

fn check_utilization(
    courses: &[Course],
    venues: &[Venue],
    policy: &SchedulingPolicy,
    warnings: &mut Vec<ValidationWarning>,
) {
    let demand: u64 = courses.iter().map(|c| u64::from(c.class_size)).sum();
    let supply: u64 = venues.iter().map(|v| u64::from(v.capacity)).sum();
    if (demand as f64) > policy.utilization_warning_ratio * (supply as f64) {
        warnings.push(ValidationWarning {
            r#type: WarningType::VenueUtilization,
            message: format!(
                "total enrollment {demand} exceeds {:.0}% of combined venue capacity {supply}",
                policy.utilization_warning_ratio * 100.0
            ),
            affected_courses: Vec::new(),
            suggestion: Some("Add venues or spread classes across more slots".into()),
        });
    }
}
