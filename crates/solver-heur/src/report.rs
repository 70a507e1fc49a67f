//! Reshapes upstream results for callers. No new analysis happens here.

use sched_core::conformance::ConformanceError;
use sched_core::suggestions::{conflict_type_for, remediation_for, suggestion_for};
use std::collections::BTreeMap;
use types::{
    ConflictType, Course, GenerateResponse, GenerationResult, RunOutcome, ScheduleConflict,
    ScheduleItem, ScheduleSummary, Severity, ValidationErrorType, ValidationIssue,
    ValidationResult,
};

pub fn summarize(total: usize, scheduled: usize) -> ScheduleSummary {
    let scheduled = scheduled.min(total);
    let success_rate = if total == 0 {
        100.0
    } else {
        scheduled as f64 / total as f64 * 100.0
    };
    ScheduleSummary {
        total_courses: total,
        scheduled_courses: scheduled,
        conflicted_courses: total - scheduled,
        success_rate,
    }
}

pub fn build_result(
    total: usize,
    schedule: Vec<ScheduleItem>,
    conflicts: Vec<ScheduleConflict>,
    validation: ValidationResult,
    fallbacks_applied: Option<Vec<String>>,
) -> GenerationResult {
    GenerationResult {
        summary: summarize(total, schedule.len()),
        pre_validation_passed: validation.is_valid,
        schedule,
        conflicts,
        validation_result: validation,
        fallbacks_applied,
    }
}

pub fn system_error(course: &Course, reason: &str) -> ScheduleConflict {
    ScheduleConflict {
        course: course.clone(),
        reason: reason.to_string(),
        conflict_type: ConflictType::SystemError,
        severity: Severity::Critical,
        suggestion: Some(suggestion_for(ConflictType::SystemError).to_string()),
    }
}

pub fn rejected_item(course: Course, error: &ConformanceError) -> ScheduleConflict {
    ScheduleConflict {
        reason: format!("Generated placement rejected: {error}"),
        course,
        conflict_type: ConflictType::SystemError,
        severity: Severity::High,
        suggestion: Some(suggestion_for(ConflictType::SystemError).to_string()),
    }
}

/// One `system-error` conflict per course, for runs that died on infrastructure.
pub fn failed_result(
    courses: &[Course],
    reason: &str,
    validation: ValidationResult,
) -> GenerationResult {
    let conflicts = courses.iter().map(|c| system_error(c, reason)).collect();
    build_result(courses.len(), Vec::new(), conflicts, validation, None)
}

/// Result of a run stopped by blocking validation errors: every course is reported,
/// carrying the most severe blocking problem that names it.
pub fn blocked_result(courses: &[Course], validation: ValidationResult) -> GenerationResult {
    let conflicts = courses
        .iter()
        .map(|c| {
            let worst: Option<&ValidationIssue> = validation
                .blocking_errors()
                .filter(|e| e.affected_courses.contains(&c.id))
                .max_by_key(|e| e.severity);
            match worst {
                Some(e) => ScheduleConflict {
                    course: c.clone(),
                    reason: e.message.clone(),
                    conflict_type: conflict_type_for(e.r#type),
                    severity: e.severity,
                    suggestion: Some(
                        e.suggestion
                            .clone()
                            .unwrap_or_else(|| remediation_for(e.r#type).to_string()),
                    ),
                },
                None => ScheduleConflict {
                    course: c.clone(),
                    reason: "Not attempted: generation stopped by blocking validation errors"
                        .into(),
                    conflict_type: ConflictType::Resource,
                    severity: Severity::Low,
                    suggestion: Some("Resolve the blocking errors or enable fallbacks".into()),
                },
            }
        })
        .collect();
    build_result(courses.len(), Vec::new(), conflicts, validation, None)
}

pub fn classify(result: &GenerationResult) -> RunOutcome {
    let s = &result.summary;
    if s.total_courses > 0 && result.schedule.is_empty() {
        RunOutcome::Failure
    } else if result.conflicts.is_empty() {
        RunOutcome::Success
    } else {
        RunOutcome::Partial
    }
}

pub fn outcome_message(result: &GenerationResult) -> String {
    let s = &result.summary;
    match classify(result) {
        RunOutcome::Success => format!("Scheduled all {} courses", s.total_courses),
        RunOutcome::Partial => format!(
            "Scheduled {} of {} courses; {} need attention",
            s.scheduled_courses, s.total_courses, s.conflicted_courses
        ),
        RunOutcome::Failure => format!(
            "No courses could be scheduled ({} conflicts)",
            result.conflicts.len()
        ),
    }
}

/// Caller-facing shape. A failed run carries no schedule and at least one conflict.
pub fn to_response(result: GenerationResult) -> GenerateResponse {
    let outcome = classify(&result);
    let message = outcome_message(&result);
    match outcome {
        RunOutcome::Failure => GenerateResponse {
            success: false,
            outcome,
            message,
            schedule: Vec::new(),
            conflicts: result.conflicts,
        },
        _ => GenerateResponse {
            success: true,
            outcome,
            message,
            schedule: result.schedule,
            conflicts: result.conflicts,
        },
    }
}

pub fn group_conflicts(
    conflicts: &[ScheduleConflict],
) -> BTreeMap<ConflictType, Vec<&ScheduleConflict>> {
    let mut out: BTreeMap<ConflictType, Vec<&ScheduleConflict>> = BTreeMap::new();
    for c in conflicts {
        out.entry(c.conflict_type).or_default().push(c);
    }
    out
}

pub fn group_issues(
    validation: &ValidationResult,
) -> BTreeMap<ValidationErrorType, Vec<&ValidationIssue>> {
    let mut out: BTreeMap<ValidationErrorType, Vec<&ValidationIssue>> = BTreeMap::new();
    for e in &validation.errors {
        out.entry(e.r#type).or_default().push(e);
    }
    out
}
