//! Shared-course detection: the same course taught to several departments at once.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use types::{Course, CourseGroup, SchedulingPolicy};

use crate::venue::div_ceil;

fn code_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]{2,4})\s?(\d{3})").ok()).as_ref()
}

fn foundational_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]{2}10[0-9]").ok()).as_ref()
}

/// `"GST 101"`, `"gst101"` and `"GST101.2"` all become `"GST101"`.
pub fn normalize_code(code: &str) -> Option<String> {
    let upper = code.trim().to_ascii_uppercase();
    let caps = code_pattern()?.captures(&upper)?;
    Some(format!("{}{}", &caps[1], &caps[2]))
}

/// Bucket key for a course. Codes that do not parse are kept verbatim.
pub fn base_code(code: &str) -> String {
    normalize_code(code).unwrap_or_else(|| code.trim().to_ascii_uppercase())
}

/// Entry-level course: two letters followed by `10` and a digit (`GST101` matches on `ST101`).
pub fn is_foundational(code: &str) -> bool {
    match (normalize_code(code), foundational_pattern()) {
        (Some(c), Some(re)) => re.is_match(&c),
        _ => false,
    }
}

/// First digit of the numeric part of the code, e.g. `2` for `CSC201`.
pub fn level_of(course: &Course) -> Option<u32> {
    if let Some(level) = course.academic_level.as_deref() {
        if let Some(d) = level.trim().chars().next().and_then(|c| c.to_digit(10)) {
            return Some(d);
        }
    }
    course
        .code
        .chars()
        .find(|c| c.is_ascii_digit())
        .and_then(|c| c.to_digit(10))
}

/// Groups courses by normalized code. Output is ordered by code, so repeated calls on
/// the same input return identical groups.
pub fn identify_shared_courses(courses: &[Course]) -> Vec<CourseGroup> {
    let mut buckets: BTreeMap<String, Vec<&Course>> = BTreeMap::new();
    for c in courses {
        buckets.entry(base_code(&c.code)).or_default().push(c);
    }

    buckets
        .into_iter()
        .map(|(code, members)| {
            let departments: BTreeSet<&str> =
                members.iter().map(|c| c.department.as_str()).collect();
            CourseGroup {
                course_code: code,
                is_shared_course: departments.len() > 1,
                departments: departments.into_iter().map(str::to_string).collect(),
                total_students: members.iter().map(|c| c.class_size).sum(),
                courses: members.into_iter().cloned().collect(),
            }
        })
        .collect()
}

pub fn should_group_courses(group: &CourseGroup, policy: &SchedulingPolicy) -> bool {
    group.is_shared_course
        && group.courses.len() > 1
        && policy
            .shared_course_codes
            .iter()
            .any(|c| base_code(c) == group.course_code)
}

/// Combined enrollment spread evenly over one section per department.
pub fn calculate_optimal_class_size(group: &CourseGroup) -> u32 {
    let departments = group.departments.len().max(1) as u32;
    div_ceil(group.total_students, departments)
}

/// Derived copies of the input with grouped members capped to the group's optimal size
/// and tagged `grouped_with:<code>`. The source records are left untouched.
pub fn apply_grouping(
    courses: &[Course],
    groups: &[CourseGroup],
    policy: &SchedulingPolicy,
) -> Vec<Course> {
    let sizes: BTreeMap<&str, u32> = groups
        .iter()
        .filter(|g| should_group_courses(g, policy))
        .map(|g| (g.course_code.as_str(), calculate_optimal_class_size(g)))
        .collect();

    courses
        .iter()
        .map(|c| {
            let code = base_code(&c.code);
            let Some(&optimal) = sizes.get(code.as_str()) else {
                return c.clone();
            };
            let mut grouped = c.clone();
            grouped.class_size = optimal.min(c.class_size);
            let tag = format!("grouped_with:{code}");
            if !grouped.constraints.contains(&tag) {
                grouped.constraints.push(tag);
            }
            grouped
        })
        .collect()
}
