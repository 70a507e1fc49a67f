//! Corrective transformations applied after a failed or risky first pass. Each strategy
//! returns derived copies plus a description of what it changed; inputs are untouched.

use sched_core::venue::{div_ceil, max_capacity};
use std::collections::BTreeMap;
use tracing::{info, warn};
use types::{Course, CourseId, FallbackOptions, ValidationResult, Venue, VenueId};

pub use sched_core::REASSIGNMENT_TAG;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FallbackOutcome {
    pub courses: Vec<Course>,
    pub venues: Vec<Venue>,
    pub actions: Vec<String>,
}

pub fn should_apply_fallbacks(
    validation: &ValidationResult,
    placement_conflicts: usize,
    opts: &FallbackOptions,
) -> bool {
    validation.has_blocking_errors()
        || validation.warnings.len() > opts.warning_trigger
        || placement_conflicts > 0
}

/// Replaces every course larger than the largest venue with evenly sized sections.
pub fn split_oversized_classes(courses: &[Course], venues: &[Venue]) -> (Vec<Course>, Vec<String>) {
    let max_cap = max_capacity(venues);
    let mut out = Vec::with_capacity(courses.len());
    let mut actions = Vec::new();

    for c in courses {
        if max_cap == 0 || c.class_size <= max_cap {
            out.push(c.clone());
            continue;
        }
        let sections = div_ceil(c.class_size, max_cap);
        let base = c.class_size / sections;
        let extra = c.class_size % sections;
        for n in 1..=sections {
            let mut s = c.clone();
            s.id = CourseId(format!("{}_section_{}", c.id, n));
            s.code = format!("{}.{}", c.code, n);
            s.name = format!("{} (Section {})", c.name, n);
            s.class_size = base + u32::from(n <= extra);
            out.push(s);
        }
        actions.push(format!(
            "Split {} ({} students) into {} sections of at most {}",
            c.code,
            c.class_size,
            sections,
            div_ceil(c.class_size, sections)
        ));
    }
    (out, actions)
}

/// Appends "Extended Hours" copies of the largest venues under new ids.
pub fn add_venue_capacity(venues: &[Venue], max_extra: usize) -> (Vec<Venue>, Vec<String>) {
    let mut largest: Vec<&Venue> = venues.iter().collect();
    largest.sort_by_key(|v| std::cmp::Reverse(v.capacity));

    let mut out = venues.to_vec();
    let mut actions = Vec::new();
    for v in largest.into_iter().take(max_extra) {
        out.push(Venue {
            id: VenueId(format!("{}_extended", v.id)),
            name: format!("{} (Extended Hours)", v.name),
            capacity: v.capacity,
            availability: Vec::new(),
        });
        actions.push(format!(
            "Added extended-hours capacity for {} ({} seats)",
            v.name, v.capacity
        ));
    }
    (out, actions)
}

/// Drops preferred slots and every constraint mentioning time.
pub fn relax_time_preferences(courses: &[Course]) -> (Vec<Course>, Vec<String>) {
    let mut relaxed = 0usize;
    let out = courses
        .iter()
        .map(|c| {
            let mut r = c.clone();
            r.preferred_slots.clear();
            r.constraints
                .retain(|k| !k.to_ascii_lowercase().contains("time"));
            if r != *c {
                relaxed += 1;
            }
            r
        })
        .collect();
    let actions = if relaxed > 0 {
        vec![format!("Relaxed time preferences for {relaxed} courses")]
    } else {
        Vec::new()
    };
    (out, actions)
}

/// Flags a quarter of an overloaded lecturer's courses (at least one) for human review.
/// Nothing is reassigned automatically.
pub fn redistribute_lecturer_load(
    courses: &[Course],
    threshold: usize,
) -> (Vec<Course>, Vec<String>) {
    let mut by_lecturer: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, c) in courses.iter().enumerate() {
        let l = c.lecturer.trim();
        if !l.is_empty() && !l.ends_with(REASSIGNMENT_TAG) {
            by_lecturer.entry(l).or_default().push(i);
        }
    }

    let mut flagged: Vec<usize> = Vec::new();
    let mut actions = Vec::new();
    for (lecturer, idx) in &by_lecturer {
        if idx.len() <= threshold {
            continue;
        }
        let excess = (idx.len() / 4).max(1);
        flagged.extend(&idx[idx.len() - excess..]);
        warn!(lecturer, courses = idx.len(), excess, "lecturer overloaded");
        actions.push(format!(
            "Flagged {excess} of {}'s {} courses for reassignment",
            lecturer,
            idx.len()
        ));
    }

    let out = courses
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut r = c.clone();
            if flagged.contains(&i) {
                r.lecturer = format!("{} {}", c.lecturer.trim(), REASSIGNMENT_TAG);
            }
            r
        })
        .collect();
    (out, actions)
}

/// Runs every enabled strategy once, in a fixed order.
pub fn apply_fallbacks(
    courses: &[Course],
    venues: &[Venue],
    opts: &FallbackOptions,
) -> FallbackOutcome {
    let mut courses = courses.to_vec();
    let mut venues = venues.to_vec();
    let mut actions = Vec::new();

    if opts.split_oversized {
        let (c, a) = split_oversized_classes(&courses, &venues);
        courses = c;
        actions.extend(a);
    }
    if opts.add_venue_capacity && opts.max_extra_venues > 0 {
        let (v, a) = add_venue_capacity(&venues, opts.max_extra_venues);
        venues = v;
        actions.extend(a);
    }
    if opts.relax_time_preferences {
        let (c, a) = relax_time_preferences(&courses);
        courses = c;
        actions.extend(a);
    }
    if opts.redistribute_lecturer_load {
        let (c, a) = redistribute_lecturer_load(&courses, opts.reassignment_threshold);
        courses = c;
        actions.extend(a);
    }

    info!(
        actions = actions.len(),
        courses = courses.len(),
        venues = venues.len(),
        "fallbacks applied"
    );
    FallbackOutcome {
        courses,
        venues,
        actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Day, TimeSlot, ValidationWarning, WarningType};

    fn course(id: &str, code: &str, lecturer: &str, size: u32) -> Course {
        Course {
            id: id.into(),
            code: code.into(),
            name: format!("{code} course"),
            lecturer: lecturer.into(),
            class_size: size,
            department: "Computer Science".into(),
            academic_level: None,
            preferred_slots: vec![],
            constraints: vec![],
        }
    }

    fn venue(id: &str, capacity: u32) -> Venue {
        Venue {
            id: id.into(),
            name: id.to_uppercase(),
            capacity,
            availability: vec![],
        }
    }

    #[test]
    fn oversized_course_becomes_sections() {
        let (out, actions) =
            split_oversized_classes(&[course("c1", "CS101", "Dr. X", 601)], &[venue("v", 300)]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].id.0, "c1_section_1");
        assert_eq!(out[2].code, "CS101.3");
        assert!(out.iter().all(|c| c.class_size <= 300));
        assert_eq!(out.iter().map(|c| c.class_size).sum::<u32>(), 601);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn fitting_courses_are_not_split() {
        let input = vec![course("c1", "CS101", "Dr. X", 300)];
        let (out, actions) = split_oversized_classes(&input, &[venue("v", 300)]);
        assert_eq!(out, input);
        assert!(actions.is_empty());
    }

    #[test]
    fn extended_venues_are_appended_not_replaced() {
        let venues: Vec<Venue> = (1..=5).map(|i| venue(&format!("v{i}"), i * 10)).collect();
        let (out, actions) = add_venue_capacity(&venues, 3);
        assert_eq!(out.len(), 8);
        assert_eq!(&out[..5], &venues[..]);
        assert_eq!(out[5].id.0, "v5_extended");
        assert!(out[5].name.ends_with("(Extended Hours)"));
        assert_eq!(actions.len(), 3);
    }

    #[test]
    fn time_preferences_are_stripped() {
        let mut c = course("c1", "CSC201", "Dr. X", 20);
        c.preferred_slots = vec![TimeSlot::new(Day::Mon, 8, 10)];
        c.constraints = vec!["time:morning".into(), "grouped_with:GST101".into()];
        let (out, actions) = relax_time_preferences(&[c]);
        assert!(out[0].preferred_slots.is_empty());
        assert_eq!(out[0].constraints, vec!["grouped_with:GST101".to_string()]);
        assert_eq!(actions, vec!["Relaxed time preferences for 1 courses".to_string()]);
    }

    #[test]
    fn twelve_courses_flag_three_for_reassignment() {
        let courses: Vec<Course> = (0..12)
            .map(|i| course(&format!("c{i}"), &format!("CSC{}", 300 + i), "Dr. X", 10))
            .collect();
        let (out, actions) = redistribute_lecturer_load(&courses, 8);
        let flagged: Vec<&Course> = out
            .iter()
            .filter(|c| c.lecturer.ends_with(REASSIGNMENT_TAG))
            .collect();
        assert_eq!(flagged.len(), 3);
        assert_eq!(flagged[0].id.0, "c9");
        assert_eq!(flagged[0].lecturer, "Dr. X (Reassignment Needed)");
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn redistribution_is_opt_in() {
        let courses: Vec<Course> = (0..12)
            .map(|i| course(&format!("c{i}"), &format!("CSC{}", 300 + i), "Dr. X", 10))
            .collect();
        let out = apply_fallbacks(&courses, &[venue("v", 50)], &FallbackOptions::default());
        assert!(out.courses.iter().all(|c| c.lecturer == "Dr. X"));

        let opts = FallbackOptions {
            redistribute_lecturer_load: true,
            ..FallbackOptions::default()
        };
        let out = apply_fallbacks(&courses, &[venue("v", 50)], &opts);
        assert_eq!(
            out.courses
                .iter()
                .filter(|c| c.lecturer.ends_with(REASSIGNMENT_TAG))
                .count(),
            3
        );
    }

    #[test]
    fn trigger_rules() {
        let clean = ValidationResult {
            is_valid: true,
            errors: vec![],
            warnings: vec![],
        };
        let opts = FallbackOptions::default();
        assert!(!should_apply_fallbacks(&clean, 0, &opts));
        assert!(should_apply_fallbacks(&clean, 1, &opts));
    }

    #[test]
    fn more_than_three_warnings_trigger_without_errors() {
        let warned = |n: usize| ValidationResult {
            is_valid: true,
            errors: vec![],
            warnings: (0..n)
                .map(|i| ValidationWarning {
                    r#type: WarningType::LecturerLoad,
                    message: format!("Dr. {i} carries a heavy load of 7 courses"),
                    affected_courses: vec![],
                    suggestion: None,
                })
                .collect(),
        };
        let opts = FallbackOptions::default();
        assert!(!should_apply_fallbacks(&warned(3), 0, &opts));
        assert!(should_apply_fallbacks(&warned(4), 0, &opts));
    }
}
