pub mod exam;
pub mod fallback;
pub mod placement;
pub mod report;

use async_trait::async_trait;
use sched_core::conformance::filter_schedule;
use sched_core::grouping::{apply_grouping, identify_shared_courses};
use sched_core::{perform_pre_generation_validation, EngineError, Solver};
use tracing::{info, warn};
use types::{GenerateRequest, GenerationResult, SchedulingPolicy};

use fallback::{apply_fallbacks, should_apply_fallbacks};
use placement::place_courses;

pub struct GreedySolver {
    policy: SchedulingPolicy,
}

impl GreedySolver {
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self { policy }
    }
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self::new(SchedulingPolicy::default())
    }
}

#[async_trait]
impl Solver for GreedySolver {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerationResult> {
        Ok(generate(&req, &self.policy)?)
    }
}

/// One full batch run: validate, group, place, optionally repair and place once more.
pub fn generate(
    req: &GenerateRequest,
    default_policy: &SchedulingPolicy,
) -> Result<GenerationResult, EngineError> {
    let policy = req.policy.as_ref().unwrap_or(default_policy);
    let courses = &req.courses;
    info!(
        courses = courses.len(),
        venues = req.venues.len(),
        fallbacks = req.enable_fallbacks,
        "generation started"
    );

    let validation = match &req.validation_result {
        Some(v) => v.clone(),
        None => perform_pre_generation_validation(courses, &req.venues, policy),
    };

    if courses.is_empty() {
        return Ok(report::build_result(0, Vec::new(), Vec::new(), validation, None));
    }
    if req.venues.is_empty() {
        return Err(EngineError::NoVenues);
    }
    if !validation.is_valid && !req.enable_fallbacks && !req.allow_invalid {
        warn!(
            errors = validation.errors.len(),
            "blocking validation errors and no fallbacks; nothing placed"
        );
        return Ok(report::blocked_result(courses, validation));
    }

    let groups = match &req.course_groups {
        Some(g) => g.clone(),
        None => identify_shared_courses(courses),
    };
    let mut units = apply_grouping(courses, &groups, policy);
    let mut outcome = place_courses(&units, &req.venues, policy);
    let mut fallbacks_applied = None;

    if req.enable_fallbacks
        && should_apply_fallbacks(&validation, outcome.conflicts.len(), &policy.fallback)
    {
        warn!(
            conflicts = outcome.conflicts.len(),
            "first pass incomplete; applying fallbacks"
        );
        let repaired = apply_fallbacks(&units, &req.venues, &policy.fallback);
        outcome = place_courses(&repaired.courses, &repaired.venues, policy);
        units = repaired.courses;
        fallbacks_applied = Some(repaired.actions);
    }

    let conformed = filter_schedule(outcome.schedule, &units);
    let mut conflicts = outcome.conflicts;
    conflicts.extend(
        conformed
            .rejected
            .iter()
            .map(|(c, e)| report::rejected_item(c.clone(), e)),
    );

    let result = report::build_result(
        units.len(),
        conformed.accepted,
        conflicts,
        validation,
        fallbacks_applied,
    );
    info!(
        scheduled = result.summary.scheduled_courses,
        conflicted = result.summary.conflicted_courses,
        "generation finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sched_core::grid::overlaps;
    use types::{Course, RunOutcome, Venue};

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
    fn empty_request_yields_empty_result() {
        let req = GenerateRequest::new(vec![], vec![venue("v", 100)]);
        let r = generate(&req, &SchedulingPolicy::default()).unwrap();
        assert!(r.schedule.is_empty());
        assert!(r.conflicts.is_empty());
        assert!(r.pre_validation_passed);
        assert_eq!(report::classify(&r), RunOutcome::Success);
    }

    #[test]
    fn missing_venues_end_the_run() {
        let req = GenerateRequest::new(vec![course("a", "CSC201", "Dr. A", 10)], vec![]);
        assert!(matches!(
            generate(&req, &SchedulingPolicy::default()),
            Err(EngineError::NoVenues)
        ));
    }

    #[test]
    fn blocking_errors_stop_an_unassisted_run() {
        let req = GenerateRequest::new(
            vec![course("a", "CS101", "Dr. X", 500), course("b", "CSC201", "Dr. Y", 20)],
            vec![venue("v", 300)],
        );
        let r = generate(&req, &SchedulingPolicy::default()).unwrap();
        assert!(!r.pre_validation_passed);
        assert!(r.schedule.is_empty());
        assert_eq!(r.conflicts.len(), 2);
        assert!(!report::to_response(r).success);
    }

    #[test]
    fn override_places_what_it_can() {
        let mut req = GenerateRequest::new(
            vec![course("a", "CS101", "Dr. X", 500), course("b", "CSC201", "Dr. Y", 20)],
            vec![venue("v", 300)],
        );
        req.allow_invalid = true;
        let r = generate(&req, &SchedulingPolicy::default()).unwrap();
        assert_eq!(r.schedule.len(), 1);
        assert_eq!(r.conflicts.len(), 1);
        assert_eq!(report::classify(&r), RunOutcome::Partial);
        assert!(r.fallbacks_applied.is_none());
    }

    #[test]
    fn fallbacks_split_and_place_oversized_class() {
        let mut req = GenerateRequest::new(
            vec![course("a", "CS101", "Dr. X", 500)],
            vec![venue("v", 300)],
        );
        req.enable_fallbacks = true;
        let r = generate(&req, &SchedulingPolicy::default()).unwrap();
        assert!(r.conflicts.is_empty(), "{:?}", r.conflicts);
        assert_eq!(r.schedule.len(), 2);
        assert!(r.schedule.iter().all(|i| i.course.class_size == 250));
        assert_eq!(r.summary.total_courses, 2);
        let actions = r.fallbacks_applied.unwrap();
        assert!(actions.iter().any(|a| a.starts_with("Split CS101")));
        assert_eq!(req.courses[0].class_size, 500);
    }

    #[test]
    fn overloaded_lecturer_is_flagged_when_asked() {
        let courses: Vec<Course> = (0..12)
            .map(|i| course(&format!("c{i}"), &format!("CSC{}", 300 + i), "Dr. X", 10))
            .collect();
        let mut req = GenerateRequest::new(courses, vec![venue("v", 500)]);
        req.enable_fallbacks = true;
        let mut policy = SchedulingPolicy::default();
        policy.fallback.redistribute_lecturer_load = true;
        req.policy = Some(policy);

        let r = generate(&req, &SchedulingPolicy::default()).unwrap();
        let flagged = r
            .schedule
            .iter()
            .map(|i| &i.course)
            .chain(r.conflicts.iter().map(|c| &c.course))
            .filter(|c| c.lecturer.ends_with("(Reassignment Needed)"))
            .count();
        assert_eq!(flagged, 3);
        assert_eq!(r.summary.total_courses, 12);
    }

    #[test]
    fn flagged_courses_keep_their_lecturer_booked() {
        let courses: Vec<Course> = (0..12)
            .map(|i| course(&format!("c{i}"), &format!("CSC{}", 300 + i), "Dr. X", 10))
            .collect();
        let mut req = GenerateRequest::new(courses, vec![venue("a", 100), venue("b", 100)]);
        req.enable_fallbacks = true;
        let mut policy = SchedulingPolicy::default();
        policy.fallback.redistribute_lecturer_load = true;
        req.policy = Some(policy);

        let r = generate(&req, &SchedulingPolicy::default()).unwrap();
        assert!(r.fallbacks_applied.is_some());
        assert!(r
            .schedule
            .iter()
            .any(|i| i.course.lecturer.ends_with(fallback::REASSIGNMENT_TAG)));
        for (n, a) in r.schedule.iter().enumerate() {
            for b in &r.schedule[n + 1..] {
                let same = sched_core::lecturer_identity(&a.course.lecturer)
                    == sched_core::lecturer_identity(&b.course.lecturer);
                assert!(
                    !(same && overlaps(&a.time_slot, &b.time_slot)),
                    "{} and {} share Dr. X at {}",
                    a.course.id,
                    b.course.id,
                    a.time_slot
                );
            }
        }
    }

    #[test]
    fn shared_general_studies_sections_are_capped() {
        let mut a = course("a", "GST101", "Dr. A", 150);
        let mut b = course("b", "GST 101", "Dr. B", 50);
        a.department = "Computer Science".into();
        b.department = "Cyber Security".into();
        let req = GenerateRequest::new(vec![a, b], vec![venue("v", 200)]);
        let r = generate(&req, &SchedulingPolicy::default()).unwrap();
        assert_eq!(r.schedule.len(), 2);
        let sizes: Vec<u32> = r.schedule.iter().map(|i| i.course.class_size).collect();
        assert!(sizes.contains(&100));
        assert!(sizes.contains(&50));
        assert!(r
            .schedule
            .iter()
            .all(|i| i.course.constraints.contains(&"grouped_with:GST101".to_string())));
    }

    #[tokio::test]
    async fn solver_trait_wraps_engine_errors() {
        let solver = GreedySolver::default();
        let err = solver
            .generate(GenerateRequest::new(vec![course("a", "CSC201", "Dr. A", 10)], vec![]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no venues"));
    }

    proptest! {
        #[test]
        fn summary_always_conserves(
            sizes in prop::collection::vec(1u32..500, 0..30),
            fallbacks in any::<bool>(),
        ) {
            let courses: Vec<Course> = sizes
                .iter()
                .enumerate()
                .map(|(i, s)| course(&format!("c{i}"), &format!("CSC{}", 200 + i), "Dr. Z", *s))
                .collect();
            let mut req = GenerateRequest::new(courses, vec![venue("a", 120), venue("b", 300)]);
            req.enable_fallbacks = fallbacks;
            req.allow_invalid = true;
            let r = generate(&req, &SchedulingPolicy::default()).unwrap();
            let s = &r.summary;
            prop_assert_eq!(s.scheduled_courses + s.conflicted_courses, s.total_courses);
            prop_assert_eq!(r.schedule.len() + r.conflicts.len(), s.total_courses);
        }
    }
}
