//! Exam timetabling: first-fit of exams into (date, session, venue) cells. There is no
//! lecturer dimension, only seats.

use chrono::{Datelike, NaiveDate, Weekday};
use sched_core::suggestions::suggestion_for;
use sched_core::venue::{div_ceil, max_capacity, VenueAllocator};
use sched_core::EngineError;
use std::collections::HashSet;
use tracing::{debug, info};
use types::{
    ConflictType, Day, ExamConflict, ExamCourse, ExamScheduleItem, ExamScheduleResult,
    SchedulingPolicy, Session, Severity, Venue, VenueId,
};

use crate::report::summarize;

fn teaching_day(weekday: Weekday) -> Option<Day> {
    match weekday {
        Weekday::Mon => Some(Day::Mon),
        Weekday::Tue => Some(Day::Tue),
        Weekday::Wed => Some(Day::Wed),
        Weekday::Thu => Some(Day::Thu),
        Weekday::Fri => Some(Day::Fri),
        Weekday::Sat | Weekday::Sun => None,
    }
}

/// Weekdays in `start..=end`, walked lazily.
pub fn exam_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = (NaiveDate, Day)> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter_map(|d| teaching_day(d.weekday()).map(|day| (d, day)))
}

pub fn generate_exam_schedule(
    courses: &[ExamCourse],
    venues: &[Venue],
    start: NaiveDate,
    end: NaiveDate,
    policy: &SchedulingPolicy,
) -> Result<ExamScheduleResult, EngineError> {
    if end < start {
        return Err(EngineError::InvalidRequest(format!(
            "exam window ends ({end}) before it starts ({start})"
        )));
    }
    let span = end.signed_duration_since(start).num_days() + 1;
    if span > i64::from(policy.max_exam_window_days) {
        return Err(EngineError::InvalidRequest(format!(
            "exam window of {span} days exceeds the limit of {} days",
            policy.max_exam_window_days
        )));
    }
    if courses.is_empty() {
        return Ok(ExamScheduleResult {
            schedule: Vec::new(),
            conflicts: Vec::new(),
            summary: summarize(0, 0),
        });
    }
    if venues.is_empty() {
        return Err(EngineError::NoVenues);
    }

    let alloc = VenueAllocator::new(policy.exam_overflow_tolerance);
    let mut taken: HashSet<(NaiveDate, Session, VenueId)> = HashSet::new();
    let mut schedule = Vec::new();
    let mut conflicts = Vec::new();

    let mut order: Vec<&ExamCourse> = courses.iter().collect();
    order.sort_by_key(|c| std::cmp::Reverse(c.student_count));

    info!(
        exams = order.len(),
        window_days = span,
        venues = venues.len(),
        "exam generation started"
    );

    for exam in order {
        if alloc.exceeds_all(exam.student_count, venues) {
            let cap = max_capacity(venues);
            let groups = div_ceil(exam.student_count, cap);
            conflicts.push(ExamConflict {
                course: exam.clone(),
                reason: format!(
                    "{} candidates exceed the largest venue capacity {}",
                    exam.student_count, cap
                ),
                conflict_type: ConflictType::Venue,
                severity: Severity::Critical,
                suggestion: Some(format!(
                    "Split into {} sittings of {}",
                    groups,
                    div_ceil(exam.student_count, groups.max(1))
                )),
            });
            continue;
        }

        let ranked = alloc.ranked(exam.student_count, venues);
        let cell = exam_days(start, end).find_map(|(date, day)| {
            Session::ALL.iter().find_map(|&session| {
                ranked
                    .iter()
                    .find(|v| !taken.contains(&(date, session, v.id.clone())))
                    .map(|v| (date, day, session, *v))
            })
        });

        match cell {
            Some((date, day, session, venue)) => {
                debug!(exam = %exam.course_code, %date, ?session, venue = %venue.id, "exam placed");
                taken.insert((date, session, venue.id.clone()));
                schedule.push(ExamScheduleItem {
                    course: exam.clone(),
                    date,
                    day,
                    session,
                    time: session.label().to_string(),
                    venue_name: venue.name.clone(),
                });
            }
            None => conflicts.push(ExamConflict {
                course: exam.clone(),
                reason: "No free venue session left in the exam window".into(),
                conflict_type: ConflictType::Resource,
                severity: Severity::High,
                suggestion: Some(suggestion_for(ConflictType::Resource).into()),
            }),
        }
    }

    let summary = summarize(courses.len(), schedule.len());
    Ok(ExamScheduleResult {
        schedule,
        conflicts,
        summary,
    })
}
