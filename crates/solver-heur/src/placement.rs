//! Greedy placement. Courses are placed one at a time in priority order and a placed
//! course is never moved again, so an early choice can block a later course that a
//! backtracking search would have fitted.

use sched_core::grid::{
    admits, contains, contiguous_hours_with, course_duration, overlaps, slots_for_day,
};
use sched_core::grouping::is_foundational;
use sched_core::lecturer_identity;
use sched_core::suggestions::suggestion_for;
use sched_core::venue::{max_capacity, suggest_split, VenueAllocator};
use std::collections::HashMap;
use tracing::debug;
use types::{
    ConflictType, Course, Day, ScheduleConflict, ScheduleItem, SchedulingPolicy, Severity,
    TimeSlot, Venue, VenueId,
};

pub const LECTURER_BLOCKED: &str =
    "No suitable time slot available due to lecturer scheduling constraints.";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementOutcome {
    pub schedule: Vec<ScheduleItem>,
    pub conflicts: Vec<ScheduleConflict>,
}

/// Booked intervals per lecturer and per venue, by day.
#[derive(Default, Clone)]
struct Occupancy {
    lecturer: HashMap<(String, Day), Vec<TimeSlot>>,
    venue: HashMap<(VenueId, Day), Vec<TimeSlot>>,
}

impl Occupancy {
    fn lecturer_day(&self, lecturer: &str, day: Day) -> &[TimeSlot] {
        self.lecturer
            .get(&(lecturer.to_string(), day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn venue_free(&self, venue: &Venue, slot: &TimeSlot) -> bool {
        if !venue.availability.is_empty() && !venue.availability.iter().any(|w| contains(w, slot)) {
            return false;
        }
        self.venue
            .get(&(venue.id.clone(), slot.day))
            .map_or(true, |booked| !booked.iter().any(|b| overlaps(b, slot)))
    }

    fn book(&mut self, lecturer: &str, venue: &VenueId, slot: TimeSlot) {
        if !lecturer.is_empty() {
            self.lecturer
                .entry((lecturer.to_string(), slot.day))
                .or_default()
                .push(slot);
        }
        self.venue
            .entry((venue.clone(), slot.day))
            .or_default()
            .push(slot);
    }
}

enum Miss {
    /// The lecturer had room but every fitting venue was taken.
    VenuesBusy,
    LecturerBlocked,
}

fn lecturer_key(course: &Course) -> &str {
    lecturer_identity(&course.lecturer)
}

/// Foundational courses first, then larger classes. Ties keep input order.
pub fn priority_order(courses: &[Course]) -> Vec<&Course> {
    let mut order: Vec<&Course> = courses.iter().collect();
    order.sort_by_key(|c| (!is_foundational(&c.code), std::cmp::Reverse(c.class_size)));
    order
}

/// Days to try for `lecturer`, lightest day first.
fn days_by_load(occ: &Occupancy, lecturer: &str) -> Vec<Day> {
    let mut days = Day::ALL.to_vec();
    days.sort_by_key(|&d| occ.lecturer_day(lecturer, d).len());
    days
}

fn find_next_best_time_slot<'v>(
    course: &Course,
    venues: &'v [Venue],
    occ: &Occupancy,
    alloc: &mut VenueAllocator,
    policy: &SchedulingPolicy,
    relaxed: bool,
) -> Result<(TimeSlot, &'v Venue), Miss> {
    let lecturer = lecturer_key(course);
    let duration = course_duration(course);
    let run_cap = policy.max_consecutive_hours.max(duration);
    let mut lecturer_had_room = false;

    for day in days_by_load(occ, lecturer) {
        let busy = occ.lecturer_day(lecturer, day);
        if !relaxed {
            if let Some(cap) = policy.max_classes_per_day {
                if busy.len() >= usize::from(cap) {
                    continue;
                }
            }
        }
        for slot in slots_for_day(day, duration) {
            if !admits(course, &slot) {
                continue;
            }
            if busy.iter().any(|b| overlaps(b, &slot)) {
                continue;
            }
            if contiguous_hours_with(busy, &slot) > run_cap {
                continue;
            }
            lecturer_had_room = true;
            let free = |v: &Venue| occ.venue_free(v, &slot);
            if let Some(v) = alloc.pick_where(course.class_size, venues, free) {
                return Ok((slot, v));
            }
        }
    }

    if lecturer_had_room {
        Err(Miss::VenuesBusy)
    } else {
        Err(Miss::LecturerBlocked)
    }
}

fn conflict(
    course: &Course,
    kind: ConflictType,
    severity: Severity,
    reason: String,
) -> ScheduleConflict {
    // shared sections that fail surface as cross-departmental problems
    let kind = if kind != ConflictType::Venue
        && course.constraints.iter().any(|c| c.starts_with("grouped_with:"))
    {
        ConflictType::CrossDepartmental
    } else {
        kind
    };
    ScheduleConflict {
        course: course.clone(),
        reason,
        conflict_type: kind,
        severity,
        suggestion: Some(suggestion_for(kind).to_string()),
    }
}

fn capacity_conflict(course: &Course, venues: &[Venue]) -> ScheduleConflict {
    let mut c = conflict(
        course,
        ConflictType::Venue,
        Severity::Critical,
        format!(
            "Class size {} exceeds the largest venue capacity {}",
            course.class_size,
            max_capacity(venues)
        ),
    );
    if let Some(split) = suggest_split(course, venues) {
        c.suggestion = Some(split.describe());
    }
    c
}

/// Places every course it can and reports the rest. Oversized courses are never searched.
pub fn place_courses(
    courses: &[Course],
    venues: &[Venue],
    policy: &SchedulingPolicy,
) -> PlacementOutcome {
    let mut alloc = VenueAllocator::new(policy.venue_overflow_tolerance);
    let mut occ = Occupancy::default();
    let mut out = PlacementOutcome::default();

    for course in priority_order(courses) {
        if alloc.exceeds_all(course.class_size, venues) {
            debug!(course = %course.id, size = course.class_size, "no venue can hold course");
            out.conflicts.push(capacity_conflict(course, venues));
            continue;
        }

        // a week that is full under the daily cap is searched again without it
        let found = find_next_best_time_slot(course, venues, &occ, &mut alloc, policy, false)
            .or_else(|_| find_next_best_time_slot(course, venues, &occ, &mut alloc, policy, true));

        match found {
            Ok((slot, venue)) => {
                debug!(course = %course.id, %slot, venue = %venue.id, "placed");
                occ.book(lecturer_key(course), &venue.id, slot);
                out.schedule.push(ScheduleItem {
                    course: course.clone(),
                    venue: venue.clone(),
                    time_slot: slot,
                });
            }
            Err(Miss::LecturerBlocked) => {
                debug!(course = %course.id, "lecturer has no usable slot");
                out.conflicts.push(conflict(
                    course,
                    ConflictType::Lecturer,
                    Severity::High,
                    LECTURER_BLOCKED.to_string(),
                ));
            }
            Err(Miss::VenuesBusy) => {
                debug!(course = %course.id, "venues exhausted");
                out.conflicts.push(conflict(
                    course,
                    ConflictType::Resource,
                    Severity::High,
                    format!(
                        "Every venue seating {} students is occupied \
                         whenever the lecturer is free.",
                        course.class_size
                    ),
                ));
            }
        }
    }
    out
}
