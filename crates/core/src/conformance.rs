//! Strict shape checks for schedule records crossing a trust boundary. Records that fail
//! are rejected with a reason; nothing is coerced into a default.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::warn;
use types::{Course, Day, Hour, ScheduleItem, TimeSlot, Venue};

use crate::grid::{is_business_hours, overlaps};
use crate::lecturer_identity;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConformanceError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has invalid value {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("slot {0} is outside 8:00-17:00 or not 1-2 hours long")]
    OutsideBusinessHours(TimeSlot),
    #[error("unknown course `{0}`")]
    UnknownCourse(String),
    #[error("unknown venue `{0}`")]
    UnknownVenue(String),
    #[error("course `{0}` appears more than once")]
    DuplicateCourse(String),
    #[error("course `{course}` needs {size} seats but venue `{venue}` holds {capacity}")]
    OverCapacity {
        course: String,
        venue: String,
        size: u32,
        capacity: u32,
    },
    #[error("course `{0}` double-books a lecturer or venue")]
    Collision(String),
}

/// One placement as returned by an untrusted producer, before it is joined to the
/// request's own course and venue records.
#[derive(Clone, Debug, PartialEq)]
pub struct RawAssignment {
    pub course_id: String,
    pub venue_id: String,
    pub slot: TimeSlot,
}

fn str_field<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, ConformanceError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(ConformanceError::MissingField(key)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(other) => Err(ConformanceError::InvalidValue {
            field: key,
            value: other.to_string(),
        }),
    }
}

fn hour_field(
    obj: &serde_json::Map<String, Value>,
    key: &'static str,
) -> Result<Hour, ConformanceError> {
    let raw = str_field(obj, key)?;
    Hour::parse(raw).ok_or_else(|| ConformanceError::InvalidValue {
        field: key,
        value: raw.to_string(),
    })
}

/// Structural check of one record: required fields, day enum, `H:00` times, business hours.
pub fn parse_assignment(raw: &Value) -> Result<RawAssignment, ConformanceError> {
    let obj = raw.as_object().ok_or(ConformanceError::NotAnObject)?;
    let course_id = str_field(obj, "courseId")?;
    let venue_id = str_field(obj, "venueId")?;
    let day_raw = str_field(obj, "day")?;
    let day = Day::parse(day_raw).ok_or_else(|| ConformanceError::InvalidValue {
        field: "day",
        value: day_raw.to_string(),
    })?;
    let slot = TimeSlot {
        day,
        start_time: hour_field(obj, "startTime")?,
        end_time: hour_field(obj, "endTime")?,
    };
    if !is_business_hours(&slot) {
        return Err(ConformanceError::OutsideBusinessHours(slot));
    }
    Ok(RawAssignment {
        course_id: course_id.to_string(),
        venue_id: venue_id.to_string(),
        slot,
    })
}

pub fn check_item(item: &ScheduleItem) -> Result<(), ConformanceError> {
    if is_business_hours(&item.time_slot) {
        Ok(())
    } else {
        Err(ConformanceError::OutsideBusinessHours(item.time_slot))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Conformed {
    pub accepted: Vec<ScheduleItem>,
    pub rejected: Vec<(Course, ConformanceError)>,
}

/// Keeps items that satisfy the output shape, belong to a submitted course and do not
/// repeat a course already accepted. Every reject is logged.
pub fn filter_schedule(items: Vec<ScheduleItem>, courses: &[Course]) -> Conformed {
    let known: HashSet<&str> = courses.iter().map(|c| c.id.0.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Conformed::default();
    for item in items {
        let verdict = if !known.contains(item.course.id.0.as_str()) {
            Err(ConformanceError::UnknownCourse(item.course.id.0.clone()))
        } else if seen.contains(&item.course.id.0) {
            Err(ConformanceError::DuplicateCourse(item.course.id.0.clone()))
        } else {
            check_item(&item)
        };
        match verdict {
            Ok(()) => {
                seen.insert(item.course.id.0.clone());
                out.accepted.push(item);
            }
            Err(e) => {
                warn!(
                    course = %item.course.id,
                    error = %e,
                    "rejected non-conformant schedule item"
                );
                out.rejected.push((item.course, e));
            }
        }
    }
    out
}

/// Drops items that overfill their venue or overlap an earlier accepted item sharing its
/// lecturer or venue. Earlier items win.
pub fn enforce_invariants(items: Vec<ScheduleItem>) -> Conformed {
    let mut out = Conformed::default();
    for item in items {
        let verdict = if item.course.class_size > item.venue.capacity {
            Err(ConformanceError::OverCapacity {
                course: item.course.id.0.clone(),
                venue: item.venue.id.0.clone(),
                size: item.course.class_size,
                capacity: item.venue.capacity,
            })
        } else if out.accepted.iter().any(|a| collides(a, &item)) {
            Err(ConformanceError::Collision(item.course.id.0.clone()))
        } else {
            Ok(())
        };
        match verdict {
            Ok(()) => out.accepted.push(item),
            Err(e) => {
                warn!(course = %item.course.id, error = %e, "rejected schedule item");
                out.rejected.push((item.course, e));
            }
        }
    }
    out
}

fn collides(a: &ScheduleItem, b: &ScheduleItem) -> bool {
    let lecturer = lecturer_identity(&a.course.lecturer);
    let shared = a.venue.id == b.venue.id
        || (!lecturer.is_empty() && lecturer == lecturer_identity(&b.course.lecturer));
    shared && overlaps(&a.time_slot, &b.time_slot)
}

/// Joins raw records to the request's courses and venues, then filters them.
pub fn resolve_assignments(raw: &[Value], courses: &[Course], venues: &[Venue]) -> Conformed {
    let by_course: HashMap<&str, &Course> = courses.iter().map(|c| (c.id.0.as_str(), c)).collect();
    let by_venue: HashMap<&str, &Venue> = venues.iter().map(|v| (v.id.0.as_str(), v)).collect();

    let mut items = Vec::new();
    let mut rejected = Vec::new();
    for r in raw {
        let parsed = match parse_assignment(r) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, record = %r, "rejected malformed schedule record");
                // attribute the reject to its course when the id survived
                let course = r
                    .get("courseId")
                    .and_then(Value::as_str)
                    .and_then(|id| by_course.get(id));
                if let Some(c) = course {
                    rejected.push(((*c).clone(), e));
                }
                continue;
            }
        };
        let Some(course) = by_course.get(parsed.course_id.as_str()) else {
            warn!(course = %parsed.course_id, "rejected record for unknown course");
            continue;
        };
        let Some(venue) = by_venue.get(parsed.venue_id.as_str()) else {
            let e = ConformanceError::UnknownVenue(parsed.venue_id.clone());
            warn!(course = %parsed.course_id, error = %e, "rejected record");
            rejected.push(((*course).clone(), e));
            continue;
        };
        items.push(ScheduleItem {
            course: (*course).clone(),
            venue: (*venue).clone(),
            time_slot: parsed.slot,
        });
    }

    let mut conformed = filter_schedule(items, courses);
    conformed.rejected.extend(rejected);
    conformed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn course(id: &str) -> Course {
        Course {
            id: id.into(),
            code: "CSC201".into(),
            name: "Data Structures".into(),
            lecturer: "Dr. A".into(),
            class_size: 30,
            department: "CS".into(),
            academic_level: None,
            preferred_slots: vec![],
            constraints: vec![],
        }
    }

    fn venue(id: &str) -> Venue {
        Venue {
            id: id.into(),
            name: "Hall".into(),
            capacity: 50,
            availability: vec![],
        }
    }

    #[test]
    fn well_formed_record_is_accepted() {
        let r = parse_assignment(&json!({
            "courseId": "c1", "venueId": "v1", "day": "Monday",
            "startTime": "9:00", "endTime": "11:00"
        }))
        .unwrap();
        assert_eq!(r.slot, TimeSlot::new(Day::Mon, 9, 11));
    }

    #[test]
    fn bad_records_are_rejected_not_coerced() {
        let missing = parse_assignment(&json!({"courseId": "c1", "day": "Monday"}));
        assert_eq!(missing, Err(ConformanceError::MissingField("venueId")));

        let saturday = parse_assignment(&json!({
            "courseId": "c1", "venueId": "v1", "day": "Saturday",
            "startTime": "9:00", "endTime": "11:00"
        }));
        assert!(matches!(saturday, Err(ConformanceError::InvalidValue { field: "day", .. })));

        let late = parse_assignment(&json!({
            "courseId": "c1", "venueId": "v1", "day": "Friday",
            "startTime": "16:00", "endTime": "18:00"
        }));
        assert!(matches!(late, Err(ConformanceError::OutsideBusinessHours(_))));

        let numeric = parse_assignment(&json!({
            "courseId": "c1", "venueId": "v1", "day": "Friday",
            "startTime": 9, "endTime": "11:00"
        }));
        assert!(matches!(numeric, Err(ConformanceError::InvalidValue { field: "startTime", .. })));

        assert_eq!(parse_assignment(&json!([1, 2])), Err(ConformanceError::NotAnObject));
    }

    #[test]
    fn invariants_reject_overfull_and_colliding_items() {
        let v = venue("v1");
        let mk = |id: &str, size: u32, day: Day| ScheduleItem {
            course: Course {
                class_size: size,
                ..course(id)
            },
            venue: v.clone(),
            time_slot: TimeSlot::new(day, 8, 10),
        };
        let out = enforce_invariants(vec![
            mk("a", 30, Day::Mon),
            mk("b", 30, Day::Mon),
            mk("c", 80, Day::Tue),
            mk("d", 30, Day::Tue),
        ]);
        let kept: Vec<&str> = out.accepted.iter().map(|i| i.course.id.0.as_str()).collect();
        assert_eq!(kept, vec!["a", "d"]);
        assert!(matches!(out.rejected[0].1, ConformanceError::Collision(_)));
        assert!(matches!(out.rejected[1].1, ConformanceError::OverCapacity { .. }));
    }

    #[test]
    fn flagged_course_still_collides_with_its_lecturer() {
        let at = |id: &str, lecturer: &str, venue_id: &str| ScheduleItem {
            course: Course {
                lecturer: lecturer.into(),
                ..course(id)
            },
            venue: venue(venue_id),
            time_slot: TimeSlot::new(Day::Mon, 8, 10),
        };
        let out = enforce_invariants(vec![
            at("a", "Dr. A", "v1"),
            at("b", "Dr. A (Reassignment Needed)", "v2"),
            at("c", "Dr. B", "v3"),
        ]);
        let kept: Vec<&str> = out.accepted.iter().map(|i| i.course.id.0.as_str()).collect();
        assert_eq!(kept, vec!["a", "c"]);
        assert!(matches!(out.rejected[0].1, ConformanceError::Collision(_)));
    }

    #[test]
    fn resolve_joins_and_filters() {
        let courses = vec![course("c1"), course("c2")];
        let venues = vec![venue("v1")];
        let rec = |course: &str, venue: &str, day: &str| {
            json!({
                "courseId": course,
                "venueId": venue,
                "day": day,
                "startTime": "8:00",
                "endTime": "10:00"
            })
        };
        let raw = vec![
            rec("c1", "v1", "Tue"),
            rec("c1", "v1", "Wed"),
            rec("c2", "nope", "Tue"),
            rec("ghost", "v1", "Tue"),
        ];
        let out = resolve_assignments(&raw, &courses, &venues);
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.accepted[0].time_slot.day, Day::Tue);
        assert_eq!(out.rejected.len(), 2);
        assert!(out
            .rejected
            .iter()
            .any(|(_, e)| matches!(e, ConformanceError::DuplicateCourse(_))));
        assert!(out
            .rejected
            .iter()
            .any(|(_, e)| matches!(e, ConformanceError::UnknownVenue(_))));
    }
}
