//! Discrete week grid: teaching days x whole-hour slots between 8:00 and 17:00.

use types::{Course, Day, TimeSlot};

pub const DAY_START: u8 = 8;
pub const DAY_END: u8 = 17;
pub const STANDARD_DURATION: u8 = 2;
pub const SHORT_DURATION: u8 = 1;

/// Every slot of `duration` hours on `day`, earliest first.
///
/// Two-hour blocks start at 8..=15, one-hour blocks at 8..=16.
pub fn slots_for_day(day: Day, duration: u8) -> Vec<TimeSlot> {
    if duration == 0 || duration > DAY_END - DAY_START {
        return Vec::new();
    }
    (DAY_START..=DAY_END - duration)
        .map(|start| TimeSlot::new(day, start, start + duration))
        .collect()
}

/// Half-open overlap on the same day. Touching endpoints do not conflict.
pub fn overlaps(a: &TimeSlot, b: &TimeSlot) -> bool {
    a.day == b.day && a.start() < b.end() && b.start() < a.end()
}

pub fn is_business_hours(slot: &TimeSlot) -> bool {
    let (s, e) = (slot.start(), slot.end());
    s >= DAY_START && e <= DAY_END && e > s && (1..=2).contains(&(e - s))
}

/// `inner` lies entirely within `outer`.
pub fn contains(outer: &TimeSlot, inner: &TimeSlot) -> bool {
    outer.day == inner.day && outer.start() <= inner.start() && inner.end() <= outer.end()
}

/// General-studies courses and courses tagged `short` take one hour; everything else two.
pub fn course_duration(course: &Course) -> u8 {
    if let Some(first) = course.preferred_slots.first() {
        let d = first.duration();
        if d == SHORT_DURATION || d == STANDARD_DURATION {
            return d;
        }
    }
    let general_studies = crate::grouping::normalize_code(&course.code)
        .map(|c| c.starts_with("GST"))
        .unwrap_or(false);
    let short = course
        .constraints
        .iter()
        .any(|c| c.eq_ignore_ascii_case("short"));
    if general_studies || short {
        SHORT_DURATION
    } else {
        STANDARD_DURATION
    }
}

/// Applies a course's own time wishes: exact preferred slots when given, then any
/// `time:morning` / `time:afternoon` constraint.
pub fn admits(course: &Course, slot: &TimeSlot) -> bool {
    if !course.preferred_slots.is_empty() && !course.preferred_slots.contains(slot) {
        return false;
    }
    for c in &course.constraints {
        match c.trim().to_ascii_lowercase().as_str() {
            "time:morning" if slot.start() >= 12 => return false,
            "time:afternoon" if slot.start() < 12 => return false,
            _ => {}
        }
    }
    true
}

/// Length in hours of the contiguous run that contains `slot` once it is added to `busy`.
pub fn contiguous_hours_with(busy: &[TimeSlot], slot: &TimeSlot) -> u8 {
    let mut start = slot.start();
    let mut end = slot.end();
    loop {
        let mut grew = false;
        for b in busy.iter().filter(|b| b.day == slot.day) {
            // touching or overlapping intervals join the run
            if b.start() <= end && start <= b.end() && (b.start() < start || b.end() > end) {
                start = start.min(b.start());
                end = end.max(b.end());
                grew = true;
            }
        }
        if !grew {
            return end - start;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str) -> Course {
        Course {
            id: "c".into(),
            code: code.into(),
            name: "n".into(),
            lecturer: "l".into(),
            class_size: 10,
            department: "d".into(),
            academic_level: None,
            preferred_slots: vec![],
            constraints: vec![],
        }
    }

    #[test]
    fn grid_sizes_follow_duration() {
        let two = slots_for_day(Day::Mon, 2);
        assert_eq!(two.first().map(|s| s.start()), Some(8));
        assert_eq!(two.last().map(|s| s.start()), Some(15));
        let one = slots_for_day(Day::Mon, 1);
        assert_eq!(one.len(), 9);
        assert_eq!(one.last().map(|s| s.end()), Some(17));
        assert_eq!(two.len(), 8);
        assert!(slots_for_day(Day::Mon, 0).is_empty());
    }

    #[test]
    fn touching_slots_do_not_overlap() {
        let a = TimeSlot::new(Day::Mon, 8, 10);
        let b = TimeSlot::new(Day::Mon, 10, 12);
        let c = TimeSlot::new(Day::Mon, 9, 11);
        let d = TimeSlot::new(Day::Tue, 8, 10);
        assert!(!overlaps(&a, &b));
        assert!(overlaps(&a, &c));
        assert!(overlaps(&c, &b));
        assert!(!overlaps(&a, &d));
    }

    #[test]
    fn business_hours_bounds() {
        assert!(is_business_hours(&TimeSlot::new(Day::Fri, 15, 17)));
        assert!(is_business_hours(&TimeSlot::new(Day::Fri, 8, 9)));
        assert!(!is_business_hours(&TimeSlot::new(Day::Fri, 7, 9)));
        assert!(!is_business_hours(&TimeSlot::new(Day::Fri, 16, 18)));
        assert!(!is_business_hours(&TimeSlot::new(Day::Fri, 8, 11)));
        assert!(!is_business_hours(&TimeSlot::new(Day::Fri, 10, 10)));
    }

    #[test]
    fn duration_depends_on_code_and_tags() {
        assert_eq!(course_duration(&course("CSC201")), 2);
        assert_eq!(course_duration(&course("GST 101")), 1);
        let mut short = course("MTH201");
        short.constraints.push("short".into());
        assert_eq!(course_duration(&short), 1);
    }

    #[test]
    fn time_constraints_narrow_the_grid() {
        let mut c = course("CSC201");
        c.constraints.push("time:morning".into());
        assert!(admits(&c, &TimeSlot::new(Day::Mon, 10, 12)));
        assert!(!admits(&c, &TimeSlot::new(Day::Mon, 12, 14)));

        let mut p = course("CSC201");
        p.preferred_slots.push(TimeSlot::new(Day::Wed, 14, 16));
        assert!(admits(&p, &TimeSlot::new(Day::Wed, 14, 16)));
        assert!(!admits(&p, &TimeSlot::new(Day::Wed, 8, 10)));
    }

    #[test]
    fn contiguous_run_joins_touching_blocks() {
        let busy = vec![TimeSlot::new(Day::Mon, 8, 10), TimeSlot::new(Day::Mon, 12, 14)];
        assert_eq!(contiguous_hours_with(&busy, &TimeSlot::new(Day::Mon, 10, 12)), 6);
        assert_eq!(contiguous_hours_with(&busy, &TimeSlot::new(Day::Mon, 15, 17)), 2);
        assert_eq!(contiguous_hours_with(&busy, &TimeSlot::new(Day::Tue, 10, 12)), 2);
    }
}
