use serde::Serialize;
use types::{Course, Venue, VenueId};

/// Run-scoped venue picker. Holds the round-robin cursor so that equally suitable rooms
/// take turns instead of the first one filling up.
#[derive(Clone, Debug, Default)]
pub struct VenueAllocator {
    overflow_tolerance: f64,
    cursor: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSuggestion {
    pub groups: u32,
    pub suggested_size: u32,
    pub venue: Venue,
}

impl SplitSuggestion {
    pub fn describe(&self) -> String {
        format!(
            "Split into {} sections of {}",
            self.groups, self.suggested_size
        )
    }
}

pub fn max_capacity(venues: &[Venue]) -> u32 {
    venues.iter().map(|v| v.capacity).max().unwrap_or(0)
}

pub fn div_ceil(a: u32, b: u32) -> u32 {
    if b == 0 {
        return 0;
    }
    a / b + u32::from(a % b != 0)
}

impl VenueAllocator {
    pub fn new(overflow_tolerance: f64) -> Self {
        Self {
            overflow_tolerance: overflow_tolerance.max(0.0),
            cursor: 0,
        }
    }

    /// Largest head-count a venue may take, tolerance included.
    pub fn effective_capacity(&self, venue: &Venue) -> u32 {
        (f64::from(venue.capacity) * (1.0 + self.overflow_tolerance)).floor() as u32
    }

    pub fn fits(&self, required: u32, venue: &Venue) -> bool {
        venue.capacity >= required || self.effective_capacity(venue) >= required
    }

    /// True when no venue can hold `required`, even with the tolerance.
    pub fn exceeds_all(&self, required: u32, venues: &[Venue]) -> bool {
        !venues.iter().any(|v| self.fits(required, v))
    }

    /// Venues able to take `required`, best first: exact fits smallest-first, then
    /// tolerance-only fits largest-first. Equal capacities are rotated by the cursor.
    pub fn ranked<'v>(&self, required: u32, venues: &'v [Venue]) -> Vec<&'v Venue> {
        let mut exact: Vec<&Venue> = venues.iter().filter(|v| v.capacity >= required).collect();
        exact.sort_by_key(|v| v.capacity);
        let mut overflow: Vec<&Venue> = venues
            .iter()
            .filter(|v| v.capacity < required && self.effective_capacity(v) >= required)
            .collect();
        overflow.sort_by_key(|v| std::cmp::Reverse(v.capacity));

        let mut out = Vec::with_capacity(exact.len() + overflow.len());
        for tier in [exact, overflow] {
            for chunk in tier.chunk_by(|a, b| a.capacity == b.capacity) {
                let shift = self.cursor % chunk.len();
                out.extend(chunk[shift..].iter().chain(chunk[..shift].iter()));
            }
        }
        out
    }

    /// Smallest suitable venue not listed in `used_so_far`.
    pub fn pick_venue<'v>(
        &mut self,
        required: u32,
        venues: &'v [Venue],
        used_so_far: &[VenueId],
    ) -> Option<&'v Venue> {
        self.pick_where(required, venues, |v| !used_so_far.contains(&v.id))
    }

    /// Smallest suitable venue accepted by `free`. Advances the rotation on success.
    pub fn pick_where<'v>(
        &mut self,
        required: u32,
        venues: &'v [Venue],
        mut free: impl FnMut(&Venue) -> bool,
    ) -> Option<&'v Venue> {
        let picked = self.ranked(required, venues).into_iter().find(|v| free(v))?;
        self.cursor = self.cursor.wrapping_add(1);
        Some(picked)
    }
}

/// Advisory split when a course outgrows the largest venue.
pub fn suggest_split(course: &Course, venues: &[Venue]) -> Option<SplitSuggestion> {
    let largest = venues.iter().max_by_key(|v| v.capacity)?;
    if largest.capacity == 0 || course.class_size <= largest.capacity {
        return None;
    }
    let groups = div_ceil(course.class_size, largest.capacity);
    Some(SplitSuggestion {
        groups,
        suggested_size: div_ceil(course.class_size, groups),
        venue: largest.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(id: &str, capacity: u32) -> Venue {
        Venue {
            id: id.into(),
            name: id.to_uppercase(),
            capacity,
            availability: vec![],
        }
    }

    fn course(size: u32) -> Course {
        Course {
            id: "c1".into(),
            code: "CS101".into(),
            name: "Intro".into(),
            lecturer: "Dr. X".into(),
            class_size: size,
            department: "CS".into(),
            academic_level: None,
            preferred_slots: vec![],
            constraints: vec![],
        }
    }

    #[test]
    fn prefers_smallest_sufficient_venue() {
        let venues = vec![venue("big", 300), venue("small", 40), venue("mid", 120)];
        let mut alloc = VenueAllocator::new(0.0);
        let v = alloc.pick_venue(100, &venues, &[]).unwrap();
        assert_eq!(v.id.0, "mid");
        let v = alloc.pick_venue(100, &venues, &["mid".into()]).unwrap();
        assert_eq!(v.id.0, "big");
        assert!(alloc.pick_venue(301, &venues, &[]).is_none());
    }

    #[test]
    fn equal_venues_take_turns() {
        let venues = vec![venue("a", 50), venue("b", 50), venue("c", 50)];
        let mut alloc = VenueAllocator::new(0.0);
        let picks: Vec<String> = (0..3)
            .map(|_| alloc.pick_venue(20, &venues, &[]).unwrap().id.0.clone())
            .collect();
        assert_eq!(picks, vec!["a", "b", "c"]);
    }

    #[test]
    fn tolerance_admits_slight_overflow() {
        let venues = vec![venue("hall", 100)];
        let strict = VenueAllocator::new(0.0);
        let loose = VenueAllocator::new(0.10);
        assert!(strict.exceeds_all(105, &venues));
        assert!(!loose.exceeds_all(105, &venues));
        assert!(loose.exceeds_all(111, &venues));
    }

    #[test]
    fn split_suggestion_for_oversized_course() {
        let venues = vec![venue("a", 300), venue("b", 100)];
        let s = suggest_split(&course(500), &venues).unwrap();
        assert_eq!(s.groups, 2);
        assert_eq!(s.suggested_size, 250);
        assert_eq!(s.venue.id.0, "a");
        assert_eq!(s.describe(), "Split into 2 sections of 250");
        assert!(suggest_split(&course(300), &venues).is_none());
        assert!(suggest_split(&course(300), &[]).is_none());
    }
}
