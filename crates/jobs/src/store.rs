//! Process-local `ScheduleStore`. Seeded with courses and venues; saves replace the whole
//! stored schedule.

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use sched_core::ScheduleStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use types::{Course, ExamCourse, ExamScheduleItem, ScheduleItem, Venue};
use utoipa::ToSchema;

#[derive(Clone, Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredSchedule {
    pub items: Vec<ScheduleItem>,
    pub exams: Vec<ExamScheduleItem>,
    pub published: bool,
}

/// Startup input for the store, in the same camelCase shape the HTTP API accepts.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedData {
    pub courses: Vec<Course>,
    pub venues: Vec<Venue>,
    pub exam_courses: Vec<ExamCourse>,
}

#[derive(Default)]
struct Tables {
    courses: Vec<Course>,
    venues: Vec<Venue>,
    exam_courses: Vec<ExamCourse>,
    schedule: StoredSchedule,
}

#[derive(Clone, Default)]
pub struct InMemStore {
    inner: Arc<RwLock<Tables>>,
}

impl InMemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, data: SeedData) {
        info!(
            courses = data.courses.len(),
            venues = data.venues.len(),
            exam_courses = data.exam_courses.len(),
            "store seeded"
        );
        let mut w = self.inner.write();
        w.courses = data.courses;
        w.venues = data.venues;
        w.exam_courses = data.exam_courses;
    }

    /// Seeds from a JSON document. A malformed document leaves the store untouched.
    pub fn seed_from_json(&self, raw: &str) -> anyhow::Result<()> {
        let data: SeedData = serde_json::from_str(raw).context("invalid seed document")?;
        self.seed(data);
        Ok(())
    }

    pub fn snapshot(&self) -> StoredSchedule {
        self.inner.read().schedule.clone()
    }

    /// Flips the stored timetable to published. Returns false when nothing is stored.
    pub fn publish(&self) -> bool {
        let mut w = self.inner.write();
        if w.schedule.items.is_empty() && w.schedule.exams.is_empty() {
            return false;
        }
        w.schedule.published = true;
        true
    }
}

#[async_trait]
impl ScheduleStore for InMemStore {
    async fn fetch_courses(&self) -> anyhow::Result<Vec<Course>> {
        Ok(self.inner.read().courses.clone())
    }

    async fn fetch_venues(&self) -> anyhow::Result<Vec<Venue>> {
        Ok(self.inner.read().venues.clone())
    }

    async fn fetch_exam_courses(&self) -> anyhow::Result<Vec<ExamCourse>> {
        Ok(self.inner.read().exam_courses.clone())
    }

    async fn save_schedule(&self, items: Vec<ScheduleItem>, published: bool) -> anyhow::Result<()> {
        info!(items = items.len(), published, "schedule saved");
        let mut w = self.inner.write();
        w.schedule.items = items;
        w.schedule.published = published;
        Ok(())
    }

    async fn save_exam_schedule(
        &self,
        items: Vec<ExamScheduleItem>,
        published: bool,
    ) -> anyhow::Result<()> {
        info!(items = items.len(), published, "exam schedule saved");
        let mut w = self.inner.write();
        w.schedule.exams = items;
        w.schedule.published = published;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Day, TimeSlot};

    fn item(id: &str) -> ScheduleItem {
        ScheduleItem {
            course: Course {
                id: id.into(),
                code: "CSC201".into(),
                name: "Data Structures".into(),
                lecturer: "Dr. A".into(),
                class_size: 30,
                department: "CS".into(),
                academic_level: None,
                preferred_slots: vec![],
                constraints: vec![],
            },
            venue: Venue {
                id: "v".into(),
                name: "Hall".into(),
                capacity: 50,
                availability: vec![],
            },
            time_slot: TimeSlot::new(Day::Mon, 8, 10),
        }
    }

    #[tokio::test]
    async fn saves_replace_previous_rows() {
        let store = InMemStore::new();
        assert!(!store.publish());
        store.save_schedule(vec![item("a"), item("b")], false).await.unwrap();
        store.save_schedule(vec![item("c")], false).await.unwrap();
        let snap = store.snapshot();
        assert_eq!(snap.items.len(), 1);
        assert_eq!(snap.items[0].course.id.0, "c");
        assert!(!snap.published);
        assert!(store.publish());
        assert!(store.snapshot().published);
    }

    #[tokio::test]
    async fn seeded_inputs_are_returned() {
        let store = InMemStore::new();
        store.seed(SeedData {
            courses: vec![item("a").course],
            venues: vec![item("a").venue],
            exam_courses: vec![],
        });
        assert_eq!(store.fetch_courses().await.unwrap().len(), 1);
        assert_eq!(store.fetch_venues().await.unwrap()[0].capacity, 50);
        assert!(store.fetch_exam_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_document_fills_the_tables() {
        let store = InMemStore::new();
        store
            .seed_from_json(
                r#"{
                  "courses": [{"id": "c1", "code": "CSC201", "lecturer": "Dr. A", "classSize": 40}],
                  "venues": [{"id": "v1", "name": "Hall", "capacity": 120}],
                  "examCourses": [{"courseCode": "CSC201", "studentCount": 40}]
                }"#,
            )
            .unwrap();
        assert_eq!(store.fetch_courses().await.unwrap()[0].class_size, 40);
        assert_eq!(store.fetch_venues().await.unwrap()[0].capacity, 120);
        assert_eq!(store.fetch_exam_courses().await.unwrap()[0].student_count, 40);
    }

    #[tokio::test]
    async fn malformed_seed_keeps_previous_tables() {
        let store = InMemStore::new();
        store
            .seed_from_json(r#"{"venues": [{"id": "v1", "name": "Hall", "capacity": 10}]}"#)
            .unwrap();
        let err = store.seed_from_json(r#"{"venues": 3}"#).unwrap_err();
        assert!(err.to_string().contains("invalid seed document"));
        assert_eq!(store.fetch_venues().await.unwrap().len(), 1);
    }
}
