use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
            PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(CourseId);
id_newtype!(VenueId);

/// Teaching days. Weekends are never part of the grid.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
pub enum Day {
    #[serde(rename = "Monday", alias = "Mon", alias = "mon")]
    Mon,
    #[serde(rename = "Tuesday", alias = "Tue", alias = "tue")]
    Tue,
    #[serde(rename = "Wednesday", alias = "Wed", alias = "wed")]
    Wed,
    #[serde(rename = "Thursday", alias = "Thu", alias = "thu")]
    Thu,
    #[serde(rename = "Friday", alias = "Fri", alias = "fri")]
    Fri,
}

impl Day {
    pub const ALL: [Day; 5] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri];

    pub fn name(self) -> &'static str {
        match self {
            Day::Mon => "Monday",
            Day::Tue => "Tuesday",
            Day::Wed => "Wednesday",
            Day::Thu => "Thursday",
            Day::Fri => "Friday",
        }
    }

    pub fn parse(s: &str) -> Option<Day> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" => Some(Day::Mon),
            "tue" | "tuesday" => Some(Day::Tue),
            "wed" | "wednesday" => Some(Day::Wed),
            "thu" | "thursday" => Some(Day::Thu),
            "fri" | "friday" => Some(Day::Fri),
            _ => None,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A whole clock hour, written `"H:00"` on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Hour(pub u8);

impl Hour {
    /// Parses `"9:00"` / `"09:00"`. Anything off the hour is rejected.
    pub fn parse(s: &str) -> Option<Hour> {
        let (h, m) = s.trim().split_once(':')?;
        let h: u8 = h.parse().ok()?;
        if m != "00" || h > 23 {
            return None;
        }
        Some(Hour(h))
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00", self.0)
    }
}

impl Serialize for Hour {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hour {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Hour::parse(&raw).ok_or_else(|| {
            de::Error::custom(format!("expected a whole hour like \"9:00\", got {raw:?}"))
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub day: Day,
    #[schema(value_type = String, example = "8:00")]
    #[schemars(with = "String")]
    pub start_time: Hour,
    #[schema(value_type = String, example = "10:00")]
    #[schemars(with = "String")]
    pub end_time: Hour,
}

impl TimeSlot {
    pub fn new(day: Day, start: u8, end: u8) -> Self {
        Self {
            day,
            start_time: Hour(start),
            end_time: Hour(end),
        }
    }

    pub fn start(&self) -> u8 {
        self.start_time.0
    }

    pub fn end(&self) -> u8 {
        self.end_time.0
    }

    pub fn duration(&self) -> u8 {
        self.end().saturating_sub(self.start())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.start_time, self.end_time)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lecturer: String,
    #[serde(default)]
    pub class_size: u32,
    #[serde(default)]
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_slots: Vec<TimeSlot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub capacity: u32,
    /// Empty means the venue is open for the whole grid.
    #[serde(default)]
    pub availability: Vec<TimeSlot>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    #[serde(flatten)]
    pub course: Course,
    pub venue: Venue,
    pub time_slot: TimeSlot,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseGroup {
    pub course_code: String,
    pub departments: Vec<String>,
    pub total_students: u32,
    pub courses: Vec<Course>,
    pub is_shared_course: bool,
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    Lecturer,
    Venue,
    CrossDepartmental,
    Resource,
    SystemError,
}

/// Ordered so that `Critical` is the greatest.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Critical and high problems stop a run that has neither fallbacks nor an override.
    pub fn is_blocking(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConflict {
    pub course: Course,
    pub reason: String,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorType {
    VenueCapacity,
    LecturerOverload,
    MissingData,
    CrossLevelConflict,
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum WarningType {
    LecturerLoad,
    VenueUtilization,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub r#type: ValidationErrorType,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub affected_courses: Vec<CourseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub r#type: WarningType,
    pub message: String,
    #[serde(default)]
    pub affected_courses: Vec<CourseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn blocking_errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().filter(|e| e.severity.is_blocking())
    }

    pub fn has_blocking_errors(&self) -> bool {
        self.blocking_errors().next().is_some()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FallbackOptions {
    pub split_oversized: bool,
    pub add_venue_capacity: bool,
    pub relax_time_preferences: bool,
    /// Off unless asked for: only tags courses for human review.
    pub redistribute_lecturer_load: bool,
    /// Fallback also runs when pre-validation yields more warnings than this.
    pub warning_trigger: usize,
    pub max_extra_venues: usize,
    pub reassignment_threshold: usize,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self {
            split_oversized: true,
            add_venue_capacity: true,
            relax_time_preferences: true,
            redistribute_lecturer_load: false,
            warning_trigger: 3,
            max_extra_venues: 3,
            reassignment_threshold: 8,
        }
    }
}

pub const DEFAULT_SHARED_COURSE_CODES: &[&str] = &[
    "GST101", "GST102", "GST111", "GST112", "GST121", "GST122", "ENG101", "ENG102", "MTH101",
    "MTH102", "PHY101", "PHY102", "CHM101", "CHM102", "BIO101", "STA101", "CSC101", "ENT201",
];

/// Every tunable of a generation run. Missing fields take their defaults.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulingPolicy {
    pub max_consecutive_hours: u8,
    /// `None` lifts the per-day cap entirely.
    pub max_classes_per_day: Option<u8>,
    pub venue_overflow_tolerance: f64,
    pub exam_overflow_tolerance: f64,
    /// Longest accepted exam window, in calendar days, both ends included.
    pub max_exam_window_days: u32,
    pub lecturer_overload_threshold: usize,
    pub lecturer_warning_threshold: usize,
    pub utilization_warning_ratio: f64,
    pub shared_course_codes: Vec<String>,
    pub fallback: FallbackOptions,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_hours: 2,
            max_classes_per_day: Some(4),
            venue_overflow_tolerance: 0.0,
            exam_overflow_tolerance: 0.10,
            max_exam_window_days: 120,
            lecturer_overload_threshold: 10,
            lecturer_warning_threshold: 6,
            utilization_warning_ratio: 0.8,
            shared_course_codes: DEFAULT_SHARED_COURSE_CODES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fallback: FallbackOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Greedy,
    Remote,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub courses: Vec<Course>,
    #[serde(default)]
    pub venues: Vec<Venue>,
    #[serde(default)]
    pub course_groups: Option<Vec<CourseGroup>>,
    #[serde(default)]
    pub validation_result: Option<ValidationResult>,
    #[serde(default)]
    pub enable_fallbacks: bool,
    /// Place courses even when pre-validation reports blocking errors.
    #[serde(default)]
    pub allow_invalid: bool,
    #[serde(default)]
    pub solver: SolverKind,
    #[serde(default)]
    pub policy: Option<SchedulingPolicy>,
}

impl GenerateRequest {
    pub fn new(courses: Vec<Course>, venues: Vec<Venue>) -> Self {
        Self {
            courses,
            venues,
            course_groups: None,
            validation_result: None,
            enable_fallbacks: false,
            allow_invalid: false,
            solver: SolverKind::default(),
            policy: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_courses: usize,
    pub scheduled_courses: usize,
    pub conflicted_courses: usize,
    /// Percentage in `0.0..=100.0`.
    pub success_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub schedule: Vec<ScheduleItem>,
    pub conflicts: Vec<ScheduleConflict>,
    pub summary: ScheduleSummary,
    pub validation_result: ValidationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallbacks_applied: Option<Vec<String>>,
    pub pre_validation_passed: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Partial,
    Failure,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub outcome: RunOutcome,
    pub message: String,
    pub schedule: Vec<ScheduleItem>,
    pub conflicts: Vec<ScheduleConflict>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamCourse {
    pub course_code: String,
    #[serde(default)]
    pub course_title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub college: String,
    #[serde(default)]
    pub level: String,
    pub student_count: u32,
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
pub enum Session {
    Morning,
    Midday,
    Afternoon,
}

impl Session {
    pub const ALL: [Session; 3] = [Session::Morning, Session::Midday, Session::Afternoon];

    pub fn label(self) -> &'static str {
        match self {
            Session::Morning => "08:00-11:00",
            Session::Midday => "12:00-15:00",
            Session::Afternoon => "15:30-18:30",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamScheduleItem {
    #[serde(flatten)]
    pub course: ExamCourse,
    pub date: NaiveDate,
    pub day: Day,
    pub session: Session,
    /// Clock window of the session, e.g. `08:00-11:00`.
    pub time: String,
    pub venue_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamConflict {
    pub course: ExamCourse,
    pub reason: String,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamGenerateRequest {
    pub courses: Vec<ExamCourse>,
    #[serde(default)]
    pub venues: Vec<Venue>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub policy: Option<SchedulingPolicy>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamScheduleResult {
    pub schedule: Vec<ExamScheduleItem>,
    pub conflicts: Vec<ExamConflict>,
    pub summary: ScheduleSummary,
}
