//! Delegates placement to an external scheduling service. Whatever comes back is treated
//! as untrusted: records are shape-checked, joined to the request and re-checked against
//! capacity and double-booking before anything reaches the caller.

use async_trait::async_trait;
use sched_core::conformance::{enforce_invariants, resolve_assignments, ConformanceError};
use sched_core::{perform_pre_generation_validation, EngineError, Solver};
use serde_json::Value;
use solver_heur::report;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{error, info, warn};
use types::{
    ConflictType, Course, GenerateRequest, GenerationResult, ScheduleConflict, SchedulingPolicy,
    Severity, ValidationResult,
};

pub const UNPLACED_REASON: &str = "Remote scheduler returned no placement for this course";

pub struct RemoteSolver {
    client: reqwest::Client,
    endpoint: String,
    policy: SchedulingPolicy,
}

impl RemoteSolver {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        policy: SchedulingPolicy,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            policy,
        })
    }

    async fn fetch(&self, req: &GenerateRequest) -> Result<Vec<Value>, EngineError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(req)
            .send()
            .await
            .map_err(|e| EngineError::Remote(e.to_string()))?
            .error_for_status()
            .map_err(|e| EngineError::Remote(e.to_string()))?;
        let body: Value = resp
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;
        extract_records(body)
    }
}

#[async_trait]
impl Solver for RemoteSolver {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerationResult> {
        let policy = req.policy.as_ref().unwrap_or(&self.policy);
        let validation = match &req.validation_result {
            Some(v) => v.clone(),
            None => perform_pre_generation_validation(&req.courses, &req.venues, policy),
        };

        if req.courses.is_empty() {
            return Ok(report::build_result(0, Vec::new(), Vec::new(), validation, None));
        }
        if req.venues.is_empty() {
            return Err(EngineError::NoVenues.into());
        }
        if !validation.is_valid && !req.enable_fallbacks && !req.allow_invalid {
            warn!(
                errors = validation.errors.len(),
                "blocking validation errors; remote call skipped"
            );
            return Ok(report::blocked_result(&req.courses, validation));
        }

        info!(endpoint = %self.endpoint, courses = req.courses.len(), "delegating generation");
        match self.fetch(&req).await {
            Ok(raw) => Ok(assemble(&req, &raw, validation)),
            Err(e) => {
                error!(error = %e, "remote generation failed");
                Ok(report::failed_result(&req.courses, &e.to_string(), validation))
            }
        }
    }
}

/// Accepts `{"schedule": [...]}` or a bare array of records.
pub fn extract_records(body: Value) -> Result<Vec<Value>, EngineError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("schedule") {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(EngineError::MalformedResponse(format!(
                "`schedule` is not an array: {other}"
            ))),
            None => Err(EngineError::MalformedResponse("missing `schedule`".into())),
        },
        other => Err(EngineError::MalformedResponse(format!(
            "expected an object or array, got {other}"
        ))),
    }
}

/// Builds the run result from raw remote records. Each unplaced course gets exactly one
/// conflict: the first reason one of its records was rejected, else a generic miss.
pub fn assemble(
    req: &GenerateRequest,
    raw: &[Value],
    validation: ValidationResult,
) -> GenerationResult {
    let resolved = resolve_assignments(raw, &req.courses, &req.venues);
    let checked = enforce_invariants(resolved.accepted);

    let placed: HashSet<&str> = checked
        .accepted
        .iter()
        .map(|i| i.course.id.0.as_str())
        .collect();
    let mut first_reject: HashMap<&str, &ConformanceError> = HashMap::new();
    for (course, e) in resolved.rejected.iter().chain(checked.rejected.iter()) {
        first_reject.entry(course.id.0.as_str()).or_insert(e);
    }

    let conflicts: Vec<ScheduleConflict> = req
        .courses
        .iter()
        .filter(|c| !placed.contains(c.id.0.as_str()))
        .map(|c| match first_reject.get(c.id.0.as_str()) {
            Some(e) => report::rejected_item(c.clone(), e),
            None => unplaced(c),
        })
        .collect();

    info!(placed = checked.accepted.len(), conflicts = conflicts.len(), "remote result assembled");
    report::build_result(req.courses.len(), checked.accepted, conflicts, validation, None)
}

fn unplaced(course: &Course) -> ScheduleConflict {
    ScheduleConflict {
        course: course.clone(),
        reason: UNPLACED_REASON.into(),
        conflict_type: ConflictType::Resource,
        severity: Severity::High,
        suggestion: Some(sched_core::suggestions::suggestion_for(ConflictType::Resource).into()),
    }
}
