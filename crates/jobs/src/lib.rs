mod store;

pub use store::{InMemStore, SeedData, StoredSchedule};

use parking_lot::RwLock;
use sched_core::Solver;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use types::{GenerateRequest, GenerationResult};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done { result: GenerationResult },
    Failed { message: String },
}

#[derive(Clone)]
pub struct InMemJobs<S: Solver> {
    inner: Arc<RwLock<HashMap<String, JobStatus>>>,
    solver: Arc<S>,
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self::from_arc(Arc::new(solver))
    }

    pub fn from_arc(solver: Arc<S>) -> Self {
        Self {
            inner: Default::default(),
            solver,
        }
    }

    pub fn solver(&self) -> &Arc<S> {
        &self.solver
    }

    pub fn enqueue(&self, req: GenerateRequest) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            map.write().insert(id_for_task.clone(), JobStatus::Running);
            match solver.generate(req).await {
                Ok(result) => {
                    info!(
                        job = %id_for_task,
                        scheduled = result.summary.scheduled_courses,
                        "job done"
                    );
                    map.write().insert(id_for_task, JobStatus::Done { result });
                }
                Err(e) => {
                    error!(job = %id_for_task, ?e, "job failed");
                    map.write().insert(
                        id_for_task,
                        JobStatus::Failed {
                            message: e.to_string(),
                        },
                    );
                }
            }
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}
