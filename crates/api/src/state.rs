use async_trait::async_trait;
use jobs::{InMemJobs, InMemStore};
use sched_core::{EngineError, Solver};
use solver_heur::GreedySolver;
use solver_remote::RemoteSolver;
use std::sync::Arc;
use types::{GenerateRequest, GenerationResult, SolverKind};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<DispatchSolver>>,
    pub store: InMemStore,
    pub config: Arc<AppConfig>,
}

/// Routes each request to the solver it names.
pub struct DispatchSolver {
    greedy: GreedySolver,
    remote: Option<RemoteSolver>,
}

impl DispatchSolver {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let remote = match &config.remote {
            Some(r) => Some(RemoteSolver::new(&r.url, r.timeout, config.policy.clone())?),
            None => None,
        };
        Ok(Self {
            greedy: GreedySolver::new(config.policy.clone()),
            remote,
        })
    }
}

#[async_trait]
impl Solver for DispatchSolver {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerationResult> {
        match req.solver {
            SolverKind::Greedy => self.greedy.generate(req).await,
            SolverKind::Remote => match &self.remote {
                Some(remote) => remote.generate(req).await,
                None => Err(EngineError::InvalidRequest(
                    "remote solver requested but UNISCHEDULE__REMOTE__URL is not set".into(),
                )
                .into()),
            },
        }
    }
}

impl AppState {
    pub fn new(config: AppConfig, store: InMemStore) -> anyhow::Result<Self> {
        let jobs = InMemJobs::new(DispatchSolver::from_config(&config)?);
        Ok(Self {
            jobs: Arc::new(jobs),
            store,
            config: Arc::new(config),
        })
    }

    pub fn solver(&self) -> &Arc<DispatchSolver> {
        self.jobs.solver()
    }
}
