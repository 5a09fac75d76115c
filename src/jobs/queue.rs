use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::ingest::{Orchestrator, OrchestratorError};

/// Opaque handle for submitted work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A unit of scrape work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeJob {
    All,
    Source(i64),
}

impl fmt::Display for ScrapeJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeJob::All => f.write_str("scrape_all_sources"),
            ScrapeJob::Source(id) => write!(f, "scrape_source_by_id({})", id),
        }
    }
}

/// Fire-and-forget execution facility.
///
/// `submit` must return without waiting for the job to run. Outcomes are
/// only observable through the orchestrator's logs.
pub trait JobQueue: Send + Sync {
    fn submit(&self, job: ScrapeJob) -> JobId;
}

impl<Q: JobQueue + ?Sized> JobQueue for Arc<Q> {
    fn submit(&self, job: ScrapeJob) -> JobId {
        (**self).submit(job)
    }
}

/// In-process queue running each job as a tokio task.
///
/// At most `workers` jobs execute at once; further jobs wait for a permit.
/// `submit` must be called from within a tokio runtime.
pub struct LocalQueue {
    orchestrator: Arc<Orchestrator>,
    permits: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
}

impl LocalQueue {
    pub fn new(orchestrator: Arc<Orchestrator>, workers: usize) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Wait for every job submitted so far to finish.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(&mut *self.lock_tasks());
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Scrape job task panicked or was cancelled");
            }
        }
    }

    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        // A panic while holding the lock cannot leave the JoinSet inconsistent
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobQueue for LocalQueue {
    fn submit(&self, job: ScrapeJob) -> JobId {
        let id = JobId::new();
        let orchestrator = Arc::clone(&self.orchestrator);
        let permits = Arc::clone(&self.permits);

        let mut tasks = self.lock_tasks();
        // Reap finished jobs so a long-running scheduler does not accumulate them
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            run_job(&orchestrator, id, job).await;
        });

        tracing::info!(job_id = %id, job = %job, "Job submitted");
        id
    }
}

async fn run_job(orchestrator: &Orchestrator, id: JobId, job: ScrapeJob) {
    tracing::info!(job_id = %id, job = %job, "Job started");

    let result = match job {
        ScrapeJob::All => orchestrator
            .run_all()
            .await
            .map_err(OrchestratorError::from),
        ScrapeJob::Source(source_id) => orchestrator.run_one(source_id).await,
    };

    match result {
        Ok(summary) => tracing::info!(
            job_id = %id,
            inserted = summary.inserted,
            failed = summary.failed_sources.len(),
            "Job finished"
        ),
        Err(e) => tracing::error!(job_id = %id, error = %e, "Job failed"),
    }
}
