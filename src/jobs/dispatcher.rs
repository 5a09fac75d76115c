use thiserror::Error;

use super::queue::{JobId, JobQueue, ScrapeJob};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// No source with this id; nothing was submitted
    #[error("Source {0} not found")]
    NotFound(i64),
    /// The existence check itself failed; nothing was submitted
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Entry point for triggering scrapes.
///
/// Submits orchestrator work to a [`JobQueue`] and returns the job id at
/// once. Does not poll, retry, or collect results.
pub struct JobDispatcher<Q> {
    db: Database,
    queue: Q,
}

impl<Q: JobQueue> JobDispatcher<Q> {
    pub fn new(db: Database, queue: Q) -> Self {
        Self { db, queue }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Enqueue a scrape of every configured source
    pub fn submit_scrape_all(&self) -> JobId {
        self.queue.submit(ScrapeJob::All)
    }

    /// Enqueue a scrape of one source.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] if the id is unknown. The check happens
    /// before submission, so no job exists for an unknown source.
    pub async fn submit_scrape_source(&self, source_id: i64) -> Result<JobId, DispatchError> {
        if self.db.get_source_by_id(source_id).await?.is_none() {
            tracing::warn!(source_id, "Refusing scrape job for unknown source");
            return Err(DispatchError::NotFound(source_id));
        }
        Ok(self.queue.submit(ScrapeJob::Source(source_id)))
    }
}
