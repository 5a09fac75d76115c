use futures::stream::{self, StreamExt};
use thiserror::Error;
use url::Url;

use super::summary::RunSummary;
use crate::feed::{parse_feed, FeedFetcher, FetchError, ParseError};
use crate::storage::{Database, DatabaseError, Source};

/// Why one source's Fetch → Parse → Persist pipeline stopped.
///
/// Scoped to that source; the orchestrator records it and moves on.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("persist failed: {0}")]
    Persist(#[from] DatabaseError),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Source {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Counts for one successfully processed source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOutcome {
    pub fetched: usize,
    pub inserted: usize,
}

/// Drives Fetch → Parse → Persist over configured sources.
pub struct Orchestrator {
    db: Database,
    fetcher: FeedFetcher,
    concurrency: usize,
}

impl Orchestrator {
    /// Sequential orchestrator (one source at a time)
    pub fn new(db: Database, fetcher: FeedFetcher) -> Self {
        Self {
            db,
            fetcher,
            concurrency: 1,
        }
    }

    /// Process up to `n` sources at once. Results are still aggregated in
    /// listing order. Values below 1 are treated as 1.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Scrape every configured source in listing order.
    ///
    /// A failing source is logged and named in `failed_sources`; the run
    /// always continues. Only failing to list the sources aborts.
    pub async fn run_all(&self) -> Result<RunSummary, DatabaseError> {
        let sources = self.db.get_sources().await?;
        tracing::info!(
            sources = sources.len(),
            concurrency = self.concurrency,
            "Starting scrape of all sources"
        );

        let outcomes: Vec<(Source, Result<SourceOutcome, SourceError>)> = stream::iter(sources)
            .map(|source| async move {
                let result = self.scrape_source(&source).await;
                (source, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut summary = RunSummary::default();
        for (source, result) in outcomes {
            match result {
                Ok(outcome) => summary.record_success(outcome.fetched, outcome.inserted),
                Err(_) => summary.record_failure(&source.name),
            }
        }

        summary.log("all");
        Ok(summary)
    }

    /// Scrape a single source by id.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::NotFound`] if no source has this id. A source whose
    /// pipeline fails is not an error here: it yields a summary with
    /// `inserted == 0` and the source listed in `failed_sources`.
    pub async fn run_one(&self, source_id: i64) -> Result<RunSummary, OrchestratorError> {
        let source = self
            .db
            .get_source_by_id(source_id)
            .await?
            .ok_or(OrchestratorError::NotFound(source_id))?;

        let mut summary = RunSummary::default();
        match self.scrape_source(&source).await {
            Ok(outcome) => summary.record_success(outcome.fetched, outcome.inserted),
            Err(_) => summary.record_failure(&source.name),
        }

        summary.log(&source.name);
        Ok(summary)
    }

    /// Run the pipeline for one source, logging any failure under its name.
    pub async fn scrape_source(&self, source: &Source) -> Result<SourceOutcome, SourceError> {
        let result = self.pipeline(source).await;
        match &result {
            Ok(outcome) => tracing::info!(
                source_id = source.id,
                source = %source.name,
                fetched = outcome.fetched,
                inserted = outcome.inserted,
                "Source scraped"
            ),
            Err(e) => tracing::error!(
                source_id = source.id,
                source = %source.name,
                error = %e,
                "Source scrape failed"
            ),
        }
        result
    }

    async fn pipeline(&self, source: &Source) -> Result<SourceOutcome, SourceError> {
        let bytes = self.fetcher.fetch(&source.url).await?;

        let base = Url::parse(&source.url).ok();
        let parsed = parse_feed(&bytes, base.as_ref())?;
        if parsed.dropped > 0 {
            tracing::warn!(
                source = %source.name,
                dropped = parsed.dropped,
                "Entries without a resolvable link skipped"
            );
        }

        // insert_articles short-circuits on an empty batch
        let inserted = self.db.insert_articles(source.id, &parsed.articles).await?;

        Ok(SourceOutcome {
            fetched: parsed.articles.len(),
            inserted,
        })
    }
}
