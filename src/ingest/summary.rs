use serde::Serialize;

/// Aggregated counts for one orchestration run. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub sources_attempted: usize,
    /// Normalized entries produced by the parser across all sources
    pub fetched: usize,
    /// Rows actually written
    pub inserted: usize,
    /// Names of sources whose fetch, parse, or persist failed
    pub failed_sources: Vec<String>,
}

impl RunSummary {
    /// Entries already stored (by URL) and therefore not inserted
    pub fn skipped(&self) -> usize {
        self.fetched.saturating_sub(self.inserted)
    }

    pub(crate) fn record_success(&mut self, fetched: usize, inserted: usize) {
        self.sources_attempted += 1;
        self.fetched += fetched;
        self.inserted += inserted;
    }

    pub(crate) fn record_failure(&mut self, source_name: &str) {
        self.sources_attempted += 1;
        self.failed_sources.push(source_name.to_string());
    }

    pub(crate) fn log(&self, scope: &str) {
        tracing::info!(
            scope = scope,
            sources = self.sources_attempted,
            fetched = self.fetched,
            inserted = self.inserted,
            skipped = self.skipped(),
            failed = ?self.failed_sources,
            "Scrape run complete"
        );
    }
}
