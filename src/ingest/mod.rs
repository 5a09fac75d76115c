//! Per-source scrape orchestration with failure isolation.

mod orchestrator;
mod summary;

pub use orchestrator::{Orchestrator, OrchestratorError, SourceError, SourceOutcome};
pub use summary::RunSummary;
