//! News feed ingestion core.
//!
//! Fetches RSS/Atom feeds for configured news sources, normalizes entries
//! into articles, and stores them deduplicated by URL in SQLite. Scrapes are
//! triggered through a [`jobs::JobDispatcher`] backed by a pluggable queue.

pub mod config;
pub mod feed;
pub mod ingest;
pub mod jobs;
pub mod storage;
pub mod util;
