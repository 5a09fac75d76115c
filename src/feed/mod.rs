//! Feed retrieval and normalization.
//!
//! - [`fetcher`] - single-attempt, time-bounded HTTP retrieval of feed payloads
//! - [`parser`] - RSS/Atom parsing via `feed-rs` into normalized article records
//! - [`catalog`] - built-in list of known news feeds for provisioning
//!
//! # Example
//!
//! ```ignore
//! use kirikou::feed::{parse_feed, FeedFetcher};
//!
//! let fetcher = FeedFetcher::new(Duration::from_secs(10), "KirikouBot/1.0")?;
//! let bytes = fetcher.fetch("https://feeds.npr.org/1001/rss.xml").await?;
//! let parsed = parse_feed(&bytes, None)?;
//! ```

mod catalog;
mod fetcher;
mod parser;

pub use catalog::known_sources;
pub use fetcher::{FeedFetcher, FetchError};
pub use parser::{parse_feed, ParseError, ParseResult, UNTITLED};
