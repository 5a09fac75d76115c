use chrono::Utc;
use feed_rs::model::{Entry, Link};
use feed_rs::parser;
use thiserror::Error;
use url::Url;

use crate::storage::ParsedArticle;
use crate::util::resolve_link;

/// Title stored for entries that carry none
pub const UNTITLED: &str = "Untitled";

/// The payload is not a feed at all
#[derive(Debug, Error)]
#[error("Feed could not be parsed as RSS or Atom: {0}")]
pub struct ParseError(#[from] feed_rs::parser::ParseFeedError);

/// Normalized entries of one feed plus bookkeeping on what was filtered.
///
/// `articles.len() == entries - dropped` always holds.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub articles: Vec<ParsedArticle>,
    /// Raw entry count in the feed
    pub entries: usize,
    /// Entries dropped for lacking a resolvable link
    pub dropped: usize,
    /// Entries whose publication date was replaced by the parse-time clock
    pub dated_now: usize,
}

/// Parse a raw RSS/Atom payload into normalized articles.
///
/// `base_url` is the feed's own URL, used to resolve relative entry links.
/// Dates go through feed-rs's lenient RFC 3339 / RFC 2822 / RFC 1123 parser.
/// Each entry is normalized on its own; a bad entry is dropped or patched,
/// never fatal to the feed. Only a payload that is not RSS/Atom at all fails.
pub fn parse_feed(bytes: &[u8], base_url: Option<&Url>) -> Result<ParseResult, ParseError> {
    let feed = parser::parse(bytes)?;

    let mut result = ParseResult {
        entries: feed.entries.len(),
        ..Default::default()
    };

    if feed.entries.is_empty() {
        tracing::warn!(feed = ?base_url.map(Url::as_str), "Feed has zero entries");
        return Ok(result);
    }

    let now = Utc::now();

    for entry in feed.entries {
        let Some(url) = entry_link(&entry, base_url) else {
            tracing::debug!(entry_id = %entry.id, "Entry has no resolvable link, skipping");
            result.dropped += 1;
            continue;
        };

        let published_at = match entry.published.or(entry.updated) {
            Some(ts) => ts,
            None => {
                tracing::warn!(
                    url = %url,
                    "Entry date missing or unparsable, using current time"
                );
                result.dated_now += 1;
                now
            }
        };

        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .and_then(non_blank);

        let author = entry
            .authors
            .into_iter()
            .map(|p| p.name)
            .find_map(non_blank);

        result.articles.push(ParsedArticle {
            title,
            url: url.into(),
            description,
            author,
            published_at,
        });
    }

    tracing::debug!(
        entries = result.entries,
        kept = result.articles.len(),
        dropped = result.dropped,
        "Feed parsed"
    );
    Ok(result)
}

/// Pick the entry's canonical link.
///
/// Preference: an `alternate` (or rel-less) link, then any link, then an
/// entry id that is itself an absolute http(s) URL (RSS permalink guids).
fn entry_link(entry: &Entry, base: Option<&Url>) -> Option<Url> {
    let resolve = |l: &Link| resolve_link(&l.href, base);
    let is_alternate = |l: &&Link| l.rel.as_deref().map_or(true, |rel| rel == "alternate");

    let links = &entry.links;
    links
        .iter()
        .filter(is_alternate)
        .find_map(resolve)
        .or_else(|| links.iter().find_map(resolve))
        .or_else(|| resolve_link(&entry.id, None))
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}
