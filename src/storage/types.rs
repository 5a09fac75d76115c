use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds the database lock past the busy timeout
    #[error("Database is locked by another process. Please try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Source provisioning input was rejected before reaching the database
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Political Leaning
// ============================================================================

/// Editorial leaning tag attached to a source.
///
/// Closed set; parsing is case-insensitive and the canonical form is the
/// lowercase hyphenated name stored in the `sources.political_leaning` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoliticalLeaning {
    Left,
    CenterLeft,
    Center,
    CenterRight,
    Right,
    TechFocus,
}

impl PoliticalLeaning {
    pub const ALL: [PoliticalLeaning; 6] = [
        PoliticalLeaning::Left,
        PoliticalLeaning::CenterLeft,
        PoliticalLeaning::Center,
        PoliticalLeaning::CenterRight,
        PoliticalLeaning::Right,
        PoliticalLeaning::TechFocus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoliticalLeaning::Left => "left",
            PoliticalLeaning::CenterLeft => "center-left",
            PoliticalLeaning::Center => "center",
            PoliticalLeaning::CenterRight => "center-right",
            PoliticalLeaning::Right => "right",
            PoliticalLeaning::TechFocus => "tech-focus",
        }
    }
}

impl fmt::Display for PoliticalLeaning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoliticalLeaning {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|leaning| leaning.as_str() == normalized)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|l| l.as_str()).collect();
                DatabaseError::InvalidSource(format!(
                    "political leaning '{}' must be one of: {}",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}

// ============================================================================
// Helper Types
// ============================================================================

/// Input for provisioning a new source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    pub country: Option<String>,
    pub political_leaning: Option<PoliticalLeaning>,
}

/// Represents a normalized entry ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArticle {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Internal row type for Source queries (used by sqlx FromRow)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SourceDbRow {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub country: Option<String>,
    pub political_leaning: Option<String>,
}

impl SourceDbRow {
    pub(crate) fn into_source(self) -> Source {
        // Rows written outside create_source may carry an unknown tag; keep the source usable
        let political_leaning = match self.political_leaning.as_deref().map(str::parse) {
            Some(Ok(leaning)) => Some(leaning),
            Some(Err(_)) => {
                tracing::warn!(
                    source_id = self.id,
                    leaning = ?self.political_leaning,
                    "Unrecognized political leaning in database, ignoring"
                );
                None
            }
            None => None,
        };

        Source {
            id: self.id,
            name: self.name,
            url: self.url,
            country: self.country,
            political_leaning,
        }
    }
}

/// Internal row type for Article queries
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArticleDbRow {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: i64,
    pub scraped_at: i64,
    pub url: String,
}

impl ArticleDbRow {
    pub(crate) fn into_article(self) -> Article {
        Article {
            id: self.id,
            source_id: self.source_id,
            title: self.title,
            description: self.description,
            author: self.author,
            published_at: from_unix(self.published_at),
            scraped_at: from_unix(self.scraped_at),
            url: self.url,
        }
    }
}

pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

// ============================================================================
// Data Structures
// ============================================================================

/// A feed provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub country: Option<String>,
    pub political_leaning: Option<PoliticalLeaning>,
}

/// A persisted article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub url: String,
}

/// Article count statistics for one source
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SourceStats {
    pub source_name: String,
    pub total_articles: i64,
    pub articles_last_7d: i64,
}

/// A source with no article published inside the checked window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InactiveSource {
    pub source_name: String,
    pub url: String,
    /// `None` when the source has never produced an article
    pub last_article_at: Option<DateTime<Utc>>,
}

/// Recent article joined with its source's metadata
#[derive(Debug, Clone, Serialize)]
pub struct RecentArticle {
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub country: Option<String>,
    pub political_leaning: Option<String>,
}
