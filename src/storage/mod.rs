mod articles;
mod schema;
mod sources;
mod stats;
mod types;

pub use schema::Database;
pub use types::{
    Article, DatabaseError, InactiveSource, NewSource, ParsedArticle, PoliticalLeaning,
    RecentArticle, Source, SourceStats,
};
