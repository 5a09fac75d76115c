//! Integration tests for source provisioning and the queries built on it:
//! create, seed from the catalog, list, and per-source statistics.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use kirikou::feed::known_sources;
use kirikou::storage::{Database, DatabaseError, NewSource, ParsedArticle, PoliticalLeaning};

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn article(slug: &str, age_days: i64) -> ParsedArticle {
    ParsedArticle {
        title: format!("Story {}", slug),
        url: format!("https://example.com/{}", slug),
        description: None,
        author: None,
        published_at: Utc::now() - Duration::days(age_days),
    }
}

#[tokio::test]
async fn test_seed_then_list_in_catalog_order() {
    let db = test_db().await;
    let catalog = known_sources();

    let added = db.seed_sources(&catalog).await.unwrap();
    assert_eq!(added, catalog.len());

    let names: Vec<String> = db
        .get_sources()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    let expected: Vec<String> = catalog.into_iter().map(|s| s.name).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_seed_keeps_manually_added_source() {
    let db = test_db().await;
    let catalog = known_sources();
    let first = catalog[0].clone();

    db.create_source(&NewSource {
        url: "https://mirror.example.com/rss".to_string(),
        ..first
    })
    .await
    .unwrap();

    let added = db.seed_sources(&catalog).await.unwrap();
    assert_eq!(added, catalog.len() - 1);

    let sources = db.get_sources().await.unwrap();
    assert_eq!(sources[0].url, "https://mirror.example.com/rss");
}

#[tokio::test]
async fn test_invalid_source_rejected_before_insert() {
    let db = test_db().await;

    let err = db
        .create_source(&NewSource {
            name: "Bad".to_string(),
            url: "ftp://example.com/feed".to_string(),
            country: None,
            political_leaning: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DatabaseError::InvalidSource(_)));
    assert!(db.get_sources().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_and_recent_articles_reflect_inserts() {
    let db = test_db().await;
    let id = db
        .create_source(&NewSource {
            name: "Daily".to_string(),
            url: "https://daily.example.com/rss".to_string(),
            country: Some("UK".to_string()),
            political_leaning: Some(PoliticalLeaning::Center),
        })
        .await
        .unwrap();

    db.insert_articles(id, &[article("fresh", 1), article("old", 30)])
        .await
        .unwrap();

    let stats = db.get_source_stats().await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].source_name, "Daily");
    assert_eq!(stats[0].total_articles, 2);
    assert_eq!(stats[0].articles_last_7d, 1);

    let recent = db.get_recent_articles(1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "Story fresh");
    assert_eq!(recent[0].country.as_deref(), Some("UK"));
    assert_eq!(recent[0].political_leaning.as_deref(), Some("center"));
}

#[tokio::test]
async fn test_seeded_sources_start_inactive_until_scraped() {
    let db = test_db().await;
    let catalog = known_sources();
    db.seed_sources(&catalog).await.unwrap();

    let inactive = db.get_inactive_sources(24).await.unwrap();
    assert_eq!(inactive.len(), catalog.len());
    assert!(inactive.iter().all(|s| s.last_article_at.is_none()));

    let first = &db.get_sources().await.unwrap()[0];
    db.insert_articles(first.id, &[article("today", 0)])
        .await
        .unwrap();

    let inactive = db.get_inactive_sources(24).await.unwrap();
    assert_eq!(inactive.len(), catalog.len() - 1);
    assert!(inactive.iter().all(|s| s.source_name != first.name));

    let articles = db.get_articles_by_source(&first.name, 1).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Story today");
}
