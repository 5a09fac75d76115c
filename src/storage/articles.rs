use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{Article, ArticleDbRow, DatabaseError, ParsedArticle};

/// Rows per INSERT statement. 7 columns * 50 = 350 binds, well under SQLite's
/// 999 parameter limit.
const BATCH_SIZE: usize = 50;

/// Maximum number of articles to return from any single listing query
const MAX_ARTICLES: i64 = 2000;

impl Database {
    // ========================================================================
    // Article Persistence
    // ========================================================================

    /// Insert articles for a source, skipping any whose URL is already stored.
    ///
    /// Returns the number of rows actually inserted. Rows colliding on `url`
    /// (with existing rows, or with each other inside the batch) are dropped by
    /// `ON CONFLICT(url) DO NOTHING`; no exists-check runs beforehand, so the
    /// unique constraint alone decides under concurrent jobs.
    ///
    /// Every chunk runs inside one transaction. Any failure other than the URL
    /// conflict (unknown `source_id`, lost connection) rolls the whole batch
    /// back and is returned.
    pub async fn insert_articles(
        &self,
        source_id: i64,
        articles: &[ParsedArticle],
    ) -> Result<usize, DatabaseError> {
        if articles.is_empty() {
            return Ok(0);
        }

        let scraped_at = chrono::Utc::now().timestamp();
        // Dropped without commit on any early return below, which rolls back
        let mut tx = self.pool.begin().await?;
        let mut inserted: u64 = 0;

        for chunk in articles.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT INTO articles (source_id, title, description, author, published_at, scraped_at, url) ",
            );

            builder.push_values(chunk, |mut b, article| {
                b.push_bind(source_id)
                    .push_bind(&article.title)
                    .push_bind(&article.description)
                    .push_bind(&article.author)
                    .push_bind(article.published_at.timestamp())
                    .push_bind(scraped_at)
                    .push_bind(&article.url);
            });

            builder.push(" ON CONFLICT(url) DO NOTHING");

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(
            source_id = source_id,
            submitted = articles.len(),
            inserted = inserted,
            "Article batch persisted"
        );
        Ok(inserted as usize)
    }

    // ========================================================================
    // Article Queries
    // ========================================================================

    /// Articles for a source, newest first, capped at MAX_ARTICLES
    pub async fn get_articles_for_source(
        &self,
        source_id: i64,
    ) -> Result<Vec<Article>, DatabaseError> {
        let rows = sqlx::query_as::<_, ArticleDbRow>(
            r#"
            SELECT id, source_id, title, description, author,
                   published_at, scraped_at, url
            FROM articles
            WHERE source_id = ?
            ORDER BY published_at DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(source_id)
        .bind(MAX_ARTICLES)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ArticleDbRow::into_article).collect())
    }

    pub async fn count_articles(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, DatabaseError, NewSource, ParsedArticle};
    use chrono::{TimeZone, Utc};

    async fn test_db() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let source_id = db
            .create_source(&NewSource {
                name: "Test Source".into(),
                url: "https://source.example.com/rss".into(),
                country: None,
                political_leaning: None,
            })
            .await
            .unwrap();
        (db, source_id)
    }

    fn test_article(slug: &str) -> ParsedArticle {
        ParsedArticle {
            title: format!("Story {}", slug),
            url: format!("https://example.com/{}", slug),
            description: Some("Test summary".to_string()),
            author: None,
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_returns_zero() {
        let (db, source_id) = test_db().await;
        assert_eq!(db.insert_articles(source_id, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_database_even_for_unknown_source() {
        let (db, _) = test_db().await;
        // No statement runs, so the FK to a missing source is never checked
        assert_eq!(db.insert_articles(424242, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reinsert_is_idempotent() {
        let (db, source_id) = test_db().await;
        let batch = vec![test_article("a"), test_article("b"), test_article("c")];

        assert_eq!(db.insert_articles(source_id, &batch).await.unwrap(), 3);
        assert_eq!(db.insert_articles(source_id, &batch).await.unwrap(), 0);
        assert_eq!(db.count_articles().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_overlapping_batch_inserts_only_new() {
        let (db, source_id) = test_db().await;
        db.insert_articles(source_id, &[test_article("a"), test_article("b")])
            .await
            .unwrap();

        let inserted = db
            .insert_articles(source_id, &[test_article("b"), test_article("c")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(db.count_articles().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_url_within_batch_collapses() {
        let (db, source_id) = test_db().await;
        let mut second = test_article("same");
        second.title = "Different title, same link".into();

        let inserted = db
            .insert_articles(source_id, &[test_article("same"), second])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        let stored = db.get_articles_for_source(source_id).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_url_unique_across_sources() {
        let (db, first) = test_db().await;
        let second = db
            .create_source(&NewSource {
                name: "Other".into(),
                url: "https://other.example.com/rss".into(),
                country: None,
                political_leaning: None,
            })
            .await
            .unwrap();

        let batch = [test_article("x")];
        assert_eq!(db.insert_articles(first, &batch).await.unwrap(), 1);
        assert_eq!(db.insert_articles(second, &batch).await.unwrap(), 0);

        let stored = db.get_articles_for_source(first).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(db.get_articles_for_source(second).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_source_is_fatal_and_rolls_back() {
        let (db, _) = test_db().await;

        let result = db.insert_articles(9999, &[test_article("orphan")]).await;
        assert!(matches!(result, Err(DatabaseError::Other(_))));
        assert_eq!(db.count_articles().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_large_batch_spans_chunks() {
        let (db, source_id) = test_db().await;
        let batch: Vec<ParsedArticle> = (0..120).map(|i| test_article(&i.to_string())).collect();

        assert_eq!(db.insert_articles(source_id, &batch).await.unwrap(), 120);
    }

    #[tokio::test]
    async fn test_stored_fields_roundtrip() {
        let (db, source_id) = test_db().await;
        let mut article = test_article("full");
        article.author = Some("Jane Reporter".into());

        db.insert_articles(source_id, &[article.clone()])
            .await
            .unwrap();
        let stored = db.get_articles_for_source(source_id).await.unwrap();

        assert_eq!(stored[0].title, article.title);
        assert_eq!(stored[0].author.as_deref(), Some("Jane Reporter"));
        assert_eq!(stored[0].description, article.description);
        assert_eq!(stored[0].published_at, article.published_at);
        assert_eq!(stored[0].source_id, source_id);
    }
}
