use super::schema::Database;
use super::types::{from_unix, DatabaseError, InactiveSource, RecentArticle, SourceStats};

const HOUR_SECS: i64 = 60 * 60;
const DAY_SECS: i64 = 24 * HOUR_SECS;
/// Trailing window used by `articles_last_7d`
const WEEK_SECS: i64 = 7 * DAY_SECS;

#[derive(sqlx::FromRow)]
struct RecentRow {
    title: String,
    url: String,
    published_at: i64,
    source_name: String,
    country: Option<String>,
    political_leaning: Option<String>,
}

impl RecentRow {
    fn into_recent(self) -> RecentArticle {
        RecentArticle {
            title: self.title,
            url: self.url,
            published_at: from_unix(self.published_at),
            source_name: self.source_name,
            country: self.country,
            political_leaning: self.political_leaning,
        }
    }
}

impl Database {
    /// Article totals per source, busiest first
    pub async fn get_source_stats(&self) -> Result<Vec<SourceStats>, DatabaseError> {
        let since = chrono::Utc::now().timestamp() - WEEK_SECS;
        let stats = sqlx::query_as::<_, SourceStats>(
            r#"
            SELECT
                s.name AS source_name,
                COUNT(a.id) AS total_articles,
                COUNT(CASE WHEN a.published_at > ? THEN 1 END) AS articles_last_7d
            FROM sources s
            LEFT JOIN articles a ON s.id = a.source_id
            GROUP BY s.id, s.name
            ORDER BY total_articles DESC, s.name
        "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Most recently published articles with their source's metadata
    pub async fn get_recent_articles(
        &self,
        limit: i64,
    ) -> Result<Vec<RecentArticle>, DatabaseError> {
        let rows = sqlx::query_as::<_, RecentRow>(
            r#"
            SELECT a.title, a.url, a.published_at, s.name AS source_name, s.country,
                   s.political_leaning
            FROM articles a
            JOIN sources s ON a.source_id = s.id
            ORDER BY a.published_at DESC
            LIMIT ?
        "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RecentRow::into_recent).collect())
    }

    /// Articles from the named source published in the last `days` days,
    /// newest first. An unknown name yields an empty list.
    pub async fn get_articles_by_source(
        &self,
        source_name: &str,
        days: u32,
    ) -> Result<Vec<RecentArticle>, DatabaseError> {
        let since = chrono::Utc::now().timestamp() - i64::from(days) * DAY_SECS;
        let rows = sqlx::query_as::<_, RecentRow>(
            r#"
            SELECT a.title, a.url, a.published_at, s.name AS source_name, s.country,
                   s.political_leaning
            FROM articles a
            JOIN sources s ON a.source_id = s.id
            WHERE s.name = ? AND a.published_at >= ?
            ORDER BY a.published_at DESC
        "#,
        )
        .bind(source_name)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RecentRow::into_recent).collect())
    }

    /// Sources with no article published in the last `hours` hours.
    ///
    /// Sources that never produced an article come first, then the rest by
    /// their latest article, oldest first. Used to spot dead feeds.
    pub async fn get_inactive_sources(
        &self,
        hours: u32,
    ) -> Result<Vec<InactiveSource>, DatabaseError> {
        let cutoff = chrono::Utc::now().timestamp() - i64::from(hours) * HOUR_SECS;
        let rows: Vec<(String, String, Option<i64>)> = sqlx::query_as(
            r#"
            SELECT s.name, s.url, MAX(a.published_at) AS last_article
            FROM sources s
            LEFT JOIN articles a ON s.id = a.source_id
            GROUP BY s.id, s.name, s.url
            HAVING last_article IS NULL OR last_article < ?
            ORDER BY last_article IS NOT NULL, last_article ASC, s.name
        "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(source_name, url, last)| InactiveSource {
                source_name,
                url,
                last_article_at: last.map(from_unix),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, NewSource, ParsedArticle};
    use chrono::{Duration, Utc};

    async fn seeded() -> (Database, i64, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let busy = db
            .create_source(&NewSource {
                name: "Busy".into(),
                url: "https://busy.example.com/rss".into(),
                country: Some("US".into()),
                political_leaning: None,
            })
            .await
            .unwrap();
        let quiet = db
            .create_source(&NewSource {
                name: "Quiet".into(),
                url: "https://quiet.example.com/rss".into(),
                country: None,
                political_leaning: None,
            })
            .await
            .unwrap();
        (db, busy, quiet)
    }

    fn article(slug: &str, age_days: i64) -> ParsedArticle {
        ParsedArticle {
            title: slug.to_string(),
            url: format!("https://busy.example.com/{}", slug),
            description: None,
            author: None,
            published_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn test_source_stats_counts_recent_window() {
        let (db, busy, _) = seeded().await;
        db.insert_articles(busy, &[article("new", 1), article("old", 30)])
            .await
            .unwrap();

        let stats = db.get_source_stats().await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].source_name, "Busy");
        assert_eq!(stats[0].total_articles, 2);
        assert_eq!(stats[0].articles_last_7d, 1);
        assert_eq!(stats[1].source_name, "Quiet");
        assert_eq!(stats[1].total_articles, 0);
    }

    #[tokio::test]
    async fn test_recent_articles_newest_first() {
        let (db, busy, _) = seeded().await;
        db.insert_articles(busy, &[article("older", 3), article("newer", 1)])
            .await
            .unwrap();

        let recent = db.get_recent_articles(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "newer");
        assert_eq!(recent[0].source_name, "Busy");
        assert_eq!(recent[0].country.as_deref(), Some("US"));
    }

    #[tokio::test]
    async fn test_articles_by_source_respects_window() {
        let (db, busy, _) = seeded().await;
        db.insert_articles(
            busy,
            &[article("today", 0), article("last-week", 5), article("ancient", 40)],
        )
        .await
        .unwrap();

        let week = db.get_articles_by_source("Busy", 7).await.unwrap();
        let titles: Vec<&str> = week.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["today", "last-week"]);

        for (name, expected) in [("Busy", 3), ("Quiet", 0), ("Nobody", 0)] {
            let articles = db.get_articles_by_source(name, 60).await.unwrap();
            assert_eq!(articles.len(), expected, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_inactive_sources_never_scraped_first() {
        let (db, busy, _) = seeded().await;
        let stale = db
            .create_source(&NewSource {
                name: "Stale".into(),
                url: "https://stale.example.com/rss".into(),
                country: None,
                political_leaning: None,
            })
            .await
            .unwrap();

        db.insert_articles(busy, &[article("fresh", 0)])
            .await
            .unwrap();
        db.insert_articles(
            stale,
            &[ParsedArticle {
                url: "https://stale.example.com/old".into(),
                ..article("old", 3)
            }],
        )
        .await
        .unwrap();

        let inactive = db.get_inactive_sources(24).await.unwrap();
        let names: Vec<&str> = inactive.iter().map(|s| s.source_name.as_str()).collect();
        assert_eq!(names, vec!["Quiet", "Stale"]);
        assert_eq!(inactive[0].last_article_at, None);
        assert!(inactive[1].last_article_at.is_some());

        // A wide enough window only leaves the source with no articles at all
        let inactive = db.get_inactive_sources(24 * 30).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].source_name, "Quiet");
    }
}
