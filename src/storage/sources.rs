use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{DatabaseError, NewSource, Source, SourceDbRow};
use crate::util::validate_feed_url;

const MAX_NAME_LEN: usize = 150;
const MAX_COUNTRY_LEN: usize = 50;

impl Database {
    // ========================================================================
    // Source Provisioning
    // ========================================================================

    /// Insert a new source, returning its id.
    ///
    /// The name must be unique; a duplicate name surfaces as the underlying
    /// constraint error.
    pub async fn create_source(&self, source: &NewSource) -> Result<i64, DatabaseError> {
        validate_new_source(source)?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sources (name, url, country, political_leaning)
            VALUES (?, ?, ?, ?)
            RETURNING id
        "#,
        )
        .bind(source.name.trim())
        .bind(source.url.trim())
        .bind(source.country.as_deref())
        .bind(source.political_leaning.map(|l| l.as_str()))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(source_id = id, name = %source.name, "Source created");
        Ok(id)
    }

    /// Insert every source whose name is not already present.
    ///
    /// Returns the number of sources actually created. Existing rows are left
    /// untouched.
    pub async fn seed_sources(&self, sources: &[NewSource]) -> Result<usize, DatabaseError> {
        if sources.is_empty() {
            return Ok(0);
        }
        for source in sources {
            validate_new_source(source)?;
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("INSERT INTO sources (name, url, country, political_leaning) ");
        builder.push_values(sources, |mut b, source| {
            b.push_bind(source.name.trim())
                .push_bind(source.url.trim())
                .push_bind(source.country.as_deref())
                .push_bind(source.political_leaning.map(|l| l.as_str()));
        });
        builder.push(" ON CONFLICT(name) DO NOTHING");

        let mut tx = self.pool.begin().await?;
        let result = builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected() as usize)
    }

    // ========================================================================
    // Source Queries
    // ========================================================================

    /// All configured sources in listing order (by id)
    pub async fn get_sources(&self) -> Result<Vec<Source>, DatabaseError> {
        let rows = sqlx::query_as::<_, SourceDbRow>(
            r#"
            SELECT id, name, url, country, political_leaning
            FROM sources
            ORDER BY id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SourceDbRow::into_source).collect())
    }

    pub async fn get_source_by_id(&self, source_id: i64) -> Result<Option<Source>, DatabaseError> {
        let row = sqlx::query_as::<_, SourceDbRow>(
            r#"
            SELECT id, name, url, country, political_leaning
            FROM sources
            WHERE id = ?
        "#,
        )
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SourceDbRow::into_source))
    }
}

fn validate_new_source(source: &NewSource) -> Result<(), DatabaseError> {
    let name = source.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(DatabaseError::InvalidSource(format!(
            "name must be 1-{} characters",
            MAX_NAME_LEN
        )));
    }

    validate_feed_url(source.url.trim())
        .map_err(|e| DatabaseError::InvalidSource(format!("{}: {}", name, e)))?;

    if let Some(country) = &source.country {
        if country.chars().count() > MAX_COUNTRY_LEN {
            return Err(DatabaseError::InvalidSource(format!(
                "country must be at most {} characters",
                MAX_COUNTRY_LEN
            )));
        }
    }

    Ok(())
}
