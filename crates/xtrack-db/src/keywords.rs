//! Database operations for the `keywords` table.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::DbError;

/// A row from the `keywords` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub keyword: String,
    pub created_at: DateTime<Utc>,
}

/// Inserts keywords for a campaign inside the caller's transaction.
///
/// `clock_timestamp()` gives each row a distinct `created_at`, so reads
/// ordered by it return keywords in insertion order.
pub(crate) async fn insert_keywords(
    tx: &mut Transaction<'_, Postgres>,
    campaign_id: Uuid,
    keywords: &[String],
) -> Result<Vec<KeywordRow>, DbError> {
    let mut rows = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let row = sqlx::query_as::<_, KeywordRow>(
            "INSERT INTO keywords (id, campaign_id, keyword, created_at) \
             VALUES ($1, $2, $3, clock_timestamp()) \
             RETURNING id, campaign_id, keyword, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(campaign_id)
        .bind(keyword)
        .fetch_one(&mut **tx)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

/// Returns a campaign's keywords in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keywords(pool: &PgPool, campaign_id: Uuid) -> Result<Vec<KeywordRow>, DbError> {
    let rows = sqlx::query_as::<_, KeywordRow>(
        "SELECT id, campaign_id, keyword, created_at \
         FROM keywords \
         WHERE campaign_id = $1 \
         ORDER BY created_at, id",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the keywords of several campaigns at once, grouped by campaign and
/// in insertion order within each group.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keywords_for_campaigns(
    pool: &PgPool,
    campaign_ids: &[Uuid],
) -> Result<Vec<KeywordRow>, DbError> {
    if campaign_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, KeywordRow>(
        "SELECT id, campaign_id, keyword, created_at \
         FROM keywords \
         WHERE campaign_id = ANY($1) \
         ORDER BY campaign_id, created_at, id",
    )
    .bind(campaign_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
