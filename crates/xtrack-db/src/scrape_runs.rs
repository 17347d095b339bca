//! Database operations for `scrape_runs`.
//!
//! A run is created `running` and moves exactly once to `completed` or
//! `failed`. Both terminal transitions are guarded on the current status, so
//! a second attempt reports [`DbError::InvalidScrapeRunTransition`] instead of
//! overwriting the first outcome.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scrape_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub status: String,
    /// The schema defines this as `INTEGER NOT NULL DEFAULT 0`.
    pub posts_found: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Creates a run for `campaign_id` in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scrape_run(pool: &PgPool, campaign_id: Uuid) -> Result<ScrapeRunRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(
        "INSERT INTO scrape_runs (id, campaign_id, status, started_at) \
         VALUES ($1, $2, 'running', NOW()) \
         RETURNING id, campaign_id, status, posts_found, started_at, completed_at",
    )
    .bind(Uuid::new_v4())
    .bind(campaign_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a running run `completed` with its `posts_found` and `completed_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the run is missing or
/// not `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scrape_run(pool: &PgPool, id: Uuid, posts_found: i32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'completed', completed_at = NOW(), posts_found = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(posts_found)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run `failed` with `completed_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the run is missing or
/// not `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scrape_run(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'failed', completed_at = NOW() \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_run(pool: &PgPool, id: Uuid) -> Result<ScrapeRunRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(
        "SELECT id, campaign_id, status, posts_found, started_at, completed_at \
         FROM scrape_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns a campaign's most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_runs(
    pool: &PgPool,
    campaign_id: Uuid,
    limit: i64,
) -> Result<Vec<ScrapeRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRunRow>(
        "SELECT id, campaign_id, status, posts_found, started_at, completed_at \
         FROM scrape_runs \
         WHERE campaign_id = $1 \
         ORDER BY started_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(campaign_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a campaign's most recently started run, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_scrape_run(
    pool: &PgPool,
    campaign_id: Uuid,
) -> Result<Option<ScrapeRunRow>, DbError> {
    Ok(list_scrape_runs(pool, campaign_id, 1).await?.into_iter().next())
}
