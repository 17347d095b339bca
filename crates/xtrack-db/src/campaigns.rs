//! Database operations for the `campaigns` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use xtrack_core::NewCampaign;

use crate::keywords::{insert_keywords, KeywordRow};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub active: bool,
    pub scrape_days: i32,
    pub min_engagement: i64,
    pub max_engagement: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Row counts removed by [`delete_campaign`], one per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedCampaign {
    pub posts: u64,
    pub scrape_runs: u64,
    pub keywords: u64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a campaign and its keywords in a single transaction.
///
/// The slug is stored as given; collisions surface as a unique violation
/// (see [`DbError::is_unique_violation`]).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails. Nothing is written in that case.
pub async fn create_campaign(
    pool: &PgPool,
    slug: &str,
    campaign: &NewCampaign,
) -> Result<(CampaignRow, Vec<KeywordRow>), DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, CampaignRow>(
        "INSERT INTO campaigns \
             (id, name, slug, description, scrape_days, min_engagement, max_engagement) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, name, slug, description, active, scrape_days, \
                   min_engagement, max_engagement, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&campaign.name)
    .bind(slug)
    .bind(campaign.description.as_deref())
    .bind(campaign.scrape_days)
    .bind(campaign.min_engagement)
    .bind(campaign.max_engagement)
    .fetch_one(&mut *tx)
    .await?;

    let keywords = insert_keywords(&mut tx, row.id, &campaign.keywords).await?;

    tx.commit().await?;
    Ok((row, keywords))
}

/// Returns a campaign by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_campaign(pool: &PgPool, id: Uuid) -> Result<Option<CampaignRow>, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(
        "SELECT id, name, slug, description, active, scrape_days, \
                min_engagement, max_engagement, created_at \
         FROM campaigns \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a campaign by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_campaign_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<CampaignRow>, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(
        "SELECT id, name, slug, description, active, scrape_days, \
                min_engagement, max_engagement, created_at \
         FROM campaigns \
         WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all campaigns, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaigns(pool: &PgPool) -> Result<Vec<CampaignRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(
        "SELECT id, name, slug, description, active, scrape_days, \
                min_engagement, max_engagement, created_at \
         FROM campaigns \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes a campaign together with its posts, scrape runs, and keywords.
///
/// Children are removed explicitly in dependency order (posts, runs,
/// keywords, campaign) inside one transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no campaign has the given id (nothing is
/// deleted), or [`DbError::Sqlx`] if any statement fails.
pub async fn delete_campaign(pool: &PgPool, id: Uuid) -> Result<DeletedCampaign, DbError> {
    let mut tx = pool.begin().await?;

    let posts = sqlx::query("DELETE FROM posts WHERE campaign_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let scrape_runs = sqlx::query("DELETE FROM scrape_runs WHERE campaign_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let keywords = sqlx::query("DELETE FROM keywords WHERE campaign_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let campaigns = sqlx::query("DELETE FROM campaigns WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if campaigns == 0 {
        tx.rollback().await?;
        return Err(DbError::NotFound);
    }

    tx.commit().await?;
    Ok(DeletedCampaign {
        posts,
        scrape_runs,
        keywords,
    })
}
