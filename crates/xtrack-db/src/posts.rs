//! Database operations for the `posts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use xtrack_core::{EngagementCounts, NormalizedPost};

use crate::DbError;

/// A row from the `posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: String,
    pub campaign_id: Uuid,
    /// Run that last wrote this post.
    pub scrape_run_id: Option<Uuid>,
    pub matched_keyword: Option<String>,
    pub text: Option<String>,
    pub author_handle: Option<String>,
    pub author_name: Option<String>,
    pub author_followers: Option<i64>,
    pub posted_at: Option<DateTime<Utc>>,
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
    pub views: i64,
    pub url: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl EngagementCounts for PostRow {
    fn likes(&self) -> i64 {
        self.likes
    }

    fn retweets(&self) -> i64 {
        self.retweets
    }

    fn replies(&self) -> i64 {
        self.replies
    }

    fn views(&self) -> i64 {
        self.views
    }
}

/// Inserts or fully overwrites each post keyed by its external id, all in one
/// transaction. Every written row is attributed to `campaign_id` and
/// `scrape_run_id`, and its `scraped_at` is refreshed. Rows are written in
/// id order so concurrent batches sharing ids lock them in the same order.
///
/// Returns the number of posts written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; no post from the batch
/// is written in that case.
pub async fn upsert_posts(
    pool: &PgPool,
    campaign_id: Uuid,
    scrape_run_id: Uuid,
    posts: &[NormalizedPost],
) -> Result<u64, DbError> {
    let mut ordered: Vec<&NormalizedPost> = posts.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut tx = pool.begin().await?;
    let mut written = 0_u64;

    for post in ordered {
        let result = sqlx::query(
            "INSERT INTO posts ( \
                 id, campaign_id, scrape_run_id, matched_keyword, text, \
                 author_handle, author_name, author_followers, posted_at, \
                 likes, retweets, replies, views, url, scraped_at \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW()) \
             ON CONFLICT (id) DO UPDATE SET \
                 campaign_id = EXCLUDED.campaign_id, \
                 scrape_run_id = EXCLUDED.scrape_run_id, \
                 matched_keyword = EXCLUDED.matched_keyword, \
                 text = EXCLUDED.text, \
                 author_handle = EXCLUDED.author_handle, \
                 author_name = EXCLUDED.author_name, \
                 author_followers = EXCLUDED.author_followers, \
                 posted_at = EXCLUDED.posted_at, \
                 likes = EXCLUDED.likes, \
                 retweets = EXCLUDED.retweets, \
                 replies = EXCLUDED.replies, \
                 views = EXCLUDED.views, \
                 url = EXCLUDED.url, \
                 scraped_at = NOW()",
        )
        .bind(&post.id)
        .bind(campaign_id)
        .bind(scrape_run_id)
        .bind(post.matched_keyword.as_deref())
        .bind(post.text.as_deref())
        .bind(post.author_handle.as_deref())
        .bind(post.author_name.as_deref())
        .bind(post.author_followers)
        .bind(post.posted_at)
        .bind(post.likes)
        .bind(post.retweets)
        .bind(post.replies)
        .bind(post.views)
        .bind(post.url.as_deref())
        .execute(&mut *tx)
        .await?;

        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Returns up to `limit` posts, most recently posted first (undated posts last).
/// `campaign_id = None` lists posts across all campaigns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts(
    pool: &PgPool,
    campaign_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, campaign_id, scrape_run_id, matched_keyword, text, \
                author_handle, author_name, author_followers, posted_at, \
                likes, retweets, replies, views, url, scraped_at \
         FROM posts \
         WHERE ($1::uuid IS NULL OR campaign_id = $1) \
         ORDER BY posted_at DESC NULLS LAST, id \
         LIMIT $2",
    )
    .bind(campaign_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
