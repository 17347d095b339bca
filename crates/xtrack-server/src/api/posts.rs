use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xtrack_core::EngagementCounts;
use xtrack_db::PostRow;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_query_rejection, normalize_limit, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct PostsQuery {
    pub campaign_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct PostItem {
    id: String,
    campaign_id: Uuid,
    scrape_run_id: Option<Uuid>,
    matched_keyword: Option<String>,
    text: Option<String>,
    author_handle: Option<String>,
    author_name: Option<String>,
    author_followers: Option<i64>,
    posted_at: Option<DateTime<Utc>>,
    likes: i64,
    retweets: i64,
    replies: i64,
    views: i64,
    url: Option<String>,
    scraped_at: DateTime<Utc>,
}

impl From<PostRow> for PostItem {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            campaign_id: row.campaign_id,
            scrape_run_id: row.scrape_run_id,
            matched_keyword: row.matched_keyword,
            text: row.text,
            author_handle: row.author_handle,
            author_name: row.author_name,
            author_followers: row.author_followers,
            posted_at: row.posted_at,
            likes: row.likes,
            retweets: row.retweets,
            replies: row.replies,
            views: row.views,
            url: row.url,
            scraped_at: row.scraped_at,
        }
    }
}

impl EngagementCounts for PostItem {
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

/// GET /api/v1/posts: newest posts first, optionally scoped to one campaign.
pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<PostsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<PostItem>>>, ApiError> {
    let Query(query) = query.map_err(|e| map_query_rejection(req_id.0.clone(), &e))?;

    let rows = xtrack_db::list_posts(
        &state.pool,
        query.campaign_id,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        rows.into_iter().map(PostItem::from).collect(),
        req_id.0,
    )))
}
