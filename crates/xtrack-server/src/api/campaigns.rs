//! Campaign handlers.
//!
//! - `GET    /api/v1/campaigns`: campaigns with keywords, newest first
//! - `POST   /api/v1/campaigns`: validate and create a campaign
//! - `GET    /api/v1/campaigns/{campaign}`: detail with latest run and metrics
//! - `DELETE /api/v1/campaigns/{campaign}`: delete with posts, runs, and keywords
//! - `GET    /api/v1/campaigns/{campaign}/runs`: scrape run history
//!
//! `{campaign}` accepts either the campaign's slug or its UUID.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xtrack_core::{compute_metrics, CampaignInput, CampaignMetrics};
use xtrack_db::{CampaignRow, KeywordRow, ScrapeRunRow};

use crate::middleware::RequestId;

use super::posts::PostItem;
use super::{
    map_db_error, map_json_rejection, map_query_rejection, normalize_limit, ApiError,
    ApiResponse, AppState,
};

/// Number of most recent posts the detail view aggregates over.
const DETAIL_METRICS_WINDOW: i64 = 200;

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CampaignItem {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    active: bool,
    scrape_days: i32,
    min_engagement: i64,
    max_engagement: Option<i64>,
    keywords: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeRunItem {
    id: Uuid,
    campaign_id: Uuid,
    status: String,
    posts_found: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct CampaignDetail {
    #[serde(flatten)]
    campaign: CampaignItem,
    latest_run: Option<ScrapeRunItem>,
    metrics: CampaignMetrics<PostItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedResponse {
    deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

impl CampaignItem {
    fn from_row(row: CampaignRow, keywords: Vec<String>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            active: row.active,
            scrape_days: row.scrape_days,
            min_engagement: row.min_engagement,
            max_engagement: row.max_engagement,
            keywords,
            created_at: row.created_at,
        }
    }
}

impl From<ScrapeRunRow> for ScrapeRunItem {
    fn from(row: ScrapeRunRow) -> Self {
        Self {
            id: row.id,
            campaign_id: row.campaign_id,
            status: row.status,
            posts_found: row.posts_found,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

fn keyword_strings(rows: Vec<KeywordRow>) -> Vec<String> {
    rows.into_iter().map(|k| k.keyword).collect()
}

/// Resolve a slug or UUID path segment to a campaign, returning 404 if neither matches.
async fn resolve_campaign(
    pool: &sqlx::PgPool,
    key: &str,
    request_id: &str,
) -> Result<CampaignRow, ApiError> {
    let by_id = match Uuid::parse_str(key) {
        Ok(id) => xtrack_db::get_campaign(pool, id)
            .await
            .map_err(|e| map_db_error(request_id.to_owned(), &e))?,
        Err(_) => None,
    };

    let found = match by_id {
        Some(row) => Some(row),
        None => xtrack_db::get_campaign_by_slug(pool, key)
            .await
            .map_err(|e| map_db_error(request_id.to_owned(), &e))?,
    };

    found.ok_or_else(|| {
        ApiError::new(
            request_id,
            "not_found",
            format!("campaign '{key}' not found"),
        )
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn list_campaigns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CampaignItem>>>, ApiError> {
    let rid = &req_id.0;
    let rows = xtrack_db::list_campaigns(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut keywords: HashMap<Uuid, Vec<String>> = HashMap::new();
    for kw in xtrack_db::list_keywords_for_campaigns(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
    {
        keywords.entry(kw.campaign_id).or_default().push(kw.keyword);
    }

    let data = rows
        .into_iter()
        .map(|row| {
            let kws = keywords.remove(&row.id).unwrap_or_default();
            CampaignItem::from_row(row, kws)
        })
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/campaigns: validate input, assign a slug, and store the campaign.
pub(super) async fn create_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<CampaignInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CampaignItem>>), ApiError> {
    let rid = &req_id.0;
    let Json(input) = body.map_err(|e| map_json_rejection(rid.clone(), &e))?;

    let campaign = input
        .validate()
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;
    let slug = xtrack_core::generate_slug(&campaign.name);

    let (row, keyword_rows) = xtrack_db::create_campaign(&state.pool, &slug, &campaign)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(rid, "conflict", "a campaign with that slug already exists")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    tracing::info!(campaign_id = %row.id, slug = %row.slug, "campaign created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CampaignItem::from_row(row, keyword_strings(keyword_rows)),
            req_id.0,
        )),
    ))
}

pub(super) async fn get_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<CampaignDetail>>, ApiError> {
    let rid = &req_id.0;
    let row = resolve_campaign(&state.pool, &key, rid).await?;

    let keywords = xtrack_db::list_keywords(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let latest_run = xtrack_db::latest_scrape_run(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let posts: Vec<PostItem> =
        xtrack_db::list_posts(&state.pool, Some(row.id), DETAIL_METRICS_WINDOW)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?
            .into_iter()
            .map(PostItem::from)
            .collect();

    let detail = CampaignDetail {
        campaign: CampaignItem::from_row(row, keyword_strings(keywords)),
        latest_run: latest_run.map(ScrapeRunItem::from),
        metrics: compute_metrics(&posts),
    };

    Ok(Json(ApiResponse::new(detail, req_id.0)))
}

/// DELETE /api/v1/campaigns/{campaign}: remove the campaign and everything attached to it.
pub(super) async fn delete_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let rid = &req_id.0;
    let row = resolve_campaign(&state.pool, &key, rid).await?;

    let deleted = xtrack_db::delete_campaign(&state.pool, row.id)
        .await
        .map_err(|e| match e {
            xtrack_db::DbError::NotFound => ApiError::new(
                rid,
                "not_found",
                format!("campaign '{key}' not found"),
            ),
            other => map_db_error(rid.clone(), &other),
        })?;

    tracing::info!(
        campaign_id = %row.id,
        posts = deleted.posts,
        scrape_runs = deleted.scrape_runs,
        keywords = deleted.keywords,
        "campaign deleted"
    );

    Ok(Json(ApiResponse::new(
        DeletedResponse { deleted: true },
        req_id.0,
    )))
}

pub(super) async fn list_campaign_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(key): Path<String>,
    query: Result<Query<RunsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ScrapeRunItem>>>, ApiError> {
    let rid = &req_id.0;
    let Query(query) = query.map_err(|e| map_query_rejection(rid.clone(), &e))?;
    let row = resolve_campaign(&state.pool, &key, rid).await?;

    let runs = xtrack_db::list_scrape_runs(&state.pool, row.id, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        runs.into_iter().map(ScrapeRunItem::from).collect(),
        req_id.0,
    )))
}
