use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_json_rejection, map_pipeline_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScrapeRequest {
    pub campaign_id: Option<String>,
    pub days: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScrapeResponse {
    posts_found: i32,
    run_id: Uuid,
}

/// POST /api/v1/scrape: run the scrape pipeline for one campaign and wait for it.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ScrapeResponse>>, ApiError> {
    let rid = &req_id.0;
    let Json(body) = body.map_err(|e| map_json_rejection(rid.clone(), &e))?;

    let raw_id = body
        .campaign_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::new(rid, "bad_request", "campaignId is required"))?;
    let campaign_id = Uuid::parse_str(raw_id).map_err(|_| {
        ApiError::new(
            rid,
            "bad_request",
            format!("campaignId must be a UUID, got '{raw_id}'"),
        )
    })?;

    let Some(provider) = state.search.as_deref() else {
        tracing::error!(%campaign_id, "scrape requested without a search provider configured");
        return Err(ApiError::new(
            rid,
            "internal_error",
            xtrack_search::SearchError::MissingApiKey.to_string(),
        ));
    };

    let options = state.scrape_options.with_days(body.days);
    let outcome = xtrack_pipeline::run_scrape(&state.pool, provider, campaign_id, &options)
        .await
        .map_err(|e| map_pipeline_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        ScrapeResponse {
            posts_found: outcome.posts_found,
            run_id: outcome.run_id,
        },
        req_id.0,
    )))
}
