//! The scrape pipeline for one campaign.

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use xtrack_core::{dedupe_by_id, AppConfig, EngagementFilter, NormalizedPost, MAX_SCRAPE_DAYS};
use xtrack_db::{CampaignRow, KeywordRow};
use xtrack_search::{build_query, fetch_all_pages, normalize_post, SearchProvider};

use crate::error::PipelineError;

const DEFAULT_MAX_ITEMS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Lookback override; the campaign's `scrape_days` applies when `None`.
    pub days: Option<i32>,
    /// Cap on raw provider items across all keywords.
    pub max_items: usize,
    /// Pause between consecutive provider requests.
    pub inter_request_delay_ms: u64,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            days: None,
            max_items: DEFAULT_MAX_ITEMS,
            inter_request_delay_ms: 0,
        }
    }
}

impl ScrapeOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            days: None,
            max_items: config.scrape_max_items,
            inter_request_delay_ms: config.search_inter_request_delay_ms,
        }
    }

    #[must_use]
    pub fn with_days(self, days: Option<i32>) -> Self {
        Self { days, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOutcome {
    pub run_id: Uuid,
    pub posts_found: i32,
}

/// Inclusive calendar-date window passed to the provider as `since:`/`until:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

/// `[today - days, today]`. `None` if `days` is outside `1..=365` or the
/// subtraction leaves chrono's date range.
#[must_use]
pub fn search_window(today: NaiveDate, days: i32) -> Option<SearchWindow> {
    if !(1..=MAX_SCRAPE_DAYS).contains(&days) {
        return None;
    }
    let since = today.checked_sub_days(Days::new(u64::from(days.unsigned_abs())))?;
    Some(SearchWindow {
        since,
        until: today,
    })
}

/// Run a full scrape for one campaign.
///
/// 1. Resolve the campaign and its keywords (no run is recorded if either is missing).
/// 2. Compute the date window from `options.days` or the campaign's `scrape_days`.
/// 3. Create a `running` scrape run.
/// 4. Page through the provider once per keyword until exhaustion or the item cap.
/// 5. Normalize, dropping items without an id.
/// 6. Keep posts inside the campaign's engagement bounds.
/// 7. Deduplicate by id (first occurrence wins) and upsert the batch.
/// 8. Mark the run `completed` with the number of posts written.
///
/// Any failure after step 3 marks the run `failed` before the error is returned.
///
/// # Errors
///
/// - [`PipelineError::InvalidDays`] if the `days` override is out of range.
/// - [`PipelineError::CampaignNotFound`] / [`PipelineError::NoKeywords`] before a run exists.
/// - [`PipelineError::Search`] for fatal provider errors (retries already exhausted).
/// - [`PipelineError::Db`] for store failures.
pub async fn run_scrape<P>(
    pool: &PgPool,
    provider: &P,
    campaign_id: Uuid,
    options: &ScrapeOptions,
) -> Result<ScrapeOutcome, PipelineError>
where
    P: SearchProvider + ?Sized,
{
    if let Some(days) = options.days {
        if !(1..=MAX_SCRAPE_DAYS).contains(&days) {
            return Err(PipelineError::InvalidDays(days));
        }
    }

    let campaign = xtrack_db::get_campaign(pool, campaign_id)
        .await?
        .ok_or(PipelineError::CampaignNotFound(campaign_id))?;
    let keywords = xtrack_db::list_keywords(pool, campaign_id).await?;
    if keywords.is_empty() {
        return Err(PipelineError::NoKeywords(campaign_id));
    }

    let days = options.days.unwrap_or(campaign.scrape_days);
    let window = search_window(Utc::now().date_naive(), days)
        .ok_or(PipelineError::InvalidDays(days))?;

    let run = xtrack_db::create_scrape_run(pool, campaign_id).await?;
    tracing::info!(
        %campaign_id,
        run_id = %run.id,
        keywords = keywords.len(),
        since = %window.since,
        until = %window.until,
        "scrape run started"
    );

    let posts_found =
        match scrape_into_run(pool, provider, &campaign, &keywords, window, options, run.id).await
        {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(%campaign_id, run_id = %run.id, error = %err, "scrape run failed");
                fail_run_best_effort(pool, run.id).await;
                return Err(err);
            }
        };

    if let Err(err) = xtrack_db::complete_scrape_run(pool, run.id, posts_found).await {
        tracing::error!(run_id = %run.id, error = %err, "failed to mark scrape run completed");
        fail_run_best_effort(pool, run.id).await;
        return Err(err.into());
    }

    tracing::info!(%campaign_id, run_id = %run.id, posts_found, "scrape run completed");
    Ok(ScrapeOutcome {
        run_id: run.id,
        posts_found,
    })
}

/// Steps 4 through 7. Returns the number of posts upserted.
async fn scrape_into_run<P>(
    pool: &PgPool,
    provider: &P,
    campaign: &CampaignRow,
    keywords: &[KeywordRow],
    window: SearchWindow,
    options: &ScrapeOptions,
    run_id: Uuid,
) -> Result<i32, PipelineError>
where
    P: SearchProvider + ?Sized,
{
    let collected = collect_posts(provider, keywords, window, options).await?;
    let collected_count = collected.len();

    let filter = EngagementFilter::new(campaign.min_engagement, campaign.max_engagement);
    let posts = dedupe_by_id(filter.apply(collected));
    tracing::info!(
        run_id = %run_id,
        collected = collected_count,
        kept = posts.len(),
        "filtered scraped posts"
    );

    let written = xtrack_db::upsert_posts(pool, campaign.id, run_id, &posts).await?;
    Ok(i32::try_from(written).unwrap_or(i32::MAX))
}

/// Query the provider for each keyword in order, stopping once
/// `options.max_items` raw items have been collected.
async fn collect_posts<P>(
    provider: &P,
    keywords: &[KeywordRow],
    window: SearchWindow,
    options: &ScrapeOptions,
) -> Result<Vec<NormalizedPost>, PipelineError>
where
    P: SearchProvider + ?Sized,
{
    let mut posts = Vec::new();
    let mut raw_total = 0usize;

    for (index, keyword) in keywords.iter().enumerate() {
        let remaining = options.max_items.saturating_sub(raw_total);
        if remaining == 0 {
            tracing::info!(
                max_items = options.max_items,
                "item cap reached, skipping remaining keywords"
            );
            break;
        }

        if index > 0 && options.inter_request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(options.inter_request_delay_ms)).await;
        }

        let query = build_query(&keyword.keyword, window.since, window.until);
        let raw = fetch_all_pages(provider, &query, remaining, options.inter_request_delay_ms)
            .await?;
        raw_total += raw.len();

        let fetched = raw.len();
        let before = posts.len();
        posts.extend(
            raw.into_iter()
                .filter_map(|item| normalize_post(item, &keyword.keyword)),
        );
        let dropped = fetched - (posts.len() - before);
        if dropped > 0 {
            tracing::debug!(keyword = %keyword.keyword, dropped, "dropped items without an id");
        }
        tracing::debug!(keyword = %keyword.keyword, fetched, "keyword search finished");
    }

    Ok(posts)
}

async fn fail_run_best_effort(pool: &PgPool, run_id: Uuid) {
    if let Err(mark_err) = xtrack_db::fail_scrape_run(pool, run_id).await {
        tracing::error!(
            %run_id,
            error = %mark_err,
            "failed to mark scrape run as failed"
        );
    }
}
