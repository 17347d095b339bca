//! Scrape and metrics command handlers for the CLI.

use xtrack_core::compute_metrics;
use xtrack_pipeline::ScrapeOptions;
use xtrack_search::TwitterApiClient;

use crate::campaigns::resolve_campaign;

/// Run the scrape pipeline for one campaign and print the outcome.
///
/// # Errors
///
/// Returns an error if the campaign cannot be resolved, `TWITTERAPI_KEY` is
/// missing, or the pipeline fails. A pipeline failure has already marked the
/// run `failed` by the time it is returned here.
pub(crate) async fn run_scrape(
    pool: &sqlx::PgPool,
    config: &xtrack_core::AppConfig,
    key: &str,
    days: Option<i32>,
) -> anyhow::Result<()> {
    let campaign = resolve_campaign(pool, key).await?;
    let client = TwitterApiClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;

    let options = ScrapeOptions::from_app_config(config).with_days(days);
    tracing::info!(campaign_id = %campaign.id, slug = %campaign.slug, ?days, "starting scrape");
    let outcome = xtrack_pipeline::run_scrape(pool, &client, campaign.id, &options).await?;

    println!(
        "scraped campaign {}: {} posts stored (run {})",
        campaign.slug, outcome.posts_found, outcome.run_id
    );
    Ok(())
}

/// Print totals, engagement rate, and the top post over a campaign's most
/// recent `limit` posts.
///
/// # Errors
///
/// Returns an error if the campaign cannot be resolved or the query fails.
pub(crate) async fn run_metrics(pool: &sqlx::PgPool, key: &str, limit: i64) -> anyhow::Result<()> {
    let campaign = resolve_campaign(pool, key).await?;
    let posts = xtrack_db::list_posts(pool, Some(campaign.id), limit.max(1)).await?;
    let metrics = compute_metrics(&posts);

    println!("Campaign: {} ({})", campaign.name, campaign.slug);
    println!("Posts:           {}", metrics.total_posts);
    println!("Likes:           {}", metrics.total_likes);
    println!("Retweets:        {}", metrics.total_retweets);
    println!("Replies:         {}", metrics.total_replies);
    println!("Views:           {}", metrics.total_views);
    println!("Engagement rate: {:.2}%", metrics.engagement_rate);

    match metrics.top_post {
        Some(top) => {
            let author = top.author_handle.as_deref().unwrap_or("-");
            let url = top.url.as_deref().unwrap_or("-");
            println!(
                "Top post:        {} by @{author} ({} likes, {} retweets, {} replies) {url}",
                top.id, top.likes, top.retweets, top.replies
            );
        }
        None => println!("Top post:        -"),
    }

    if let Some(run) = xtrack_db::latest_scrape_run(pool, campaign.id).await? {
        let finished = run
            .completed_at
            .map_or_else(|| "-".to_owned(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());
        println!(
            "Last run:        {} ({} posts, finished {finished})",
            run.status, run.posts_found
        );
    }

    Ok(())
}
